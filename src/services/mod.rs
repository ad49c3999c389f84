//! Services backing the users API

mod user;

pub use user::{InMemoryUserStore, SeedError, UserStore};
