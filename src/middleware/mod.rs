//! Middleware for the users API
//!
//! `request_tracing` wraps the whole application; `authorize` is route
//! middleware for the user route table.

pub mod auth;
mod tracing;

pub use auth::{authorize, AuthenticatedUser};
pub use tracing::request_tracing;
