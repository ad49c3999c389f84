//! API handlers for the users API

pub mod user;

pub use user::{create_user, delete_user, get_user, get_users, update_user};
