//! Application state shared across handlers and middleware

use std::sync::Arc;

use crate::services::UserStore;

/// Shared application state
///
/// Read-only after startup; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<dyn UserStore>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(user_store: Arc<dyn UserStore>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            user_store,
            jwt_secret: jwt_secret.into(),
        }
    }
}
