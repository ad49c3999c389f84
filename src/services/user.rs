//! User lookup

use std::path::Path;

use axum::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::User;

/// Errors loading a user seed file
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read access to users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every user, oldest first
    async fn list(&self) -> ApiResult<Vec<User>>;

    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>>;
}

/// Immutable in-memory snapshot of users
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Vec<User>,
}

impl InMemoryUserStore {
    pub fn new(mut users: Vec<User>) -> Self {
        users.sort_by_key(|user| user.created_at);
        Self { users }
    }

    /// Load users from a JSON array
    pub fn from_seed_file(path: &Path) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path)?;
        let users: Vec<User> = serde_json::from_str(&contents)?;
        tracing::info!(path = %path.display(), count = users.len(), "Loaded user seed file");
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self) -> ApiResult<Vec<User>> {
        Ok(self.users.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        Ok(self.users.iter().find(|user| user.id == id).cloned())
    }
}
