use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod memory;

pub use memory::MemoryUserStore;

/// Account record as held by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of an account. The password hash never leaves the
/// storage boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Infrastructure failure. Surfaced as a 500, never as an auth verdict,
    /// and never counted by the brute-force guard.
    #[error("user store unavailable: {0}")]
    Unavailable(String),
    #[error("username already taken")]
    DuplicateUsername,
}

/// Storage collaborator consumed by the auth layer. Real adapters live with
/// the rest of the application's storage code; this crate only ships the
/// in-memory implementation used by the binary default and the tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;
}
