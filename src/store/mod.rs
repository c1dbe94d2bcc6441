/// Principal storage
///
/// Each role has its own backing collection behind the `PrincipalStore`
/// trait. Refresh-token uniqueness is enforced here, by the conditional
/// update in `rotate_refresh_token`, not by locks in the session layer.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt;

use crate::principal::Principal;

pub mod memory;
pub mod postgres;
pub mod registry;

pub use memory::InMemoryPrincipalStore;
pub use postgres::PgPrincipalStore;
pub use registry::RoleRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    NotFound(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Principal not found: {}", id),
            StoreError::Backend(msg) => write!(f, "Principal store error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lookup by stored session. Both fields must match in the same read.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalFilter {
    pub id: Option<String>,
    pub refresh_token_hash: String,
}

impl PrincipalFilter {
    pub fn by_session(id: &str, refresh_token_hash: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            refresh_token_hash: refresh_token_hash.to_string(),
        }
    }
}

/// The only mutations the session layer performs on a principal
#[derive(Debug, Clone, PartialEq)]
pub enum PrincipalPatch {
    SetRefreshToken(String),
    ClearRefreshToken,
}

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Principal>>;

    async fn find_one(&self, filter: &PrincipalFilter) -> StoreResult<Option<Principal>>;

    /// Fails with `NotFound` when no principal has `id`
    async fn update_by_id(&self, id: &str, patch: PrincipalPatch) -> StoreResult<()>;

    /// Replace the stored fingerprint only if it still equals `expected`.
    /// Returns `false` when another writer got there first.
    async fn rotate_refresh_token(
        &self,
        id: &str,
        expected: &str,
        replacement: &str,
    ) -> StoreResult<bool>;

    /// Clear the stored fingerprint only if it still equals `expected`
    async fn clear_refresh_token_if(&self, id: &str, expected: &str) -> StoreResult<bool>;

    async fn insert(&self, principal: Principal) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
