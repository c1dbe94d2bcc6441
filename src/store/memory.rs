//! In-memory principal store.
//!
//! Backs one role's collection with a `HashMap` behind a `tokio::sync::RwLock`.
//! Used for local development and tests. Not durable, single process only.
//! Conditional updates run entirely under the write lock, which is what makes
//! concurrent rotations of the same token commit at most once.

use super::{PrincipalFilter, PrincipalPatch, PrincipalStore, StoreError, StoreResult};
use crate::principal::{Principal, Role};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct InMemoryPrincipalStore {
    role: Role,
    principals: RwLock<HashMap<String, Principal>>,
}

impl InMemoryPrincipalStore {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            principals: RwLock::new(HashMap::new()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

fn matches(principal: &Principal, filter: &PrincipalFilter) -> bool {
    let account = principal.account();
    let id_matches = filter.id.as_deref().map_or(true, |id| account.id == id);
    id_matches && account.refresh_token_hash.as_deref() == Some(filter.refresh_token_hash.as_str())
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Principal>> {
        let guard = self.principals.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn find_one(&self, filter: &PrincipalFilter) -> StoreResult<Option<Principal>> {
        let guard = self.principals.read().await;
        if let Some(id) = filter.id.as_deref() {
            return Ok(guard.get(id).filter(|p| matches(p, filter)).cloned());
        }
        Ok(guard.values().find(|p| matches(p, filter)).cloned())
    }

    async fn update_by_id(&self, id: &str, patch: PrincipalPatch) -> StoreResult<()> {
        let mut guard = self.principals.write().await;
        let principal = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let account = principal.account_mut();
        account.refresh_token_hash = match patch {
            PrincipalPatch::SetRefreshToken(hash) => Some(hash),
            PrincipalPatch::ClearRefreshToken => None,
        };
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: &str,
        expected: &str,
        replacement: &str,
    ) -> StoreResult<bool> {
        let mut guard = self.principals.write().await;
        match guard.get_mut(id) {
            Some(principal)
                if principal.account().refresh_token_hash.as_deref() == Some(expected) =>
            {
                principal.account_mut().refresh_token_hash = Some(replacement.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_refresh_token_if(&self, id: &str, expected: &str) -> StoreResult<bool> {
        let mut guard = self.principals.write().await;
        match guard.get_mut(id) {
            Some(principal)
                if principal.account().refresh_token_hash.as_deref() == Some(expected) =>
            {
                principal.account_mut().refresh_token_hash = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert(&self, principal: Principal) -> StoreResult<()> {
        if principal.role() != self.role {
            return Err(StoreError::Backend(format!(
                "{} cannot be stored in the {} collection",
                principal.role(),
                self.role
            )));
        }
        let mut guard = self.principals.write().await;
        guard.insert(principal.id().to_string(), principal);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
