/// Session management
///
/// Issues, rotates, reads and ends refresh-token sessions for any role.
/// The HTTP layer only moves cookies and JSON; every rule about which
/// credential is valid lives here.

use std::sync::Arc;

use crate::auth::{token_fingerprint, TokenCodec, TokenKind};
use crate::cache::ProfileCache;
use crate::error::{AppError, AuthError};
use crate::principal::{Principal, Role, SessionProfile};
use crate::store::{PrincipalFilter, PrincipalPatch, RoleRegistry, StoreError};

mod cookie;
mod refresh;

pub use cookie::CookieTransport;
pub use refresh::RefreshStage;

/// Freshly issued credentials
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a session read
#[derive(Debug, Clone)]
pub struct SessionView {
    pub profile: SessionProfile,
    pub from_cache: bool,
}

#[derive(Clone)]
pub struct SessionService {
    codec: Arc<TokenCodec>,
    registry: RoleRegistry,
    cache: ProfileCache,
}

impl SessionService {
    pub fn new(codec: Arc<TokenCodec>, registry: RoleRegistry, cache: ProfileCache) -> Self {
        Self {
            codec,
            registry,
            cache,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn shared_codec(&self) -> Arc<TokenCodec> {
        self.codec.clone()
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Begin a session for an already authenticated principal.
    ///
    /// Called by login flows. Overwrites whatever session the principal had.
    pub async fn start_session(&self, role: Role, id: &str) -> Result<TokenPair, AppError> {
        let store = self.registry.resolve(role);
        if store.find_by_id(id).await?.is_none() {
            return Err(StoreError::NotFound(id.to_string()).into());
        }

        let pair = self.issue_pair(id, role)?;
        store
            .update_by_id(id, PrincipalPatch::SetRefreshToken(token_fingerprint(&pair.refresh_token)))
            .await?;
        self.cache.invalidate(id, role).await;

        tracing::info!(user_id = %id, role = %role, "Session started");
        Ok(pair)
    }

    /// Logout. Only the session the cookie belongs to is cleared, so a stale
    /// cookie cannot end a newer session.
    pub async fn end_session(&self, presented: Option<&str>) -> Result<(), AppError> {
        let Some(token) = presented.filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        let claims = match self.codec.verify_refresh(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Logout with unverifiable session cookie");
                return Ok(());
            }
        };

        let cleared = self
            .registry
            .resolve(claims.role)
            .clear_refresh_token_if(&claims.sub, &token_fingerprint(token))
            .await?;
        self.cache.invalidate(&claims.sub, claims.role).await;

        tracing::info!(user_id = %claims.sub, role = %claims.role, cleared, "Session ended");
        Ok(())
    }

    /// Session-read: the refresh cookie must still be the principal's current
    /// session. The sanitized profile is then served through the cache.
    pub async fn read_session(&self, presented: Option<&str>) -> Result<SessionView, AppError> {
        let token = presented
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let claims = self
            .codec
            .verify_refresh(token)
            .map_err(|e| AppError::from_codec(e, TokenKind::Refresh))?;

        let principal = self
            .registry
            .resolve(claims.role)
            .find_one(&PrincipalFilter::by_session(&claims.sub, &token_fingerprint(token)))
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %claims.sub, role = %claims.role, "Session read with a stale refresh token");
                AuthError::SessionInvalid
            })?;

        if let Some(view) = self.cached_view(&claims.sub, claims.role).await {
            return Ok(view);
        }
        Ok(self.fresh_view(&principal).await)
    }

    /// Read-through lookup of a principal's sanitized profile
    pub async fn load_profile(&self, id: &str, role: Role) -> Result<SessionView, AppError> {
        if let Some(view) = self.cached_view(id, role).await {
            return Ok(view);
        }

        let principal = self
            .registry
            .resolve(role)
            .find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        Ok(self.fresh_view(&principal).await)
    }

    async fn cached_view(&self, id: &str, role: Role) -> Option<SessionView> {
        let profile = self.cache.get(id, role).await?;
        tracing::debug!(user_id = %id, role = %role, "Session profile served from cache");
        Some(SessionView {
            profile,
            from_cache: true,
        })
    }

    async fn fresh_view(&self, principal: &Principal) -> SessionView {
        let profile = principal.sanitize();
        self.cache.populate(principal.id(), principal.role(), &profile).await;
        SessionView {
            profile,
            from_cache: false,
        }
    }

    fn issue_pair(&self, id: &str, role: Role) -> Result<TokenPair, AppError> {
        let refresh_token = self
            .codec
            .issue(TokenKind::Refresh, id, role)
            .map_err(|e| AppError::from_codec(e, TokenKind::Refresh))?;
        let access_token = self
            .codec
            .issue(TokenKind::Access, id, role)
            .map_err(|e| AppError::from_codec(e, TokenKind::Access))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
