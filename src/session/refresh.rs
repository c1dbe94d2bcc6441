/// Refresh-token rotation
///
/// Start -> Decoded -> RoleResolved -> LookedUp -> Rotated -> Committed.
/// Any failure is terminal for the request; nothing is retried here.
///
/// The lookup matches id and token fingerprint in one read, and the commit is
/// a conditional update on the same pair. Two requests racing with the same
/// token therefore produce exactly one new session.

use std::fmt;

use super::{SessionService, TokenPair};
use crate::auth::{token_fingerprint, TokenKind};
use crate::error::{AppError, AuthError};
use crate::store::PrincipalFilter;

/// Where a refresh attempt stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    Start,
    Decoded,
    RoleResolved,
    LookedUp,
    Rotated,
    Committed,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStage::Start => "start",
            RefreshStage::Decoded => "decoded",
            RefreshStage::RoleResolved => "role_resolved",
            RefreshStage::LookedUp => "looked_up",
            RefreshStage::Rotated => "rotated",
            RefreshStage::Committed => "committed",
        };
        f.write_str(name)
    }
}

fn failed(stage: RefreshStage, err: impl Into<AppError>) -> AppError {
    let err = err.into();
    tracing::warn!(stage = %stage, error = %err, "Token refresh rejected");
    err
}

impl SessionService {
    /// Exchange a refresh token for a new access/refresh pair
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, AppError> {
        let token = presented
            .filter(|t| !t.is_empty())
            .ok_or_else(|| failed(RefreshStage::Start, AuthError::MissingToken))?;

        let claims = self
            .codec
            .verify_refresh(token)
            .map_err(|e| failed(RefreshStage::Decoded, AppError::from_codec(e, TokenKind::Refresh)))?;

        // Unknown roles never get this far: they fail claim decoding above.
        let role = claims.role;
        let store = self.registry.resolve(role);
        tracing::debug!(user_id = %claims.sub, role = %role, stage = %RefreshStage::RoleResolved, "Refresh token decoded");

        let presented_hash = token_fingerprint(token);
        let principal = store
            .find_one(&PrincipalFilter::by_session(&claims.sub, &presented_hash))
            .await
            .map_err(|e| failed(RefreshStage::LookedUp, e))?
            .ok_or_else(|| failed(RefreshStage::LookedUp, AuthError::SessionInvalid))?;

        let pair = self
            .issue_pair(principal.id(), role)
            .map_err(|e| failed(RefreshStage::Rotated, e))?;

        let committed = store
            .rotate_refresh_token(
                principal.id(),
                &presented_hash,
                &token_fingerprint(&pair.refresh_token),
            )
            .await
            .map_err(|e| failed(RefreshStage::Committed, e))?;
        if !committed {
            // Another request consumed this token between lookup and commit
            return Err(failed(RefreshStage::Committed, AuthError::SessionInvalid));
        }

        self.cache.invalidate(principal.id(), role).await;

        tracing::info!(
            user_id = %principal.id(),
            role = %role,
            stage = %RefreshStage::Committed,
            "Token refreshed successfully"
        );
        Ok(pair)
    }
}
