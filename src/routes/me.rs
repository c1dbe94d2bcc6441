use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::{AppError, AuthError};
use crate::middleware::Identity;
use crate::session::SessionService;

/// GET /api/v1/me
///
/// Sanitized profile of the caller. **Requires a valid access token**; the
/// identity is injected by the access guard.
///
/// # Errors
/// - 401: Token without a role claim (guard handles the other 401s)
/// - 404: Principal no longer exists
/// - 500: Store fault
pub async fn current_principal(
    identity: web::ReqData<Identity>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let role = identity.role.ok_or(AuthError::InvalidPayload)?;
    let view = sessions.load_profile(&identity.subject_id, role).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": view.profile,
        "fromCache": view.from_cache,
    })))
}
