/// Session Routes
///
/// Cookie-authenticated calls: token refresh, session read and logout.
/// Every credential failure on these routes also clears the refresh cookie.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::principal::SessionProfile;
use crate::session::{CookieTransport, SessionService};

#[derive(Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub data: SessionProfile,
    pub from_cache: bool,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/refresh
///
/// Rotate the refresh token from the `session` cookie and return a new
/// access token. The new refresh token replaces the cookie.
///
/// # Errors
/// - 401: Missing, expired, invalid, replayed or already rotated token
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
    transport: web::Data<CookieTransport>,
) -> HttpResponse {
    let presented = transport.read(&req);

    match sessions.refresh(presented.as_deref()).await {
        Ok(pair) => {
            let mut response = HttpResponse::Ok().json(RefreshResponse {
                success: true,
                token: pair.access_token,
            });
            transport.set_refresh_cookie(&mut response, &pair.refresh_token);
            response
        }
        Err(e) => transport.reject(e),
    }
}

/// GET /api/v1/auth/session
///
/// Sanitized profile of the principal owning the `session` cookie, served
/// through the session cache. The cookie must still be the current session.
///
/// # Errors
/// - 401: Missing, expired, invalid, rotated or logged-out token
/// - 500: Internal server error
pub async fn session(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
    transport: web::Data<CookieTransport>,
) -> HttpResponse {
    let presented = transport.read(&req);

    match sessions.read_session(presented.as_deref()).await {
        Ok(view) => HttpResponse::Ok().json(SessionResponse {
            success: true,
            data: view.profile,
            from_cache: view.from_cache,
        }),
        Err(e) => transport.reject(e),
    }
}

/// POST /api/v1/logout
///
/// Always succeeds and always clears the cookie. The stored session is only
/// cleared when the cookie still names it.
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
    transport: web::Data<CookieTransport>,
) -> HttpResponse {
    let presented = transport.read(&req);

    if let Err(e) = sessions.end_session(presented.as_deref()).await {
        tracing::error!(error = %e, "Failed to clear stored session during logout");
    }

    let mut response = HttpResponse::Ok().json(LogoutResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    });
    transport.clear_refresh_cookie(&mut response);
    response
}
