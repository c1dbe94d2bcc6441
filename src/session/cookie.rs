/// Refresh cookie transport
///
/// The refresh token only ever travels in a Secure, HttpOnly, SameSite
/// cookie. These helpers touch the outgoing response and nothing else.

use actix_web::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use crate::configuration::{CookieSettings, SameSitePolicy};
use crate::error::AppError;

#[derive(Clone)]
pub struct CookieTransport {
    settings: CookieSettings,
    max_age_seconds: i64,
}

impl CookieTransport {
    pub fn new(settings: CookieSettings, refresh_ttl_seconds: i64) -> Self {
        Self {
            settings,
            max_age_seconds: refresh_ttl_seconds,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.settings.name
    }

    /// Refresh token presented by the client, if any
    pub fn read(&self, req: &HttpRequest) -> Option<String> {
        req.cookie(&self.settings.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn build(&self, value: String) -> Cookie<'static> {
        let same_site = match self.settings.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        };

        Cookie::build(self.settings.name.clone(), value)
            .path(self.settings.path.clone())
            .secure(self.settings.secure)
            .http_only(true)
            .same_site(same_site)
            .finish()
    }

    pub fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        let mut cookie = self.build(token.to_string());
        cookie.set_max_age(CookieDuration::seconds(self.max_age_seconds));
        cookie
    }

    pub fn cleared_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.build(String::new());
        cookie.set_max_age(CookieDuration::ZERO);
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        cookie
    }

    pub fn set_refresh_cookie(&self, response: &mut HttpResponse, token: &str) {
        if let Err(e) = response.add_cookie(&self.refresh_cookie(token)) {
            tracing::error!(error = %e, "Failed to attach refresh cookie");
        }
    }

    pub fn clear_refresh_cookie(&self, response: &mut HttpResponse) {
        if let Err(e) = response.add_cookie(&self.cleared_cookie()) {
            tracing::error!(error = %e, "Failed to clear refresh cookie");
        }
    }

    /// Error response for a cookie-authenticated call. Credential failures
    /// also log the client out.
    pub fn reject(&self, err: AppError) -> HttpResponse {
        let mut response = err.error_response();
        if err.is_credential_error() {
            self.clear_refresh_cookie(&mut response);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::store::StoreError;
    use actix_web::http::{header, StatusCode};

    fn transport() -> CookieTransport {
        CookieTransport::new(CookieSettings::default(), 604800)
    }

    fn set_cookie_headers(response: &HttpResponse) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let header = transport().refresh_cookie("abc").to_string();

        assert!(header.starts_with("session=abc"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=604800"));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let header = transport().cleared_cookie().to_string();

        assert!(header.starts_with("session=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("1970"));
    }

    #[test]
    fn test_reject_clears_cookie_for_credential_errors() {
        let transport = transport();

        let response = transport.reject(AppError::Auth(AuthError::SessionInvalid));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookies = set_cookie_headers(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains("Max-Age=0"));

        let response = transport.reject(AppError::Store(StoreError::Backend("down".into())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookie_headers(&response).is_empty());
    }
}
