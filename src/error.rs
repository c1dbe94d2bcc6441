/// Error Handling Module
///
/// One application error type that every layer maps into:
/// 1. Domain-specific error types (auth, store, config)
/// 2. HTTP response mapping with a uniform `{ success: false, message }` body
/// 3. Structured error logging with a per-error request id

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::auth::{CodecError, TokenKind};
use crate::store::StoreError;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Credential failures. All of them end the request with 401.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// No refresh cookie presented
    MissingToken,
    /// No `Authorization: Bearer` header presented
    MissingBearer,
    TokenExpired(TokenKind),
    TokenInvalid(TokenKind),
    /// Token verified but carries no usable subject
    InvalidPayload,
    /// Token verified but is not the session currently stored for its principal
    SessionInvalid,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Authorization token required"),
            AuthError::MissingBearer => write!(f, "Invalid authorization header"),
            AuthError::TokenExpired(TokenKind::Access) => write!(f, "Token has expired"),
            AuthError::TokenExpired(TokenKind::Refresh) => {
                write!(f, "Session expired - Please login again")
            }
            AuthError::TokenInvalid(TokenKind::Access) => write!(f, "Invalid token"),
            AuthError::TokenInvalid(TokenKind::Refresh) => {
                write!(f, "Invalid session - Please authenticate")
            }
            AuthError::InvalidPayload => write!(f, "Invalid token payload"),
            AuthError::SessionInvalid => write!(f, "Invalid session - User not found"),
        }
    }
}

impl StdError for AuthError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Store(StoreError),
    Config(ConfigError),
    Internal(String),
}

impl AppError {
    /// Map a codec failure for a token of `kind`.
    /// Expiry and signature problems are credential errors; anything else is
    /// a server fault.
    pub fn from_codec(err: CodecError, kind: TokenKind) -> Self {
        match err {
            CodecError::Expired => AppError::Auth(AuthError::TokenExpired(kind)),
            CodecError::Malformed | CodecError::InvalidSignature => {
                AppError::Auth(AuthError::TokenInvalid(kind))
            }
            CodecError::Internal(msg) => AppError::Internal(msg),
        }
    }

    /// Credential errors end the session on the client as well
    pub fn is_credential_error(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable error message, never internal detail
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
}

impl ErrorResponse {
    pub fn new(message: String, code: String) -> Self {
        Self {
            success: false,
            message,
            code,
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Auth(e) => {
                let code = match e {
                    AuthError::MissingToken | AuthError::MissingBearer => "MISSING_TOKEN",
                    AuthError::TokenExpired(_) => "TOKEN_EXPIRED",
                    AuthError::TokenInvalid(_) | AuthError::InvalidPayload => "TOKEN_INVALID",
                    AuthError::SessionInvalid => "SESSION_INVALID",
                };
                (StatusCode::UNAUTHORIZED, code, e.to_string())
            }

            AppError::Store(StoreError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "User not found".to_string(),
            ),

            AppError::Store(StoreError::Backend(_))
            | AppError::Config(_)
            | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        (status, ErrorResponse::new(message, code.to_string()))
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Auth(e) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %e,
                    "Authentication error"
                );
            }
            AppError::Store(StoreError::NotFound(what)) => {
                tracing::info!(
                    request_id = request_id,
                    principal = %what,
                    "Principal not found"
                );
            }
            AppError::Store(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Principal store error"
                );
            }
            AppError::Config(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Configuration error"
                );
            }
            AppError::Internal(msg) => {
                tracing::error!(
                    request_id = request_id,
                    error = %msg,
                    "Internal error"
                );
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, body) = <Self as ErrorHandler>::error_response(self);

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
