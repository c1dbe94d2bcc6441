/// JWT Claims structures
///
/// Access and refresh tokens carry different payloads. Both name their kind in
/// a `tokenType` claim so a token from one signing domain can never pass as
/// the other, even if both secrets were misconfigured to the same value.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::principal::Role;

pub const ACCESS_TOKEN_TYPE: &str = "accessToken";
pub const REFRESH_TOKEN_TYPE: &str = "refreshToken";

/// Which signing domain a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn token_type(&self) -> &'static str {
        match self {
            TokenKind::Access => ACCESS_TOKEN_TYPE,
            TokenKind::Refresh => REFRESH_TOKEN_TYPE,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims for short-lived access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessClaims {
    /// Subject (principal id)
    pub sub: String,
    /// Role is optional on access tokens; the guard only needs the subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(rename = "tokenType")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Claims for long-lived refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshClaims {
    pub sub: String,
    /// Selects the registry entry; an unknown value fails deserialization
    pub role: Role,
    #[serde(rename = "tokenType")]
    pub token_type: String,
    /// Random nonce, keeps consecutive rotations distinct
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl AccessClaims {
    pub fn new(subject: &str, role: Role, issued_at: i64, ttl_seconds: i64, issuer: &str) -> Self {
        Self {
            sub: subject.to_string(),
            role: Some(role),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iat: issued_at,
            exp: issued_at + ttl_seconds,
            iss: issuer.to_string(),
        }
    }
}

impl RefreshClaims {
    pub fn new(
        subject: &str,
        role: Role,
        token_id: String,
        issued_at: i64,
        ttl_seconds: i64,
        issuer: &str,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            role,
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            jti: token_id,
            iat: issued_at,
            exp: issued_at + ttl_seconds,
            iss: issuer.to_string(),
        }
    }
}
