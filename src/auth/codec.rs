/// Credential codec
///
/// Signs and verifies access and refresh tokens. Each kind has its own HMAC
/// secret and TTL; a token minted in one domain fails signature checks in the
/// other. Verification is pure and performs no I/O.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::auth::claims::{AccessClaims, RefreshClaims, TokenKind};
use crate::auth::refresh_token::generate_token_id;
use crate::configuration::JwtSettings;
use crate::principal::Role;

/// Why a token could not be issued or verified
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Signature is valid but `exp` has passed
    Expired,
    /// Not a parseable token, wrong claims, wrong issuer or wrong token type
    Malformed,
    InvalidSignature,
    /// Key or crypto failure unrelated to the presented token
    Internal(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Expired => write!(f, "token has expired"),
            CodecError::Malformed => write!(f, "token is malformed"),
            CodecError::InvalidSignature => write!(f, "token signature is invalid"),
            CodecError::Internal(msg) => write!(f, "token codec failure: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => CodecError::Expired,
            ErrorKind::InvalidSignature => CodecError::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidSubject
            | ErrorKind::InvalidAudience
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => CodecError::Malformed,
            _ => CodecError::Internal(err.to_string()),
        }
    }
}

#[derive(Clone)]
struct SigningDomain {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl SigningDomain {
    fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    access: SigningDomain,
    refresh: SigningDomain,
    issuer: String,
    leeway_seconds: u64,
}

impl TokenCodec {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            access: SigningDomain::new(&config.access_secret, config.access_token_expiry),
            refresh: SigningDomain::new(&config.refresh_secret, config.refresh_token_expiry),
            issuer: config.issuer.clone(),
            leeway_seconds: config.leeway_seconds,
        }
    }

    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh.ttl_seconds
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access.ttl_seconds
    }

    /// Issue a token of `kind` for `(subject, role)`, valid from now
    pub fn issue(&self, kind: TokenKind, subject: &str, role: Role) -> Result<String, CodecError> {
        self.issue_at(kind, subject, role, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(
        &self,
        kind: TokenKind,
        subject: &str,
        role: Role,
        issued_at: i64,
    ) -> Result<String, CodecError> {
        match kind {
            TokenKind::Access => {
                let claims = AccessClaims::new(
                    subject,
                    role,
                    issued_at,
                    self.access.ttl_seconds,
                    &self.issuer,
                );
                sign(&claims, &self.access)
            }
            TokenKind::Refresh => {
                let claims = RefreshClaims::new(
                    subject,
                    role,
                    generate_token_id(),
                    issued_at,
                    self.refresh.ttl_seconds,
                    &self.issuer,
                );
                sign(&claims, &self.refresh)
            }
        }
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, CodecError> {
        let claims: AccessClaims = self.verify_with(token, &self.access)?;
        ensure_token_type(&claims.token_type, TokenKind::Access)?;
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, CodecError> {
        let claims: RefreshClaims = self.verify_with(token, &self.refresh)?;
        ensure_token_type(&claims.token_type, TokenKind::Refresh)?;
        Ok(claims)
    }

    fn verify_with<C: DeserializeOwned>(
        &self,
        token: &str,
        domain: &SigningDomain,
    ) -> Result<C, CodecError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = self.leeway_seconds;

        decode::<C>(token, &domain.decoding, &validation)
            .map(|data| data.claims)
            .map_err(CodecError::from)
    }
}

fn sign<C: Serialize>(claims: &C, domain: &SigningDomain) -> Result<String, CodecError> {
    encode(&Header::new(Algorithm::HS256), claims, &domain.encoding)
        .map_err(|e| CodecError::Internal(format!("Token generation failed: {}", e)))
}

fn ensure_token_type(actual: &str, expected: TokenKind) -> Result<(), CodecError> {
    if actual == expected.token_type() {
        Ok(())
    } else {
        tracing::warn!(
            expected = expected.token_type(),
            actual = actual,
            "Token presented in the wrong signing domain"
        );
        Err(CodecError::Malformed)
    }
}
