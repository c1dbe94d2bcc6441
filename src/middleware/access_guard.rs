/// Access Guard Middleware
///
/// Validates the bearer access token on protected routes and injects the
/// caller's `Identity` into request extensions for handlers to pick up with
/// `web::ReqData<Identity>`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{CodecError, TokenCodec, TokenKind};
use crate::error::{AppError, AuthError};
use crate::principal::Role;

/// Verified caller of a protected route
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject_id: String,
    pub role: Option<Role>,
}

pub struct AccessGuard {
    codec: Arc<TokenCodec>,
}

impl AccessGuard {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AccessGuardService {
            service: Rc::new(service),
            codec: self.codec.clone(),
        }))
    }
}

pub struct AccessGuardService<S> {
    service: Rc<S>,
    codec: Arc<TokenCodec>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Verify an access token and turn it into an `Identity`
pub fn authenticate(codec: &TokenCodec, token: &str) -> Result<Identity, AppError> {
    let claims = codec.verify_access(token).map_err(|e| {
        if let CodecError::Internal(detail) = &e {
            tracing::error!(error = %detail, "Unexpected access token verification failure");
            return AppError::Internal("Authentication failed".to_string());
        }
        AppError::from_codec(e, TokenKind::Access)
    })?;

    if claims.sub.is_empty() {
        return Err(AuthError::InvalidPayload.into());
    }

    Ok(Identity {
        subject_id: claims.sub,
        role: claims.role,
    })
}

impl<S, B> Service<ServiceRequest> for AccessGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = match bearer_token(&req) {
            None => Err(AppError::Auth(AuthError::MissingBearer)),
            Some(token) => authenticate(&self.codec, &token),
        };

        match outcome {
            Ok(identity) => {
                tracing::debug!(user_id = %identity.subject_id, "Access token validated");
                req.extensions_mut().insert(identity);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let err: Error = e.into();
                Box::pin(async move { Err::<ServiceResponse<B>, Error>(err) })
            }
        }
    }
}
