use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenCodec;
use crate::cache::{CacheBackend, InMemoryCache, ProfileCache, RedisCache};
use crate::configuration::{CacheBackendKind, Settings, StorageBackendKind};
use crate::error::{AppError, ConfigError};
use crate::logger::LoggerMiddleware;
use crate::middleware::AccessGuard;
use crate::principal::Role;
use crate::routes::{current_principal, health_check, logout, refresh, session};
use crate::session::{CookieTransport, SessionService};
use crate::store::{PgPrincipalStore, RoleRegistry};

pub const ROUTE_PREFIX: &str = "/api/v1";

/// Connect the configured principal stores and cache backend
pub async fn build_session_service(settings: &Settings) -> Result<SessionService, AppError> {
    let codec = Arc::new(TokenCodec::new(&settings.jwt));

    let registry = match settings.storage.backend {
        StorageBackendKind::Memory => {
            tracing::warn!("Using in-memory principal stores; data is lost on restart");
            RoleRegistry::in_memory()
        }
        StorageBackendKind::Postgres => {
            let database = settings
                .database
                .as_ref()
                .ok_or_else(|| ConfigError::MissingRequired("database".to_string()))?;
            tracing::info!("Attempting to connect to database");

            let pool = PgPoolOptions::new()
                .max_connections(settings.storage.max_connections)
                .connect(&database.connection_string())
                .await
                .map_err(|e| AppError::Internal(format!("Database connection error: {}", e)))?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| AppError::Internal(format!("Database migration error: {}", e)))?;

            tracing::info!("Database connection pool created successfully");
            RoleRegistry::new(
                Arc::new(PgPrincipalStore::new(pool.clone(), Role::Student)),
                Arc::new(PgPrincipalStore::new(pool, Role::Instructor)),
            )
        }
    };

    let backend: Arc<dyn CacheBackend> = match settings.cache.backend {
        CacheBackendKind::Memory => Arc::new(InMemoryCache::new()),
        CacheBackendKind::Redis => {
            let redis = settings
                .redis
                .as_ref()
                .ok_or_else(|| ConfigError::MissingRequired("redis".to_string()))?;
            let cache = RedisCache::connect(&redis.url)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            tracing::info!("Connected to Redis cache");
            Arc::new(cache)
        }
    };

    let cache = ProfileCache::new(backend, Duration::from_secs(settings.cache.ttl_seconds));
    Ok(SessionService::new(codec, registry, cache))
}

pub fn run(
    listener: TcpListener,
    sessions: SessionService,
    transport: CookieTransport,
) -> Result<Server, std::io::Error> {
    let codec = sessions.shared_codec();
    let sessions = web::Data::new(sessions);
    let transport = web::Data::new(transport);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(sessions.clone())
            .app_data(transport.clone())

            .service(
                web::scope(ROUTE_PREFIX)
                    .route("/health-check", web::get().to(health_check))
                    // Cookie-authenticated routes
                    .service(
                        web::resource("/refresh")
                            .route(web::post().to(refresh))
                            .route(web::get().to(refresh)),
                    )
                    .route("/auth/session", web::get().to(session))
                    .route("/logout", web::post().to(logout))

                    // Protected routes (require a bearer access token)
                    .service(
                        web::resource("/me")
                            .wrap(AccessGuard::new(codec.clone()))
                            .route(web::get().to(current_principal)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
