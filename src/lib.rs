pub mod auth;
pub mod cache;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod principal;
pub mod routes;
pub mod session;
pub mod startup;
pub mod store;
pub mod telemetry;
