use std::net::TcpListener;
use campus_auth::configuration::get_configuration;
use campus_auth::session::CookieTransport;
use campus_auth::startup::{build_session_service, run};
use campus_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error"
            ));
        }
    };

    let sessions = build_session_service(&configuration).await.map_err(|e| {
        tracing::error!("Failed to initialise backing services: {}", e);
        std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Backing service connection error"
        )
    })?;

    let transport = CookieTransport::new(
        configuration.cookie.clone(),
        configuration.jwt.refresh_token_expiry,
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    let server = run(listener, sessions, transport)?;
    tracing::info!("Server listening on: {}", address);

    server.await
}
