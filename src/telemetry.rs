use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialise structured logging.
/// Emits JSON lines on stdout; `RUST_LOG` controls the level. Records from
/// the `log` crate (actix's Logger, the request logger) are bridged in.
pub fn init_telemetry() {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(formatting_layer)
        .init();
}

/// Same pipeline for tests. Safe to call more than once; only the first call
/// installs a subscriber. Output is captured by the test harness.
pub fn init_test_telemetry() {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .json();

    let _ = tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(formatting_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test_telemetry();
        init_test_telemetry();
        tracing::info!("telemetry ready");
    }
}
