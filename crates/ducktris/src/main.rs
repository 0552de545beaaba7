use ducktris::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the listen address.
const BIND_ENV: &str = "DUCKTRIS_BIND";

#[tokio::main]
async fn main() -> Result<(), DucktrisError> {
    // RUST_LOG=ducktris=debug for per-request logs
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var(BIND_ENV).unwrap_or_else(|_| "0.0.0.0:8888".to_string());

    let server = match DucktrisServer::builder().bind(&bind).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(%bind, error = %e, "failed to start");
            return Err(e);
        }
    };
    server.run().await
}
