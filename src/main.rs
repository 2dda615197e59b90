use mock_kms::error::{error_codes, KmsError};
use mock_kms::{KmsConfig, KmsResult, KmsServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> KmsResult<()> {
    // `log` records from the library are bridged into the subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => KmsConfig::from_file(path)?.with_overrides(|name| std::env::var(name).ok())?,
        None => KmsConfig::from_env()?,
    };

    let server = KmsServer::start(&config).await?;

    tokio::signal::ctrl_c().await.map_err(|e| {
        KmsError::server_error("signal", &e.to_string(), error_codes::SHUTDOWN_FAILED)
    })?;

    server.stop().await
}
