use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 9000;

#[derive(Debug, thiserror::Error)]
enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn port() -> Result<u16, ConfigError> {
    match std::env::var("PORT") {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw)),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = format!("127.0.0.1:{}", port()?);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock api listening");
    mock_server::run(listener).await?;
    Ok(())
}
