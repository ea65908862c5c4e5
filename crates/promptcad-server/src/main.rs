use std::net::SocketAddr;

use promptcad_server::{Config, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env();
    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        %address,
        interpret = config.gemini.is_some(),
        max_resolution = config.max_resolution,
        "listening"
    );

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app(config)).await?;
    Ok(())
}
