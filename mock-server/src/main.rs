use aqua_mock_server::{AppState, ChainStore};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aqua_mock_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "9352".to_string());
    let token = std::env::var("AQUA_TOKEN").ok().filter(|t| !t.is_empty());
    if token.is_none() {
        tracing::warn!("AQUA_TOKEN not set, serving without authentication");
    }

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");
    aqua_mock_server::run(listener, AppState::new(ChainStore::seeded(), token)).await
}
