// Social Feed Server

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use social_feed::{app_state::AppState, config::Config, social_interface::create_social_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    let app = create_social_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Social feed server starting on http://{}", addr);
    info!("  POST   /register                  - Register and receive a token");
    info!("  POST   /users/{{id}}/follow         - Follow a user");
    info!("  POST   /posts/{{id}}/like           - Like a post");
    info!("  GET    /feed?page=&page_size=     - Posts from followed users");
    info!("  GET    /notifications             - Your notifications");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Social feed server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
    }
}
