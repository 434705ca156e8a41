use std::sync::Arc;
use storyweave::api;
use storyweave::config::AppConfig;
use storyweave::room::start_cleanup_task;
use storyweave::shared::AppState;
use storyweave::storage::InMemoryMirrorStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyweave=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storyweave game server");

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let cleanup = config.cleanup.clone();

    // The in-memory store keeps the mirror seam satisfied in development;
    // a Redis-backed MirrorStore implementation slots in here unchanged.
    let store = Arc::new(InMemoryMirrorStore::new());

    let state = AppState::new(config, store);

    tokio::spawn(start_cleanup_task(
        state.registry.clone(),
        state.stories.clone(),
        cleanup,
    ));

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind listen address");
    info!(addr = %bind_addr, "Server running");
    axum::serve(listener, app).await.expect("server error");
}
