//! Authority server: holds the single canonical board and applies wire
//! actions from clients under an optimistic version check.
mod apply;
mod config;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;
use crate::store::BoardRepo;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = config::load_config(&config::default_config_path());
    let repo = Arc::new(BoardRepo::open(&config.data_dir())?);
    if let Some(version) = repo.version() {
        log::info!("Loaded canonical board at version {}", version);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::api_router()
        .layer(cors)
        .with_state(AppState { repo });

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.bind_address, config.port)).await?;
    log::info!("Authority listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
