/// Shared application state passed to axum handlers.
use std::sync::Arc;

use crate::store::BoardRepo;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<BoardRepo>,
}
