use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use kanban_core::wire::BoardSnapshot;

use crate::apply::apply_action;
use crate::state::AppState;
use crate::store::RepoError;

/// Axum REST API routes.
///
///   POST /sync     -> apply one wire action under the version check
///   GET  /state    -> board existence + current version
///   POST /migrate  -> accept the initial snapshot from a client
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_action))
        .route("/state", get(server_state))
        .route("/migrate", post(migrate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Raw action-type string: unrecognized kinds must still be accepted
    /// (and advance the version), so this is not the closed client enum.
    #[serde(rename = "type")]
    pub action_type: Option<String>,
    pub client_version: Option<u64>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

fn log_api_issue(status: StatusCode, context: &str, error: &str) {
    log::warn!("[api] {} -> {}: {}", context, status.as_u16(), error);
}

/// POST /sync — apply one wire action to the canonical board.
///
/// Creates an empty board on first use. Rejects with 409 when the
/// client's version token is strictly behind the stored version; the
/// stored board is untouched by a rejected call.
pub async fn sync_action(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(action_type) = req.action_type else {
        let status = StatusCode::BAD_REQUEST;
        log_api_issue(status, "sync", "missing action type");
        return (status, Json(json!({ "message": "Missing action type" })));
    };

    let mut board = state.repo.get().unwrap_or_else(BoardSnapshot::empty);

    if let Some(client_version) = req.client_version {
        if client_version < board.version {
            let status = StatusCode::CONFLICT;
            log_api_issue(
                status,
                "sync",
                &format!(
                    "stale client version {} (authority at {})",
                    client_version, board.version
                ),
            );
            return (
                status,
                Json(json!({
                    "message": "Version conflict",
                    "serverVersion": board.version,
                    "clientVersion": client_version,
                })),
            );
        }
    }

    apply_action(&mut board, &action_type, &req.payload);
    let version = board.version;

    if let Err(e) = state.repo.put(board) {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        log_api_issue(status, "sync", &e.to_string());
        return (status, Json(json!({ "message": e.to_string() })));
    }

    log::debug!("[api] applied {} (version {})", action_type, version);
    (StatusCode::OK, Json(json!({ "success": true, "version": version })))
}

/// GET /state — board existence and version.
pub async fn server_state(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.repo.version() {
        Some(version) => Json(json!({ "exists": true, "version": version })),
        None => Json(json!({ "exists": false, "version": 0 })),
    }
}

/// POST /migrate — accept an initial snapshot as the canonical board.
pub async fn migrate(
    State(state): State<AppState>,
    Json(snapshot): Json<BoardSnapshot>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.repo.create(snapshot) {
        Ok(version) => {
            log::info!("[api] board migrated at version {}", version);
            (StatusCode::OK, Json(json!({ "success": true, "version": version })))
        }
        Err(RepoError::AlreadyExists) => {
            let status = StatusCode::CONFLICT;
            log_api_issue(status, "migrate", "board already exists");
            (status, Json(json!({ "message": "Board already exists" })))
        }
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            log_api_issue(status, "migrate", &e.to_string());
            (status, Json(json!({ "message": e.to_string() })))
        }
    }
}
