/// Wire protocol types shared between the client engine and the authority.
///
/// The wire action is the authority-facing serialized form of a mutation,
/// distinct from the richer client-local `Action`: the client's REMOVE_CARD
/// becomes DELETE_CARD on the wire, and MOVE_LIST never crosses the wire at
/// all (list ordering is a client display concern).
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Card, List};

/// The closed set of action kinds the authority accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireActionType {
    AddList,
    UpdateList,
    ArchiveList,
    AddCard,
    UpdateCard,
    DeleteCard,
    DeleteList,
    MoveCard,
}

/// One queued, not-yet-confirmed wire action. Immutable once created;
/// removed from the queue only on confirmed success.
///
/// `client_version` is the board version at creation time (pre-mutation)
/// and is the optimistic-concurrency token the authority checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueItem {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: WireActionType,
    pub payload: serde_json::Value,
    pub client_version: u64,
}

impl SyncQueueItem {
    pub fn new(action_type: WireActionType, payload: serde_json::Value, client_version: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action_type,
            payload,
            client_version,
        }
    }
}

/// The canonical board document held by the authority, and the payload of
/// the one-time migration handshake. No `list_order` — ordering is not
/// replicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub lists: HashMap<String, List>,
    pub cards: HashMap<String, Card>,
    #[serde(default)]
    pub version: u64,
}

impl BoardSnapshot {
    pub fn empty() -> Self {
        Self {
            lists: HashMap::new(),
            cards: HashMap::new(),
            version: 0,
        }
    }
}

/// `GET /state` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStateResponse {
    pub exists: bool,
    pub version: u64,
}

/// `POST /sync` and `POST /migrate` success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub version: u64,
}

/// `POST /sync` 409 body: the authority's version was ahead of the
/// client's token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResponse {
    pub message: String,
    pub server_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_version: Option<u64>,
}
