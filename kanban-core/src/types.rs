use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::wire::SyncQueueItem;

/// Current timestamp as an RFC 3339 string (the wire timestamp format).
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A list (column) on the board. Owns the display order of its cards
/// through `card_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub title: String,
    pub archived: bool,
    pub card_ids: Vec<String>,
    pub version: u64,
    pub last_modified_at: String,
}

impl List {
    pub fn new(title: &str) -> Self {
        Self {
            id: new_id(),
            title: title.to_string(),
            archived: false,
            card_ids: Vec::new(),
            version: 1,
            last_modified_at: now(),
        }
    }
}

/// A card. `list_id` is a back-reference: the owning list's `card_ids`
/// must contain this card's id, and no other list's may.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub list_id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub version: u64,
    pub last_modified_at: String,
}

impl Card {
    pub fn new(list_id: &str, title: &str, description: &str, tags: Vec<String>) -> Self {
        Self {
            id: new_id(),
            list_id: list_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            tags,
            version: 1,
            last_modified_at: now(),
        }
    }
}

/// Deep copy of the board's structural fields, used for undo/redo.
/// Never diffed incrementally — restored wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub lists: HashMap<String, List>,
    pub cards: HashMap<String, Card>,
    pub list_order: Vec<String>,
}

impl Snapshot {
    pub fn of(state: &BoardState) -> Self {
        Self {
            lists: state.lists.clone(),
            cards: state.cards.clone(),
            list_order: state.list_order.clone(),
        }
    }
}

/// The full client-side board state. Created empty at process start,
/// hydrated once from durable storage, and mutated only through the
/// reducer afterwards.
///
/// `version` increments exactly once per accepted mutating action and is
/// the optimistic-concurrency token exchanged with the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    pub lists: HashMap<String, List>,
    pub cards: HashMap<String, Card>,
    #[serde(default)]
    pub list_order: Vec<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub sync_queue: Vec<SyncQueueItem>,
    #[serde(default)]
    pub undo_stack: Vec<Snapshot>,
    #[serde(default)]
    pub redo_stack: Vec<Snapshot>,
}

impl BoardState {
    pub fn empty() -> Self {
        Self {
            lists: HashMap::new(),
            cards: HashMap::new(),
            list_order: Vec::new(),
            version: 0,
            sync_queue: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Check the card/list referential invariant: every card's `list_id`
    /// names an existing list whose `card_ids` contains the card exactly
    /// once, and no other list references it.
    pub fn cards_consistent(&self) -> bool {
        for card in self.cards.values() {
            let Some(owner) = self.lists.get(&card.list_id) else {
                return false;
            };
            if owner.card_ids.iter().filter(|id| **id == card.id).count() != 1 {
                return false;
            }
            let referenced_elsewhere = self
                .lists
                .values()
                .filter(|l| l.id != card.list_id)
                .any(|l| l.card_ids.contains(&card.id));
            if referenced_elsewhere {
                return false;
            }
        }
        true
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::empty()
    }
}
