/// Pure state reducer: `(BoardState, Action) -> BoardState`.
///
/// Every accepted mutating action atomically (within the returned value):
///   1. applies its structural change,
///   2. bumps the board `version` by exactly one,
///   3. appends one sync-queue item per authority-side effect,
///   4. pushes a pre-mutation snapshot onto the undo stack,
///   5. clears the redo stack.
///
/// Mutations aimed at missing targets are silent no-ops: the input state
/// comes back unchanged, with no version bump and no queue item. The
/// reducer never fails and never touches I/O.
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{now, BoardState, Card, List, Snapshot};
use crate::wire::{SyncQueueItem, WireActionType};

/// Partial card update. Fields left `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CardPatch {
    /// Merge the set fields onto `card`, bumping its entity version.
    pub fn apply_to(&self, card: &mut Card) {
        if let Some(title) = &self.title {
            card.title = title.clone();
        }
        if let Some(description) = &self.description {
            card.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            card.tags = tags.clone();
        }
        card.version += 1;
        card.last_modified_at = now();
    }
}

/// Everything the board can be asked to do, as a closed sum type.
/// The compiler enforces exhaustive handling — there is no silent
/// default branch for a mistyped action kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddList {
        title: String,
    },
    UpdateList {
        list_id: String,
        title: String,
    },
    ArchiveList {
        list_id: String,
    },
    AddCard {
        list_id: String,
        title: String,
        description: String,
        tags: Vec<String>,
    },
    UpdateCard {
        card_id: String,
        patch: CardPatch,
    },
    RemoveCard {
        list_id: String,
        card_id: String,
    },
    RemoveList {
        list_id: String,
    },
    MoveCard {
        card_id: String,
        from_list_id: String,
        to_list_id: String,
        target_index: usize,
    },
    /// Client-local reorder of `list_order`. Never queued, never versioned.
    MoveList {
        dragged_list_id: String,
        target_list_id: String,
    },
    Undo,
    Redo,
    /// Wholesale state replacement, used once at startup after durable load.
    HydrateState(Box<BoardState>),
    SyncSuccess {
        sync_item_id: String,
    },
    SyncFailure,
}

/// Clone `state` with the shared mutation bookkeeping applied: version
/// bump, pre-mutation undo snapshot, cleared redo stack.
fn begin_mutation(state: &BoardState) -> BoardState {
    let mut next = state.clone();
    next.undo_stack.push(Snapshot::of(state));
    next.redo_stack.clear();
    next.version += 1;
    next
}

pub fn board_reducer(state: &BoardState, action: &Action) -> BoardState {
    match action {
        Action::AddList { title } => {
            let list = List::new(title);
            let mut next = begin_mutation(state);
            next.list_order.push(list.id.clone());
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::AddList,
                json!(list),
                state.version,
            ));
            next.lists.insert(list.id.clone(), list);
            next
        }

        Action::UpdateList { list_id, title } => {
            if !state.lists.contains_key(list_id) {
                return state.clone();
            }
            let mut next = begin_mutation(state);
            if let Some(list) = next.lists.get_mut(list_id) {
                list.title = title.clone();
                list.version += 1;
                list.last_modified_at = now();
            }
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::UpdateList,
                json!({ "listId": list_id, "title": title }),
                state.version,
            ));
            next
        }

        Action::ArchiveList { list_id } => {
            if !state.lists.contains_key(list_id) {
                return state.clone();
            }
            let mut next = begin_mutation(state);
            if let Some(list) = next.lists.get_mut(list_id) {
                list.archived = true;
                list.version += 1;
                list.last_modified_at = now();
            }
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::ArchiveList,
                json!({ "listId": list_id }),
                state.version,
            ));
            next
        }

        Action::AddCard {
            list_id,
            title,
            description,
            tags,
        } => {
            if !state.lists.contains_key(list_id) {
                return state.clone();
            }
            let card = Card::new(list_id, title, description, tags.clone());
            let mut next = begin_mutation(state);
            if let Some(list) = next.lists.get_mut(list_id) {
                // de-duplicate defensively
                list.card_ids.retain(|id| *id != card.id);
                list.card_ids.push(card.id.clone());
            }
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::AddCard,
                json!(card),
                state.version,
            ));
            next.cards.insert(card.id.clone(), card);
            next
        }

        Action::UpdateCard { card_id, patch } => {
            if !state.cards.contains_key(card_id) {
                return state.clone();
            }
            let mut next = begin_mutation(state);
            if let Some(card) = next.cards.get_mut(card_id) {
                patch.apply_to(card);
            }
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::UpdateCard,
                json!({ "cardId": card_id, "updates": patch }),
                state.version,
            ));
            next
        }

        Action::RemoveCard { list_id, card_id } => {
            if !state.cards.contains_key(card_id) {
                return state.clone();
            }
            let mut next = begin_mutation(state);
            next.cards.remove(card_id);
            if let Some(list) = next.lists.get_mut(list_id) {
                list.card_ids.retain(|id| id != card_id);
            }
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::DeleteCard,
                json!({ "cardId": card_id }),
                state.version,
            ));
            next
        }

        Action::RemoveList { list_id } => {
            let Some(list) = state.lists.get(list_id) else {
                return state.clone();
            };
            let mut next = begin_mutation(state);
            // Cascade: one DELETE_CARD per contained card, in display
            // order, then the DELETE_LIST for the container.
            for card_id in &list.card_ids {
                next.cards.remove(card_id);
                next.sync_queue.push(SyncQueueItem::new(
                    WireActionType::DeleteCard,
                    json!({ "cardId": card_id }),
                    state.version,
                ));
            }
            next.lists.remove(list_id);
            next.list_order.retain(|id| id != list_id);
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::DeleteList,
                json!({ "listId": list_id }),
                state.version,
            ));
            next
        }

        Action::MoveCard {
            card_id,
            from_list_id,
            to_list_id,
            target_index,
        } => {
            if !state.lists.contains_key(from_list_id)
                || !state.lists.contains_key(to_list_id)
                || !state.cards.contains_key(card_id)
            {
                return state.clone();
            }
            let mut next = begin_mutation(state);
            if let Some(from) = next.lists.get_mut(from_list_id) {
                from.card_ids.retain(|id| id != card_id);
            }
            if let Some(to) = next.lists.get_mut(to_list_id) {
                // de-duplicate, then clamp the insertion index
                to.card_ids.retain(|id| id != card_id);
                let index = (*target_index).min(to.card_ids.len());
                to.card_ids.insert(index, card_id.clone());
            }
            if let Some(card) = next.cards.get_mut(card_id) {
                card.list_id = to_list_id.clone();
            }
            next.sync_queue.push(SyncQueueItem::new(
                WireActionType::MoveCard,
                json!({
                    "cardId": card_id,
                    "fromListId": from_list_id,
                    "toListId": to_list_id,
                    "targetIndex": target_index,
                }),
                state.version,
            ));
            next
        }

        Action::MoveList {
            dragged_list_id,
            target_list_id,
        } => {
            let from_index = state.list_order.iter().position(|id| id == dragged_list_id);
            let to_index = state.list_order.iter().position(|id| id == target_list_id);
            let (Some(from_index), Some(to_index)) = (from_index, to_index) else {
                return state.clone();
            };
            let mut next = state.clone();
            next.list_order.remove(from_index);
            next.list_order.insert(to_index, dragged_list_id.clone());
            next
        }

        Action::Undo => {
            let Some(previous) = state.undo_stack.last() else {
                return state.clone();
            };
            let mut next = state.clone();
            next.redo_stack.push(Snapshot::of(state));
            next.lists = previous.lists.clone();
            next.cards = previous.cards.clone();
            next.list_order = previous.list_order.clone();
            next.undo_stack.pop();
            next
        }

        Action::Redo => {
            let Some(following) = state.redo_stack.last() else {
                return state.clone();
            };
            let mut next = state.clone();
            next.undo_stack.push(Snapshot::of(state));
            next.lists = following.lists.clone();
            next.cards = following.cards.clone();
            next.list_order = following.list_order.clone();
            next.redo_stack.pop();
            next
        }

        Action::HydrateState(snapshot) => (**snapshot).clone(),

        Action::SyncSuccess { sync_item_id } => {
            let mut next = state.clone();
            next.sync_queue.retain(|item| item.id != *sync_item_id);
            next
        }

        Action::SyncFailure => state.clone(),
    }
}
