/// Action application against the canonical board document.
///
/// Structural rules mirror the client reducer, minus its undo/redo and
/// queue bookkeeping. Dispatch is keyed on the raw action-type string
/// because the authority accepts kinds it does not recognize: the board
/// version advances unconditionally after every call, even when the
/// switch matched nothing, so the version never stalls on malformed
/// input. Unknown or malformed payloads are silent structural no-ops.
use serde_json::Value;

use kanban_core::reducer::CardPatch;
use kanban_core::types::{Card, List};
use kanban_core::wire::BoardSnapshot;

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

pub fn apply_action(board: &mut BoardSnapshot, action_type: &str, payload: &Value) {
    match action_type {
        "ADD_LIST" => {
            if let Ok(list) = serde_json::from_value::<List>(payload.clone()) {
                board.lists.insert(list.id.clone(), list);
            }
        }

        "UPDATE_LIST" => {
            if let Some(list) = str_field(payload, "listId").and_then(|id| board.lists.get_mut(id))
            {
                if let Some(title) = str_field(payload, "title") {
                    list.title = title.to_string();
                }
                list.version += 1;
            }
        }

        "ARCHIVE_LIST" => {
            if let Some(list) = str_field(payload, "listId").and_then(|id| board.lists.get_mut(id))
            {
                list.archived = true;
                list.version += 1;
            }
        }

        "ADD_CARD" => {
            if let Ok(card) = serde_json::from_value::<Card>(payload.clone()) {
                if let Some(list) = board.lists.get_mut(&card.list_id) {
                    if !list.card_ids.contains(&card.id) {
                        list.card_ids.push(card.id.clone());
                    }
                    board.cards.insert(card.id.clone(), card);
                }
            }
        }

        "UPDATE_CARD" => {
            if let Some(card) = str_field(payload, "cardId").and_then(|id| board.cards.get_mut(id))
            {
                let patch = payload
                    .get("updates")
                    .cloned()
                    .map(serde_json::from_value::<CardPatch>);
                if let Some(Ok(patch)) = patch {
                    patch.apply_to(card);
                } else {
                    card.version += 1;
                }
            }
        }

        "DELETE_CARD" => {
            if let Some(card) = str_field(payload, "cardId").and_then(|id| board.cards.remove(id))
            {
                if let Some(list) = board.lists.get_mut(&card.list_id) {
                    list.card_ids.retain(|id| *id != card.id);
                }
            }
        }

        "DELETE_LIST" => {
            if let Some(list) = str_field(payload, "listId").and_then(|id| board.lists.remove(id))
            {
                for card_id in &list.card_ids {
                    board.cards.remove(card_id);
                }
            }
        }

        "MOVE_CARD" => {
            if let (Some(card_id), Some(from_id), Some(to_id)) = (
                str_field(payload, "cardId"),
                str_field(payload, "fromListId"),
                str_field(payload, "toListId"),
            ) {
                let target_index = payload
                    .get("targetIndex")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as usize;

                if board.lists.contains_key(from_id)
                    && board.lists.contains_key(to_id)
                    && board.cards.contains_key(card_id)
                {
                    if let Some(from) = board.lists.get_mut(from_id) {
                        from.card_ids.retain(|id| id != card_id);
                    }
                    if let Some(to) = board.lists.get_mut(to_id) {
                        to.card_ids.retain(|id| id != card_id);
                        let index = target_index.min(to.card_ids.len());
                        to.card_ids.insert(index, card_id.to_string());
                    }
                    if let Some(card) = board.cards.get_mut(card_id) {
                        card.list_id = to_id.to_string();
                    }
                }
            }
        }

        // unrecognized kinds are structural no-ops; the version still
        // advances below
        _ => {}
    }

    // always advance, even when the switch matched nothing
    board.version += 1;
}
