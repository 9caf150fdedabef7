pub mod local;

use crate::types::BoardState;
use crate::wire::SyncQueueItem;

/// Abstract durable client storage for the board snapshot and the sync
/// queue. Keyed storage, last-write-wins, no transactional coupling
/// between the two keys.
/// Implementations: LocalStore (filesystem); future: browser/embedded KV.
pub trait BoardStore: Send + Sync {
    /// Persist the full board state (write-through, not batched).
    fn save_board_state(&self, state: &BoardState) -> Result<(), StoreError>;

    /// Load the persisted board state, `None` when nothing was ever saved.
    fn load_board_state(&self) -> Result<Option<BoardState>, StoreError>;

    /// Persist the sync queue.
    fn save_sync_queue(&self, queue: &[SyncQueueItem]) -> Result<(), StoreError>;

    /// Load the persisted sync queue, empty when nothing was ever saved.
    fn load_sync_queue(&self) -> Result<Vec<SyncQueueItem>, StoreError>;

    /// Drop both keys (debug / reset).
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
