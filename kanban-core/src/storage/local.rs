/// Local filesystem storage backend.
///
/// Two JSON files under a data directory, one per storage key:
/// - `board.json` — the full board state
/// - `queue.json` — the sync queue
///
/// Writes are atomic (write to `.tmp`, rename) so a crash mid-save never
/// leaves a torn file behind.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::BoardState;
use crate::wire::SyncQueueItem;

use super::{BoardStore, StoreError};

const BOARD_FILE: &str = "board.json";
const QUEUE_FILE: &str = "queue.json";

pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn write_atomic(&self, file: &str, content: &str) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{}.tmp", file));
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(content.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read_optional(&self, file: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.dir.join(file)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl BoardStore for LocalStore {
    fn save_board_state(&self, state: &BoardState) -> Result<(), StoreError> {
        self.write_atomic(BOARD_FILE, &serde_json::to_string(state)?)
    }

    fn load_board_state(&self) -> Result<Option<BoardState>, StoreError> {
        match self.read_optional(BOARD_FILE)? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    fn save_sync_queue(&self, queue: &[SyncQueueItem]) -> Result<(), StoreError> {
        self.write_atomic(QUEUE_FILE, &serde_json::to_string(queue)?)
    }

    fn load_sync_queue(&self) -> Result<Vec<SyncQueueItem>, StoreError> {
        match self.read_optional(QUEUE_FILE)? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Vec::new()),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        for file in [BOARD_FILE, QUEUE_FILE] {
            match fs::remove_file(self.dir.join(file)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
