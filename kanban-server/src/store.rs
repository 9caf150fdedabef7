/// Canonical board repository.
///
/// The authority holds exactly one board document. It lives behind a
/// single well-known key — `board.json` in the data dir — so growing to
/// multiple boards later only means parameterizing that key. In-memory
/// reads via RwLock, write-through to disk with atomic tmp+rename writes.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use kanban_core::wire::BoardSnapshot;

const BOARD_FILE: &str = "board.json";

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Board already exists")]
    AlreadyExists,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub struct BoardRepo {
    path: PathBuf,
    board: RwLock<Option<BoardSnapshot>>,
}

impl BoardRepo {
    /// Open the repository at `data_dir`, loading a previously persisted
    /// board document if one exists.
    pub fn open(data_dir: &Path) -> Result<Self, RepoError> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(BOARD_FILE);

        let board = match fs::read_to_string(&path) {
            Ok(content) => Some(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            board: RwLock::new(board),
        })
    }

    pub fn get(&self) -> Option<BoardSnapshot> {
        self.board.read().unwrap().clone()
    }

    pub fn version(&self) -> Option<u64> {
        self.board.read().unwrap().as_ref().map(|b| b.version)
    }

    /// Create the initial canonical board from a migrated snapshot.
    pub fn create(&self, snapshot: BoardSnapshot) -> Result<u64, RepoError> {
        let mut board = self.board.write().unwrap();
        if board.is_some() {
            return Err(RepoError::AlreadyExists);
        }
        self.persist(&snapshot)?;
        let version = snapshot.version;
        *board = Some(snapshot);
        Ok(version)
    }

    /// Replace the board document after an applied action.
    pub fn put(&self, snapshot: BoardSnapshot) -> Result<(), RepoError> {
        let mut board = self.board.write().unwrap();
        self.persist(&snapshot)?;
        *board = Some(snapshot);
        Ok(())
    }

    fn persist(&self, board: &BoardSnapshot) -> Result<(), RepoError> {
        let content = serde_json::to_string(board)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(content.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
