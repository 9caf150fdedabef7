/// Authority-facing API client.
///
/// The `Authority` port abstracts the remote canonical-board service so
/// the sync engine can be driven against a scripted double in tests. The
/// production implementation is `HttpAuthority`, a thin reqwest wrapper
/// over the three endpoints:
///
///   POST /sync     -> apply one wire action (409 on stale clientVersion)
///   GET  /state    -> { exists, version }
///   POST /migrate  -> push the initial snapshot (409 if a board exists)
use async_trait::async_trait;

use crate::wire::{BoardSnapshot, ConflictResponse, ServerStateResponse, SyncQueueItem, SyncResponse};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The authority's version is ahead of the client's token. Carries the
    /// authority's current version; resolution is the caller's problem.
    #[error("version conflict: authority is at version {server_version}")]
    Conflict { server_version: u64 },

    /// Non-2xx response that is not a version conflict.
    #[error("authority error: status {status}")]
    Server { status: u16 },

    /// Transport-level failure (timeout, connection refused, bad body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[async_trait]
pub trait Authority: Send + Sync {
    /// Submit one queued wire action for application.
    async fn sync_action(&self, item: &SyncQueueItem) -> Result<SyncResponse, ApiError>;

    /// Ask whether the authority holds a board yet, and at which version.
    async fn server_state(&self) -> Result<ServerStateResponse, ApiError>;

    /// Push a local snapshot as the initial canonical board.
    async fn migrate(&self, snapshot: &BoardSnapshot) -> Result<SyncResponse, ApiError>;
}

pub struct HttpAuthority {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthority {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Authority for HttpAuthority {
    async fn sync_action(&self, item: &SyncQueueItem) -> Result<SyncResponse, ApiError> {
        let resp = self
            .client
            .post(format!("{}/sync", self.base_url))
            .json(item)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::CONFLICT {
            let conflict: ConflictResponse = resp.json().await?;
            return Err(ApiError::Conflict {
                server_version: conflict.server_version,
            });
        }
        if !resp.status().is_success() {
            return Err(ApiError::Server {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn server_state(&self) -> Result<ServerStateResponse, ApiError> {
        let resp = self
            .client
            .get(format!("{}/state", self.base_url))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Server {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn migrate(&self, snapshot: &BoardSnapshot) -> Result<SyncResponse, ApiError> {
        let resp = self
            .client
            .post(format!("{}/migrate", self.base_url))
            .json(snapshot)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Server {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }
}
