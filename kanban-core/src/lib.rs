//! Offline-first kanban board core: domain model, pure state reducer with
//! undo/redo, durable sync queue, and the replay engine that reconciles
//! local edits against the remote authority.

pub mod api;
pub mod engine;
pub mod reducer;
pub mod storage;
pub mod types;
pub mod wire;
