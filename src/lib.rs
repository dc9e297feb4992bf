//! Offline-resilient note sync client.
//!
//! Notes are written to the remote notes API when it is reachable and to a
//! per-owner local store otherwise. Locally created notes are pushed to the
//! server by [`notes::SyncCoordinator`] once connectivity returns.

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod notes;

pub use error::{NoteError, NoteResult};
