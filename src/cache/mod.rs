//! Caching and local persistence for offline support.
//!
//! This module provides:
//! - An in-memory listing cache with a freshness window and stale-while-error reads
//! - A key-value storage trait with a SQLite backend
//! - Per-owner note lists layered over that storage

mod layer;
mod local;
mod storage;
mod traits;

pub use layer::NoteCache;
pub use local::LocalNotes;
pub use storage::{KeyValueStore, SqliteStore};
pub use traits::{Listing, ListingSource};
