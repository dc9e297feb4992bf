//! In-memory cache of the last successful note listing.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::notes::{Note, OwnerId};

struct CacheEntry {
  owner: OwnerId,
  notes: Vec<Note>,
  cached_at: Instant,
}

/// Single-entry listing cache scoped by owner.
///
/// An entry is served on the happy path only while it is younger than the
/// freshness window. Expired entries stay around for stale-while-error reads
/// until the next write invalidates them.
pub struct NoteCache {
  entry: Mutex<Option<CacheEntry>>,
  /// How long a listing is served without asking the server
  freshness: Duration,
}

impl NoteCache {
  pub fn new(freshness: Duration) -> Self {
    Self {
      entry: Mutex::new(None),
      freshness,
    }
  }

  fn lock(&self) -> MutexGuard<'_, Option<CacheEntry>> {
    self.entry.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Notes cached for `owner` that are still inside the freshness window.
  pub fn get_fresh(&self, owner: &OwnerId) -> Option<Vec<Note>> {
    let entry = self.lock();
    entry
      .as_ref()
      .filter(|e| &e.owner == owner && e.cached_at.elapsed() < self.freshness)
      .map(|e| e.notes.clone())
  }

  /// Notes cached for `owner` regardless of age.
  pub fn get_stale(&self, owner: &OwnerId) -> Option<Vec<Note>> {
    let entry = self.lock();
    entry
      .as_ref()
      .filter(|e| &e.owner == owner)
      .map(|e| e.notes.clone())
  }

  pub fn put(&self, owner: &OwnerId, notes: Vec<Note>) {
    *self.lock() = Some(CacheEntry {
      owner: owner.clone(),
      notes,
      cached_at: Instant::now(),
    });
  }

  /// Drop the cached listing, whichever owner it belongs to.
  pub fn invalidate(&self) {
    *self.lock() = None;
  }
}
