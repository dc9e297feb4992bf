//! Per-owner note lists persisted in a key-value store.
//!
//! Every operation is best-effort: storage and serialization failures are
//! logged and swallowed, so callers never fail because of local persistence.

use crate::error::NoteResult;
use crate::notes::{Note, NoteId, OwnerId};

use super::storage::KeyValueStore;

/// Storage key prefix; the owner identity is appended.
const KEY_PREFIX: &str = "audio-notes-";

/// Ordered (newest first) note lists, one per owner.
pub struct LocalNotes<K: KeyValueStore> {
  store: K,
}

impl<K: KeyValueStore> LocalNotes<K> {
  pub fn new(store: K) -> Self {
    Self { store }
  }

  fn key(owner: &OwnerId) -> String {
    format!("{}{}", KEY_PREFIX, owner)
  }

  /// Parse a stored list. Unreadable values count as empty.
  fn decode(owner: &OwnerId, raw: Option<&str>) -> Vec<Note> {
    let Some(raw) = raw else {
      return Vec::new();
    };

    match serde_json::from_str::<Vec<Note>>(raw) {
      Ok(notes) => notes,
      Err(e) => {
        tracing::warn!(owner = %owner, "discarding unreadable local notes: {}", e);
        Vec::new()
      }
    }
  }

  fn try_load(&self, owner: &OwnerId) -> NoteResult<Vec<Note>> {
    let raw = self.store.read(&Self::key(owner))?;
    Ok(Self::decode(owner, raw.as_deref()))
  }

  /// Apply `change` to the owner's list as one atomic store update.
  ///
  /// `change` returns false when it left the list untouched.
  fn modify<F>(&self, owner: &OwnerId, mut change: F) -> NoteResult<()>
  where
    F: FnMut(&mut Vec<Note>) -> bool,
  {
    self.store.update(&Self::key(owner), &mut |raw| {
      let mut notes = Self::decode(owner, raw);
      if !change(&mut notes) {
        return Ok(None);
      }
      Ok(Some(serde_json::to_string(&notes)?))
    })
  }

  /// All notes stored for `owner`, newest first.
  pub fn list(&self, owner: &OwnerId) -> Vec<Note> {
    self.try_load(owner).unwrap_or_else(|e| {
      tracing::warn!(owner = %owner, "failed to read local notes: {}", e);
      Vec::new()
    })
  }

  /// Local-tagged notes still waiting for the server.
  pub fn pending(&self, owner: &OwnerId) -> Vec<Note> {
    self.list(owner).into_iter().filter(Note::is_local).collect()
  }

  /// Store `note` at the front, replacing any copy with the same identifier.
  pub fn append(&self, owner: &OwnerId, note: &Note) {
    let result = self.modify(owner, |notes| {
      notes.retain(|n| n.id != note.id);
      notes.insert(0, note.clone());
      true
    });

    if let Err(e) = result {
      tracing::warn!(owner = %owner, note = %note.id, "failed to store note locally: {}", e);
    }
  }

  /// Remove the note with `id`. Missing notes are not an error.
  pub fn remove(&self, owner: &OwnerId, id: &NoteId) {
    let result = self.modify(owner, |notes| {
      let before = notes.len();
      notes.retain(|n| &n.id != id);
      notes.len() != before
    });

    if let Err(e) = result {
      tracing::warn!(owner = %owner, note = %id, "failed to remove local note: {}", e);
    }
  }

  /// Replace the server-backed copy with `remote`, keeping pending local notes.
  ///
  /// Returns the merged list: pending notes first, then the remote ones.
  pub fn backup(&self, owner: &OwnerId, remote: &[Note]) -> Vec<Note> {
    let mut merged = None;
    let result = self.modify(owner, |notes| {
      notes.retain(|n| n.is_local() && !remote.iter().any(|r| r.id == n.id));
      notes.extend(remote.iter().cloned());
      merged = Some(notes.clone());
      true
    });

    if let Err(e) = result {
      tracing::warn!(owner = %owner, "failed to back up notes locally: {}", e);
    }

    merged.unwrap_or_else(|| remote.to_vec())
  }
}
