//! In-memory remote used by unit tests.

use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{NoteError, NoteResult};

use super::client::{CreatedNote, RemoteDelete, RemoteNotes};
use super::types::{Note, NoteId, OwnerId};

#[derive(Default)]
struct FakeState {
  notes: Vec<Note>,
  next_id: u64,
  offline: bool,
  fail_lists: bool,
  fail_creates: bool,
  degrade_creates: bool,
  degraded_id: Option<NoteId>,
  list_calls: usize,
  create_calls: usize,
  delete_calls: usize,
}

#[derive(Default)]
pub struct FakeRemote {
  state: Mutex<FakeState>,
}

impl FakeRemote {
  pub fn new() -> Self {
    Self::default()
  }

  fn state(&self) -> MutexGuard<'_, FakeState> {
    self.state.lock().unwrap()
  }

  pub fn set_offline(&self, offline: bool) {
    self.state().offline = offline;
  }

  pub fn set_fail_lists(&self, fail: bool) {
    self.state().fail_lists = fail;
  }

  pub fn set_fail_creates(&self, fail: bool) {
    self.state().fail_creates = fail;
  }

  pub fn set_degrade_creates(&self, degrade: bool) {
    self.state().degrade_creates = degrade;
  }

  /// Identifier the server hands out for degraded creates.
  pub fn set_degraded_id(&self, id: NoteId) {
    self.state().degraded_id = Some(id);
  }

  pub fn list_calls(&self) -> usize {
    self.state().list_calls
  }

  pub fn create_calls(&self) -> usize {
    self.state().create_calls
  }

  pub fn delete_calls(&self) -> usize {
    self.state().delete_calls
  }

  /// Notes the server holds for `owner`.
  pub fn notes_of(&self, owner: &OwnerId) -> Vec<Note> {
    self
      .state()
      .notes
      .iter()
      .filter(|n| &n.owner == owner)
      .cloned()
      .collect()
  }

  /// Seed a server-side note directly.
  pub fn insert(&self, owner: &OwnerId, content: &str) -> Note {
    let mut state = self.state();
    state.next_id += 1;
    let note = Note {
      id: NoteId::new(format!("srv-{}", state.next_id)),
      content: content.to_string(),
      created_at: Utc::now(),
      owner: owner.clone(),
    };
    state.notes.insert(0, note.clone());
    note
  }
}

impl RemoteNotes for FakeRemote {
  async fn list_notes(&self, owner: &OwnerId, limit: usize) -> NoteResult<Vec<Note>> {
    let mut state = self.state();
    state.list_calls += 1;
    if state.offline || state.fail_lists {
      return Err(NoteError::RemoteUnavailable("HTTP 503".to_string()));
    }
    Ok(
      state
        .notes
        .iter()
        .filter(|n| &n.owner == owner)
        .take(limit)
        .cloned()
        .collect(),
    )
  }

  async fn create_note(&self, owner: &OwnerId, content: &str) -> NoteResult<CreatedNote> {
    let (degrade, degraded_id) = {
      let mut state = self.state();
      state.create_calls += 1;
      if state.offline || state.fail_creates {
        return Err(NoteError::RemoteUnavailable("HTTP 500".to_string()));
      }
      (state.degrade_creates, state.degraded_id.clone())
    };

    if degrade {
      let mut note = Note::new_local(owner, content);
      if let Some(id) = degraded_id {
        note.id = id;
      }
      return Ok(CreatedNote {
        note,
        warning: Some("Note saved locally due to database connection issues".to_string()),
      });
    }

    Ok(CreatedNote {
      note: self.insert(owner, content),
      warning: None,
    })
  }

  async fn delete_note(&self, owner: &OwnerId, id: &NoteId) -> NoteResult<RemoteDelete> {
    let mut state = self.state();
    state.delete_calls += 1;
    if state.offline {
      return Err(NoteError::RemoteUnavailable("connection refused".to_string()));
    }
    let before = state.notes.len();
    state.notes.retain(|n| !(&n.id == id && &n.owner == owner));
    if state.notes.len() < before {
      Ok(RemoteDelete::Deleted)
    } else {
      Ok(RemoteDelete::NotFoundOrForbidden)
    }
  }

  async fn probe(&self, _timeout: Duration) -> bool {
    !self.state().offline
  }
}
