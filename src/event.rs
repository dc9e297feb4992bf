use std::fmt;
use tokio::sync::broadcast;

use crate::notes::{NoteId, OwnerId};

/// Default number of events buffered per subscriber
const EVENT_CAPACITY: usize = 64;

/// Notifications published by the note facade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent {
  /// The owner's note set changed; listings should be refreshed
  NotesChanged { owner: OwnerId },
  /// A note could not reach the server and was kept locally
  SavedLocally { owner: OwnerId, id: NoteId },
  /// The server accepted a request but reported a degraded result
  RemoteWarning { owner: OwnerId, message: String },
  /// A sync pass finished
  SyncCompleted {
    owner: OwnerId,
    synced: usize,
    pending: usize,
  },
}

impl NoteEvent {
  pub fn owner(&self) -> &OwnerId {
    match self {
      NoteEvent::NotesChanged { owner }
      | NoteEvent::SavedLocally { owner, .. }
      | NoteEvent::RemoteWarning { owner, .. }
      | NoteEvent::SyncCompleted { owner, .. } => owner,
    }
  }
}

/// Advisory text suitable for a toast or status line.
impl fmt::Display for NoteEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NoteEvent::NotesChanged { .. } => write!(f, "Notes updated"),
      NoteEvent::SavedLocally { .. } => {
        write!(f, "Note saved locally. Will sync when connection is restored.")
      }
      NoteEvent::RemoteWarning { message, .. } => write!(f, "{}", message),
      NoteEvent::SyncCompleted {
        synced, pending, ..
      } => write!(
        f,
        "Successfully synced {} of {} note{}",
        synced,
        pending,
        if *pending == 1 { "" } else { "s" }
      ),
    }
  }
}

/// Fan-out channel between the facade and any number of views.
#[derive(Debug, Clone)]
pub struct EventBus {
  tx: broadcast::Sender<NoteEvent>,
}

impl Default for EventBus {
  fn default() -> Self {
    Self::new(EVENT_CAPACITY)
  }
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _rx) = broadcast::channel(capacity);
    Self { tx }
  }

  /// Receive events published after this call.
  pub fn subscribe(&self) -> broadcast::Receiver<NoteEvent> {
    self.tx.subscribe()
  }

  /// Publish an event. Having no subscribers is fine.
  pub fn emit(&self, event: NoteEvent) {
    tracing::debug!(?event, "note event");
    let _ = self.tx.send(event);
  }
}
