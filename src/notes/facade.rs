//! Note facade that layers caching, local fallback and sync over the remote client.

use std::time::Duration;
use tokio::sync::broadcast;

use crate::cache::{KeyValueStore, Listing, ListingSource, LocalNotes, NoteCache};
use crate::config::Config;
use crate::error::NoteResult;
use crate::event::{EventBus, NoteEvent};

use super::client::{RemoteDelete, RemoteNotes};
use super::sync::{SyncCoordinator, SyncReport};
use super::types::{validate_content, Note, NoteId, OwnerId};

/// Tunables for the facade.
#[derive(Debug, Clone)]
pub struct FacadeOptions {
  /// Timeout for the reachability probe before writes and syncs
  pub probe_timeout: Duration,
  /// Maximum notes requested per listing
  pub list_limit: usize,
  /// How long a cached listing is served without a remote call
  pub freshness: Duration,
}

impl Default for FacadeOptions {
  fn default() -> Self {
    Self {
      probe_timeout: Duration::from_secs(2),
      list_limit: 50,
      freshness: Duration::from_secs(5 * 60),
    }
  }
}

impl FacadeOptions {
  pub fn from_config(config: &Config) -> Self {
    Self {
      probe_timeout: config.server.probe_timeout(),
      list_limit: config.server.list_limit,
      freshness: config.cache.freshness(),
    }
  }
}

/// Single entry point for reading and writing notes.
///
/// Reads go cache, remote, stale cache, local store. Writes go to the remote
/// service when it is reachable and land in the local store otherwise; the
/// caller never sees a failed write except for invalid input.
pub struct NoteFacade<R: RemoteNotes, K: KeyValueStore> {
  remote: R,
  local: LocalNotes<K>,
  cache: NoteCache,
  events: EventBus,
  options: FacadeOptions,
}

impl<R: RemoteNotes, K: KeyValueStore> NoteFacade<R, K> {
  pub fn new(remote: R, store: K, options: FacadeOptions) -> Self {
    Self {
      remote,
      local: LocalNotes::new(store),
      cache: NoteCache::new(options.freshness),
      events: EventBus::default(),
      options,
    }
  }

  pub fn remote(&self) -> &R {
    &self.remote
  }

  pub fn local(&self) -> &LocalNotes<K> {
    &self.local
  }

  /// Subscribe to change, offline-save and sync notifications.
  pub fn subscribe(&self) -> broadcast::Receiver<NoteEvent> {
    self.events.subscribe()
  }

  /// List the owner's notes, newest first.
  ///
  /// Pending local notes are listed ahead of server notes.
  pub async fn get_all(&self, owner: &OwnerId, force_refresh: bool) -> Listing {
    if !force_refresh {
      if let Some(notes) = self.cache.get_fresh(owner) {
        tracing::debug!(owner = %owner, "using cached notes");
        return Listing::new(notes, ListingSource::Cache);
      }
    }

    match self.remote.list_notes(owner, self.options.list_limit).await {
      Ok(remote) => {
        let notes = self.local.backup(owner, &remote);
        self.cache.put(owner, notes.clone());
        Listing::new(notes, ListingSource::Remote)
      }
      Err(e) => {
        tracing::warn!(owner = %owner, "failed to fetch notes: {}", e);

        if let Some(notes) = self.cache.get_stale(owner) {
          tracing::info!(owner = %owner, "using expired cache due to API error");
          return Listing::new(notes, ListingSource::StaleCache);
        }

        tracing::info!(owner = %owner, "falling back to local store");
        Listing::new(self.local.list(owner), ListingSource::LocalStore)
      }
    }
  }

  /// Save a note, remotely when possible and locally otherwise.
  ///
  /// Fails only with [`crate::NoteError::Validation`] for empty content.
  pub async fn save(&self, owner: &OwnerId, content: &str) -> NoteResult<Note> {
    let content = validate_content(content)?;

    if !self.remote.probe(self.options.probe_timeout).await {
      tracing::info!(owner = %owner, "server unreachable, saving note locally");
      return Ok(self.save_locally(owner, content));
    }

    match self.remote.create_note(owner, content).await {
      Ok(mut created) => {
        self.cache.invalidate();

        if let Some(warning) = created.warning.take() {
          tracing::warn!(owner = %owner, note = %created.note.id, "server warning: {}", warning);
          self.events.emit(NoteEvent::RemoteWarning {
            owner: owner.clone(),
            message: warning,
          });
        }

        // The server may itself fall back to a local-only note. Its id comes
        // from the server clock, so re-tag it before it joins the pending list.
        if !created.is_confirmed() {
          created.note.id = NoteId::new_local();
          self.local.append(owner, &created.note);
        }

        tracing::info!(owner = %owner, note = %created.note.id, "note saved");
        self.events.emit(NoteEvent::NotesChanged {
          owner: owner.clone(),
        });
        Ok(created.note)
      }
      Err(e) => {
        tracing::warn!(owner = %owner, "failed to save note remotely: {}", e);
        Ok(self.save_locally(owner, content))
      }
    }
  }

  fn save_locally(&self, owner: &OwnerId, content: &str) -> Note {
    let note = Note::new_local(owner, content);
    self.local.append(owner, &note);
    self.cache.invalidate();

    tracing::info!(owner = %owner, note = %note.id, "created local fallback note");
    self.events.emit(NoteEvent::SavedLocally {
      owner: owner.clone(),
      id: note.id.clone(),
    });
    self.events.emit(NoteEvent::NotesChanged {
      owner: owner.clone(),
    });
    note
  }

  /// Delete a note. Always reports success: a note the server no longer has
  /// is already gone.
  pub async fn delete(&self, owner: &OwnerId, id: &NoteId) -> bool {
    if id.is_local() {
      tracing::debug!(owner = %owner, note = %id, "deleting local note from storage only");
    } else {
      match self.remote.delete_note(owner, id).await {
        Ok(RemoteDelete::Deleted) => {
          tracing::info!(owner = %owner, note = %id, "note deleted");
        }
        Ok(RemoteDelete::NotFoundOrForbidden) => {
          tracing::warn!(owner = %owner, note = %id, "note not found or not owned, treating as deleted");
        }
        Err(e) => {
          tracing::warn!(owner = %owner, note = %id, "failed to delete note remotely: {}", e);
        }
      }
    }

    self.local.remove(owner, id);
    self.cache.invalidate();
    self.events.emit(NoteEvent::NotesChanged {
      owner: owner.clone(),
    });
    true
  }

  /// Push the owner's local-tagged notes to the server.
  pub async fn sync_pending(&self, owner: &OwnerId) -> SyncReport {
    let report = SyncCoordinator::new(&self.remote, &self.local, self.options.probe_timeout)
      .run(owner)
      .await;

    if report.synced > 0 {
      self.cache.invalidate();
    }

    if report.pending > 0 {
      self.events.emit(NoteEvent::SyncCompleted {
        owner: owner.clone(),
        synced: report.synced,
        pending: report.pending,
      });
    }

    if report.synced > 0 {
      self.events.emit(NoteEvent::NotesChanged {
        owner: owner.clone(),
      });
    }

    report
  }
}
