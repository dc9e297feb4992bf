//! Promotion of locally created notes to the remote service.
//!
//! Notes are migrated one at a time, oldest first. Each note is independently
//! either migrated or still pending, so an interrupted pass leaves a
//! consistent store. If a note is created remotely but its local copy cannot
//! be removed, a later pass creates it again.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::{KeyValueStore, LocalNotes};

use super::client::RemoteNotes;
use super::facade::NoteFacade;
use super::types::{Note, OwnerId};

/// Aggregate outcome of a sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
  /// Whether the probe found the server
  pub reachable: bool,
  /// Local-tagged notes found at the start of the pass
  pub pending: usize,
  pub synced: usize,
  pub failed: usize,
}

impl SyncReport {
  fn unreachable() -> Self {
    Self::default()
  }
}

pub struct SyncCoordinator<'a, R: RemoteNotes, K: KeyValueStore> {
  remote: &'a R,
  local: &'a LocalNotes<K>,
  probe_timeout: Duration,
}

impl<'a, R: RemoteNotes, K: KeyValueStore> SyncCoordinator<'a, R, K> {
  pub fn new(remote: &'a R, local: &'a LocalNotes<K>, probe_timeout: Duration) -> Self {
    Self {
      remote,
      local,
      probe_timeout,
    }
  }

  /// Run one pass for `owner`. Never fails; problems are logged and counted.
  pub async fn run(&self, owner: &OwnerId) -> SyncReport {
    if !self.remote.probe(self.probe_timeout).await {
      tracing::info!(owner = %owner, "server unreachable, skipping sync");
      return SyncReport::unreachable();
    }

    // Stored newest first
    let mut pending = self.local.pending(owner);
    pending.reverse();

    let mut report = SyncReport {
      reachable: true,
      pending: pending.len(),
      ..SyncReport::default()
    };

    if pending.is_empty() {
      tracing::debug!(owner = %owner, "no local notes to sync");
      return report;
    }

    tracing::info!(owner = %owner, count = pending.len(), "syncing local notes");

    for note in &pending {
      if self.promote(owner, note).await {
        report.synced += 1;
      } else {
        report.failed += 1;
      }
    }

    tracing::info!(
      owner = %owner,
      synced = report.synced,
      failed = report.failed,
      "sync finished"
    );
    report
  }

  async fn promote(&self, owner: &OwnerId, note: &Note) -> bool {
    match self.remote.create_note(owner, &note.content).await {
      Ok(created) if created.is_confirmed() => {
        tracing::debug!(local = %note.id, server = %created.note.id, "promoted note");
        self.local.remove(owner, &note.id);
        true
      }
      Ok(created) => {
        tracing::warn!(
          local = %note.id,
          warning = created.warning.as_deref().unwrap_or_default(),
          "server kept note local-only, will retry"
        );
        false
      }
      Err(e) => {
        tracing::warn!(local = %note.id, "failed to sync note: {}", e);
        false
      }
    }
  }
}

/// Sync on start-up and whenever a session appears.
///
/// The task ends when the session sender is dropped.
pub fn spawn_session_sync<R, K>(
  facade: Arc<NoteFacade<R, K>>,
  mut session: watch::Receiver<Option<String>>,
) -> JoinHandle<()>
where
  R: RemoteNotes + 'static,
  K: KeyValueStore + 'static,
{
  tokio::spawn(async move {
    let mut initial = true;
    loop {
      let identity = session.borrow_and_update().clone();
      if initial || identity.is_some() {
        let owner = OwnerId::from_session(identity.as_deref());
        facade.sync_pending(&owner).await;
      }
      initial = false;

      if session.changed().await.is_err() {
        break;
      }
    }
  })
}
