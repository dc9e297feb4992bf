use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{NoteError, NoteResult};

/// Prefix marking identifiers the server has never confirmed.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Owner used when no session is present.
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Last timestamp handed out by [`NoteId::new_local`].
static LAST_LOCAL_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Identity that partitions notes, cache entries and local storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// Map the session provider's identity onto an owner, falling back to the
  /// anonymous sentinel when signed out.
  pub fn from_session(identity: Option<&str>) -> Self {
    match identity.map(str::trim) {
      Some(id) if !id.is_empty() => Self(id.to_string()),
      _ => Self::anonymous(),
    }
  }

  pub fn anonymous() -> Self {
    Self(ANONYMOUS_OWNER.to_string())
  }

  pub fn is_anonymous(&self) -> bool {
    self.0 == ANONYMOUS_OWNER
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Note identifier, either server-assigned or local-tagged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// Generate a fresh local identifier (`local-<unix millis>`).
  ///
  /// Timestamps are bumped when needed so identifiers stay unique within the
  /// process even for notes created in the same millisecond.
  pub fn new_local() -> Self {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_LOCAL_MILLIS.load(Ordering::Relaxed);
    let millis = loop {
      let candidate = now.max(last + 1);
      match LAST_LOCAL_MILLIS.compare_exchange_weak(
        last,
        candidate,
        Ordering::SeqCst,
        Ordering::Relaxed,
      ) {
        Ok(_) => break candidate,
        Err(actual) => last = actual,
      }
    };
    Self(format!("{}{}", LOCAL_ID_PREFIX, millis))
  }

  pub fn is_local(&self) -> bool {
    self.0.starts_with(LOCAL_ID_PREFIX)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for NoteId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for NoteId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

/// A user-authored text note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
  pub id: NoteId,
  pub content: String,
  pub created_at: DateTime<Utc>,
  pub owner: OwnerId,
}

impl Note {
  /// Build a local-tagged note from already validated content.
  pub fn new_local(owner: &OwnerId, content: &str) -> Self {
    Self {
      id: NoteId::new_local(),
      content: content.trim().to_string(),
      created_at: Utc::now(),
      owner: owner.clone(),
    }
  }

  pub fn is_local(&self) -> bool {
    self.id.is_local()
  }
}

/// Trim note content, rejecting empty or whitespace-only text.
pub fn validate_content(content: &str) -> NoteResult<&str> {
  let trimmed = content.trim();
  if trimmed.is_empty() {
    return Err(NoteError::Validation);
  }
  Ok(trimmed)
}
