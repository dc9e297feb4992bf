//! Serde types matching the notes API wire format.
//!
//! These types are separate from domain types so the loose server shape
//! (`_id` vs `id`, optional owner, `_warning`) stays out of the rest of the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NoteError, NoteResult};

use super::types::{Note, NoteId, OwnerId};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiCreateNote<'a> {
  pub content: &'a str,
}

// ============================================================================
// Responses
// ============================================================================

/// Note object as returned by `GET` and `POST /api/notes`.
#[derive(Debug, Deserialize)]
pub struct ApiNote {
  pub id: Option<String>,
  #[serde(rename = "_id")]
  pub object_id: Option<String>,
  pub content: String,
  pub created_at: DateTime<Utc>,
  pub user_id: Option<String>,
  /// Present when the server itself fell back to a local-only save
  #[serde(rename = "_warning")]
  pub warning: Option<String>,
}

impl ApiNote {
  fn identifier(&self) -> Option<&str> {
    self
      .id
      .as_deref()
      .or(self.object_id.as_deref())
      .filter(|id| !id.is_empty())
  }

  /// Owner recorded by the server, if any.
  pub fn owner(&self) -> Option<&str> {
    self.user_id.as_deref()
  }

  /// Convert into a domain note owned by `owner`.
  ///
  /// Records without an identifier or owned by someone else violate the API
  /// contract and are rejected.
  pub fn into_note(self, owner: &OwnerId) -> NoteResult<Note> {
    let id = self
      .identifier()
      .map(NoteId::new)
      .ok_or_else(|| NoteError::MalformedResponse("note without identifier".to_string()))?;

    if let Some(user_id) = self.owner() {
      if user_id != owner.as_str() {
        return Err(NoteError::MalformedResponse(format!(
          "note {} belongs to another owner",
          id
        )));
      }
    }

    Ok(Note {
      id,
      content: self.content,
      created_at: self.created_at,
      owner: owner.clone(),
    })
  }
}

/// Body of a failed request, e.g. `{ "error": "...", "details": "..." }`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
  #[serde(default)]
  pub error: String,
  pub details: Option<String>,
}

impl ApiError {
  pub fn describe(&self) -> String {
    match &self.details {
      Some(details) => format!("{} ({})", self.error, details),
      None => self.error.clone(),
    }
  }
}
