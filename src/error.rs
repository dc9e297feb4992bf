//! Error taxonomy for note operations.

use thiserror::Error;

/// Failures produced by the note client, local store and facade.
///
/// Only [`NoteError::Validation`] is ever returned to callers of the facade;
/// the remaining variants drive fallback decisions and logging.
#[derive(Debug, Error)]
pub enum NoteError {
  /// Rejected input, e.g. empty note content. Never retried.
  #[error("note content must not be empty")]
  Validation,

  /// Network failure or non-success status from the notes API.
  #[error("remote note service unavailable: {0}")]
  RemoteUnavailable(String),

  /// Local persistence failed (quota, I/O, serialization).
  #[error("local storage failure: {0}")]
  Storage(String),

  /// The notes API answered with a body that does not match its contract.
  #[error("malformed response from note service: {0}")]
  MalformedResponse(String),
}

impl From<reqwest::Error> for NoteError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      NoteError::MalformedResponse(e.to_string())
    } else {
      NoteError::RemoteUnavailable(e.to_string())
    }
  }
}

impl From<rusqlite::Error> for NoteError {
  fn from(e: rusqlite::Error) -> Self {
    NoteError::Storage(e.to_string())
  }
}

impl From<serde_json::Error> for NoteError {
  fn from(e: serde_json::Error) -> Self {
    NoteError::Storage(format!("serialization failed: {}", e))
  }
}

pub type NoteResult<T> = std::result::Result<T, NoteError>;
