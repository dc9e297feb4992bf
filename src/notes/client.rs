use reqwest::header::CACHE_CONTROL;
use reqwest::{Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::config::ServerConfig;
use crate::error::{NoteError, NoteResult};

use super::api_types::{ApiCreateNote, ApiError, ApiNote};
use super::types::{Note, NoteId, OwnerId};

/// A note returned by the create endpoint.
#[derive(Debug, Clone)]
pub struct CreatedNote {
  pub note: Note,
  /// Set when the server could not persist the note and kept it local-only
  pub warning: Option<String>,
}

impl CreatedNote {
  /// Whether the server actually persisted the note under a server identifier.
  pub fn is_confirmed(&self) -> bool {
    !self.note.id.is_local()
  }
}

/// Outcome of a remote delete that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDelete {
  Deleted,
  /// The server has no such note for this owner (already gone or not owned)
  NotFoundOrForbidden,
}

/// Operations against the remote notes service.
pub trait RemoteNotes: Send + Sync {
  /// List the owner's notes, newest first.
  fn list_notes(
    &self,
    owner: &OwnerId,
    limit: usize,
  ) -> impl Future<Output = NoteResult<Vec<Note>>> + Send;

  /// Create a note; the server assigns identifier and timestamp.
  fn create_note(
    &self,
    owner: &OwnerId,
    content: &str,
  ) -> impl Future<Output = NoteResult<CreatedNote>> + Send;

  /// Delete a server-backed note. Local-tagged identifiers never reach the server.
  fn delete_note(
    &self,
    owner: &OwnerId,
    id: &NoteId,
  ) -> impl Future<Output = NoteResult<RemoteDelete>> + Send;

  /// Cheap liveness check bounded by `timeout`.
  fn probe(&self, timeout: Duration) -> impl Future<Output = bool> + Send;
}

/// Notes API client over HTTP
#[derive(Clone)]
pub struct HttpNoteClient {
  http: reqwest::Client,
  base: Url,
  session_token: Option<String>,
}

impl HttpNoteClient {
  pub fn new(config: &ServerConfig, session_token: Option<String>) -> color_eyre::Result<Self> {
    let mut base = Url::parse(&config.url)
      .map_err(|e| color_eyre::eyre::eyre!("Invalid server url {}: {}", config.url, e))?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("vnotes/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      session_token,
    })
  }

  fn endpoint(&self, path: &str) -> NoteResult<Url> {
    self
      .base
      .join(path)
      .map_err(|e| NoteError::RemoteUnavailable(format!("invalid endpoint {}: {}", path, e)))
  }

  fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.session_token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  /// Turn a non-success status into `RemoteUnavailable`, keeping the server's
  /// error message when it sent one.
  async fn unavailable(response: Response) -> NoteError {
    let status = response.status();
    let body: ApiError = response.json().await.unwrap_or_default();
    if body.error.is_empty() {
      NoteError::RemoteUnavailable(format!("HTTP {}", status))
    } else {
      NoteError::RemoteUnavailable(format!("HTTP {}: {}", status, body.describe()))
    }
  }
}

impl RemoteNotes for HttpNoteClient {
  async fn list_notes(&self, owner: &OwnerId, limit: usize) -> NoteResult<Vec<Note>> {
    let mut url = self.endpoint("api/notes")?;
    url
      .query_pairs_mut()
      .append_pair("limit", &limit.to_string());

    let response = self.authorize(self.http.get(url)).send().await?;
    if !response.status().is_success() {
      return Err(Self::unavailable(response).await);
    }

    let records: Vec<ApiNote> = response.json().await?;
    let total = records.len();

    let notes: Vec<Note> = records
      .into_iter()
      .filter_map(|record| match record.into_note(owner) {
        Ok(note) => Some(note),
        Err(e) => {
          tracing::warn!(owner = %owner, "dropping note from listing: {}", e);
          None
        }
      })
      .collect();

    tracing::debug!(owner = %owner, total, kept = notes.len(), "fetched notes");
    Ok(notes)
  }

  async fn create_note(&self, owner: &OwnerId, content: &str) -> NoteResult<CreatedNote> {
    let url = self.endpoint("api/notes")?;

    let response = self
      .authorize(self.http.post(url))
      .json(&ApiCreateNote { content })
      .send()
      .await?;
    if !response.status().is_success() {
      return Err(Self::unavailable(response).await);
    }

    let mut record: ApiNote = response.json().await?;
    let warning = record.warning.take();
    let note = record.into_note(owner)?;

    Ok(CreatedNote { note, warning })
  }

  async fn delete_note(&self, owner: &OwnerId, id: &NoteId) -> NoteResult<RemoteDelete> {
    if id.is_local() {
      tracing::debug!(note = %id, "not sending delete for local-tagged note");
      return Ok(RemoteDelete::NotFoundOrForbidden);
    }

    let mut url = self.endpoint("api/notes")?;
    url.query_pairs_mut().append_pair("id", id.as_str());

    let response = self.authorize(self.http.delete(url)).send().await?;
    match response.status() {
      status if status.is_success() => Ok(RemoteDelete::Deleted),
      StatusCode::NOT_FOUND => {
        tracing::debug!(owner = %owner, note = %id, "server reports note missing or not owned");
        Ok(RemoteDelete::NotFoundOrForbidden)
      }
      _ => Err(Self::unavailable(response).await),
    }
  }

  async fn probe(&self, timeout: Duration) -> bool {
    let url = match self.endpoint("api/ping") {
      Ok(url) => url,
      Err(_) => return false,
    };

    match self
      .http
      .head(url)
      .header(CACHE_CONTROL, "no-store")
      .timeout(timeout)
      .send()
      .await
    {
      Ok(response) => response.status().is_success(),
      Err(e) => {
        tracing::debug!("reachability probe failed: {}", e);
        false
      }
    }
  }
}
