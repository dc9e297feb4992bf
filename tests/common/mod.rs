#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, head};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use vnotes::config::ServerConfig;
use vnotes::notes::HttpNoteClient;

#[derive(Debug, Clone)]
pub struct StoredNote {
  pub id: String,
  pub content: String,
  pub created_at: String,
  pub user_id: String,
}

impl StoredNote {
  fn to_json(&self) -> Value {
    json!({
      "_id": self.id,
      "id": self.id,
      "content": self.content,
      "created_at": self.created_at,
      "user_id": self.user_id,
    })
  }
}

#[derive(Debug)]
pub struct ServerState {
  pub notes: Vec<StoredNote>,
  next_id: u64,
  /// When false every endpoint fails the way a down backend does
  pub online: bool,
  /// Database down: creates succeed with a local id and a warning
  pub degraded: bool,
  /// Listing ignores the session and returns every user's notes
  pub leak_foreign: bool,
  /// Listing returns a body that is not a note array
  pub malformed: bool,
  pub ping_delay: Duration,
  /// `Cache-Control` sent with the most recent ping
  pub ping_cache_control: Option<String>,
  pub list_calls: usize,
  pub create_calls: usize,
  pub delete_calls: usize,
}

impl Default for ServerState {
  fn default() -> Self {
    Self {
      notes: Vec::new(),
      next_id: 0,
      online: true,
      degraded: false,
      leak_foreign: false,
      malformed: false,
      ping_delay: Duration::ZERO,
      ping_cache_control: None,
      list_calls: 0,
      create_calls: 0,
      delete_calls: 0,
    }
  }
}

type Shared = Arc<Mutex<ServerState>>;

/// Notes API double bound to an ephemeral local port.
pub struct FakeServer {
  pub url: String,
  state: Shared,
  shutdown: Option<oneshot::Sender<()>>,
}

impl FakeServer {
  pub async fn start() -> Self {
    let state: Shared = Arc::default();
    let app = Router::new()
      .route(
        "/api/notes",
        get(list_notes).post(create_note).delete(delete_note),
      )
      .route("/api/ping", head(ping))
      .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0")
      .await
      .expect("Failed to bind fake notes server.");
    let addr = listener
      .local_addr()
      .expect("Failed to read fake notes server address.");
    let (tx, rx) = oneshot::channel();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
      let _ = rx.await;
    });

    tokio::spawn(async move {
      let _ = server.await;
    });

    Self {
      url: format!("http://{addr}"),
      state,
      shutdown: Some(tx),
    }
  }

  pub fn state(&self) -> MutexGuard<'_, ServerState> {
    self.state.lock().unwrap()
  }

  pub fn set_online(&self, online: bool) {
    self.state().online = online;
  }

  pub fn notes_of(&self, user: &str) -> Vec<StoredNote> {
    self
      .state()
      .notes
      .iter()
      .filter(|n| n.user_id == user)
      .cloned()
      .collect()
  }

  pub fn insert(&self, user: &str, content: &str) -> StoredNote {
    insert_note(&mut self.state(), user, content)
  }

  pub fn client(&self, session: Option<&str>) -> HttpNoteClient {
    client_for(&self.url, session)
  }
}

impl Drop for FakeServer {
  fn drop(&mut self) {
    if let Some(tx) = self.shutdown.take() {
      let _ = tx.send(());
    }
  }
}

pub fn client_for(url: &str, session: Option<&str>) -> HttpNoteClient {
  let config = ServerConfig {
    url: url.to_string(),
    ..ServerConfig::default()
  };
  HttpNoteClient::new(&config, session.map(String::from)).unwrap()
}

/// URL of a port with nothing listening on it.
pub async fn dead_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{addr}")
}

fn insert_note(state: &mut ServerState, user: &str, content: &str) -> StoredNote {
  state.next_id += 1;
  let note = StoredNote {
    id: format!("{:024x}", state.next_id),
    content: content.trim().to_string(),
    created_at: Utc::now().to_rfc3339(),
    user_id: user.to_string(),
  };
  state.notes.insert(0, note.clone());
  note
}

/// The session provider: bearer token is the signed-in email.
fn session_user(headers: &HeaderMap) -> String {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(String::from)
    .unwrap_or_else(|| "anonymous".to_string())
}

fn backend_down() -> Response {
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(json!({ "error": "Failed to fetch notes", "details": "connection refused" })),
  )
    .into_response()
}

async fn ping(State(state): State<Shared>, headers: HeaderMap) -> Response {
  let (online, delay) = {
    let mut state = state.lock().unwrap();
    state.ping_cache_control = headers
      .get(header::CACHE_CONTROL)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    (state.online, state.ping_delay)
  };
  if !delay.is_zero() {
    tokio::time::sleep(delay).await;
  }
  if online {
    (StatusCode::OK, [(header::CACHE_CONTROL, "no-store")]).into_response()
  } else {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
  }
}

#[derive(Deserialize)]
struct ListParams {
  limit: Option<usize>,
}

async fn list_notes(
  State(state): State<Shared>,
  headers: HeaderMap,
  Query(params): Query<ListParams>,
) -> Response {
  let mut state = state.lock().unwrap();
  state.list_calls += 1;
  if !state.online {
    return backend_down();
  }
  if state.malformed {
    return Json(json!({ "notes": "not an array" })).into_response();
  }

  let user = session_user(&headers);
  let notes: Vec<Value> = state
    .notes
    .iter()
    .filter(|n| state.leak_foreign || n.user_id == user)
    .take(params.limit.unwrap_or(50))
    .map(StoredNote::to_json)
    .collect();
  Json(notes).into_response()
}

async fn create_note(
  State(state): State<Shared>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Response {
  let mut state = state.lock().unwrap();
  state.create_calls += 1;
  if !state.online {
    return backend_down();
  }

  let content = match body.get("content").and_then(Value::as_str) {
    Some(content) => content,
    None => {
      return (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Content is required and must be a string" })),
      )
        .into_response()
    }
  };
  let user = session_user(&headers);

  if state.degraded {
    let id = format!("local-{}", Utc::now().timestamp_millis());
    return Json(json!({
      "_id": id,
      "id": id,
      "content": content.trim(),
      "created_at": Utc::now().to_rfc3339(),
      "user_id": user,
      "_warning": "Note saved locally due to database connection issues",
    }))
    .into_response();
  }

  Json(insert_note(&mut state, &user, content).to_json()).into_response()
}

#[derive(Deserialize)]
struct DeleteParams {
  id: Option<String>,
}

async fn delete_note(
  State(state): State<Shared>,
  headers: HeaderMap,
  Query(params): Query<DeleteParams>,
) -> Response {
  let mut state = state.lock().unwrap();
  state.delete_calls += 1;
  if !state.online {
    return backend_down();
  }

  let Some(id) = params.id else {
    return (StatusCode::BAD_REQUEST, Json(json!({ "error": "ID is required" }))).into_response();
  };
  let user = session_user(&headers);

  let before = state.notes.len();
  state.notes.retain(|n| !(n.id == id && n.user_id == user));
  if state.notes.len() == before {
    return (
      StatusCode::NOT_FOUND,
      Json(json!({ "error": "Note not found or you do not have permission to delete it" })),
    )
      .into_response();
  }

  Json(json!({ "success": true })).into_response()
}
