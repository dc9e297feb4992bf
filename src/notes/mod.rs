//! Notes domain: types, the remote client, the facade and background sync.

pub mod api_types;
pub mod client;
pub mod facade;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{CreatedNote, HttpNoteClient, RemoteDelete, RemoteNotes};
pub use facade::{FacadeOptions, NoteFacade};
pub use sync::{spawn_session_sync, SyncCoordinator, SyncReport};
pub use types::{validate_content, Note, NoteId, OwnerId, ANONYMOUS_OWNER, LOCAL_ID_PREFIX};
