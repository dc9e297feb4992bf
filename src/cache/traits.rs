//! Result types describing where a listing came from.

use crate::notes::Note;

/// A note listing together with its source.
#[derive(Debug, Clone)]
pub struct Listing {
  /// Notes, newest first
  pub notes: Vec<Note>,
  /// Where the notes came from
  pub source: ListingSource,
}

impl Listing {
  pub fn new(notes: Vec<Note>, source: ListingSource) -> Self {
    Self { notes, source }
  }

  /// Whether the remote service could not be reached for this listing.
  pub fn is_offline(&self) -> bool {
    matches!(
      self.source,
      ListingSource::StaleCache | ListingSource::LocalStore
    )
  }
}

/// Indicates where listed notes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
  /// In-memory cache, still inside the freshness window
  Cache,
  /// Fresh data from the notes API
  Remote,
  /// Offline mode - expired cache served because the API failed
  StaleCache,
  /// Offline mode - nothing cached, served from the local store
  LocalStore,
}
