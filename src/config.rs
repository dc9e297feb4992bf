use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notes::OwnerId;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Signed-in identity (email). Notes are kept under "anonymous" when unset.
  pub user: Option<String>,
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_url")]
  pub url: String,
  /// Hard timeout for the reachability probe
  #[serde(default = "default_probe_timeout_ms")]
  pub probe_timeout_ms: u64,
  /// Maximum number of notes requested per listing
  #[serde(default = "default_list_limit")]
  pub list_limit: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      url: default_url(),
      probe_timeout_ms: default_probe_timeout_ms(),
      list_limit: default_list_limit(),
    }
  }
}

impl ServerConfig {
  pub fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.probe_timeout_ms)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Freshness window for the in-memory listing cache
  #[serde(default = "default_freshness_secs")]
  pub freshness_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      freshness_secs: default_freshness_secs(),
    }
  }
}

impl CacheConfig {
  pub fn freshness(&self) -> Duration {
    Duration::from_secs(self.freshness_secs)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// Database file for the local note store (default: data dir)
  pub path: Option<PathBuf>,
}

fn default_url() -> String {
  "http://localhost:3000".to_string()
}

fn default_probe_timeout_ms() -> u64 {
  2000
}

fn default_list_limit() -> usize {
  50
}

fn default_freshness_secs() -> u64 {
  300
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./vnotes.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/vnotes/config.yaml
  ///
  /// Falls back to defaults when no file exists. `VNOTES_USER` overrides the
  /// configured user.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => {
        tracing::debug!("no configuration file found, using defaults");
        Self::default()
      }
    };

    if let Ok(user) = std::env::var("VNOTES_USER") {
      config.user = Some(user);
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("vnotes.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("vnotes").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.server.list_limit == 0 {
      return Err(eyre!("server.list_limit must be at least 1"));
    }
    Ok(config)
  }

  /// Owner identity for every facade call.
  pub fn owner(&self) -> OwnerId {
    OwnerId::from_session(self.user.as_deref())
  }

  /// Get the session token from the environment, if signed in.
  pub fn get_session_token() -> Option<String> {
    std::env::var("VNOTES_SESSION_TOKEN")
      .ok()
      .filter(|t| !t.is_empty())
  }

  /// Directory for the local database and log files.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("vnotes"))
  }

  /// Path of the local note database.
  pub fn storage_path(&self) -> Result<PathBuf> {
    match &self.storage.path {
      Some(p) => Ok(p.clone()),
      None => Ok(Self::data_dir()?.join("notes.db")),
    }
  }
}
