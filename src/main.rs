use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Read;
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::TryRecvError};

use vnotes::cache::{Listing, SqliteStore};
use vnotes::config::Config;
use vnotes::event::NoteEvent;
use vnotes::logging;
use vnotes::notes::{FacadeOptions, HttpNoteClient, NoteFacade, NoteId, RemoteNotes};

#[derive(Parser, Debug)]
#[command(name = "vnotes")]
#[command(about = "Voice note client that keeps working offline")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/vnotes/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Signed-in identity (overrides the config file and VNOTES_USER)
  #[arg(short, long)]
  user: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List notes, newest first
  List {
    /// Skip the in-memory cache
    #[arg(long)]
    refresh: bool,
  },
  /// Save a note from TEXT, or from stdin when no text is given
  Add { text: Vec<String> },
  /// Delete a note by identifier
  Delete { id: String },
  /// Push notes saved while offline to the server
  Sync,
  /// Check whether the server is reachable
  Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init(&Config::data_dir()?.join("logs"))?;

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(user) = args.user {
    config.user = Some(user);
  }

  let owner = config.owner();
  let remote = HttpNoteClient::new(&config.server, Config::get_session_token())?;
  let store = open_store(&config)?;
  let facade = NoteFacade::new(remote, store, FacadeOptions::from_config(&config));
  let mut events = facade.subscribe();

  tracing::info!(owner = %owner, command = ?args.command, "starting");

  match args.command {
    Command::List { refresh } => {
      facade.sync_pending(&owner).await;
      let listing = facade.get_all(&owner, refresh).await;
      print_listing(&listing);
    }
    Command::Add { text } => {
      facade.sync_pending(&owner).await;
      let content = read_content(text)?;
      let note = facade.save(&owner, &content).await?;
      println!("{}", note.id);
    }
    Command::Delete { id } => {
      let id = NoteId::new(id);
      facade.delete(&owner, &id).await;
      println!("Deleted {}", id);
    }
    Command::Sync => {
      let report = facade.sync_pending(&owner).await;
      if !report.reachable {
        eprintln!("Server unreachable, {} will sync later", owner);
      } else if report.pending == 0 {
        eprintln!("No local notes to sync");
      }
    }
    Command::Ping => {
      let reachable = facade
        .remote()
        .probe(config.server.probe_timeout())
        .await;
      println!("{}", if reachable { "online" } else { "offline" });
    }
  }

  print_events(&mut events);
  Ok(())
}

/// Open the configured store, degrading to an in-memory one when the file
/// cannot be used.
fn open_store(config: &Config) -> Result<SqliteStore> {
  let path = config.storage_path()?;
  match SqliteStore::open(&path) {
    Ok(store) => Ok(store),
    Err(e) => {
      tracing::warn!("local store unavailable, notes will not persist: {}", e);
      eprintln!("Warning: {}", e);
      Ok(SqliteStore::open_in_memory()?)
    }
  }
}

fn read_content(text: Vec<String>) -> Result<String> {
  if !text.is_empty() {
    return Ok(text.join(" "));
  }

  let mut content = String::new();
  std::io::stdin()
    .read_to_string(&mut content)
    .map_err(|e| eyre!("Failed to read note from stdin: {}", e))?;
  Ok(content)
}

fn print_listing(listing: &Listing) {
  if listing.is_offline() {
    eprintln!("Offline: showing saved notes ({:?})", listing.source);
  }

  if listing.notes.is_empty() {
    eprintln!("No notes yet");
    return;
  }

  for note in &listing.notes {
    let created = note.created_at.with_timezone(&chrono::Local);
    let marker = if note.is_local() { "*" } else { " " };
    println!(
      "{}{}  {}  {}",
      marker,
      note.id,
      created.format("%Y-%m-%d %H:%M"),
      note.content
    );
  }
}

/// Print advisories the way a UI would show toasts.
fn print_events(events: &mut broadcast::Receiver<NoteEvent>) {
  loop {
    match events.try_recv() {
      Ok(NoteEvent::NotesChanged { .. }) => {}
      Ok(event) => eprintln!("{}", event),
      Err(TryRecvError::Lagged(_)) => continue,
      Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
    }
  }
}
