use crate::app::NoteService;
use crate::backends::{MemoryBackend, SqliteBackend};
use crate::{NoteBackend, Result};

use clap::{ArgAction, Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "notes.db";
const DB_PATH_VAR: &str = "NOTES_DB";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// More log output: -v debug, -vv trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// SQLite database file
    #[arg(short, long, env = DB_PATH_VAR, default_value = DEFAULT_DB_PATH, global = true)]
    path: PathBuf,
    /// Where to keep notes. Defaults to the SQLite file
    #[command(subcommand)]
    backend: Option<BackendKind>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    /// Store notes in a SQLite database file
    Sqlite,
    /// Keep notes in memory for this session only
    Memory,
}

/// Backend selected on the command line, with everything needed to open it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Sqlite { path: PathBuf },
    Memory,
}

impl Args {
    /// Log level chosen by the number of `-v` flags
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// The selected backend, falling back to the default `SQLite` file
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self.backend.unwrap_or(BackendKind::Sqlite) {
            BackendKind::Sqlite => Backend::Sqlite {
                path: self.path.clone(),
            },
            BackendKind::Memory => Backend::Memory,
        }
    }

    /// Opens the selected backend and wraps it in a `NoteService`.
    ///
    /// # Errors
    ///
    /// Forwards any error from opening or initializing the backend. Callers treat it as fatal
    pub fn open_service(&self) -> Result<NoteService> {
        // Allow any struct that implements NoteBackend, and store on heap because size is unknown at compile time
        let repo: Box<dyn NoteBackend> = match self.backend() {
            Backend::Sqlite { path } => {
                info!("Using SQLite database: {}", path.display());
                Box::new(SqliteBackend::new(&path)?)
            }
            Backend::Memory => {
                info!("Using in-memory store, notes are discarded on exit");
                Box::new(MemoryBackend::new())
            }
        };
        Ok(NoteService::new(repo))
    }
}

/// Loads `.env` from the working directory if present, then parses the command line
#[must_use]
pub fn parse() -> Args {
    // A missing .env file is fine
    let _ = dotenv::dotenv();
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_level() {
        let quiet = Args::try_parse_from(["notekeep"]).unwrap();
        assert_eq!(quiet.log_level(), LevelFilter::Info);

        let chatty = Args::try_parse_from(["notekeep", "-v", "memory"]).unwrap();
        assert_eq!(chatty.log_level(), LevelFilter::Debug);
        assert_eq!(chatty.backend(), Backend::Memory);

        let loud = Args::try_parse_from(["notekeep", "memory", "-vvv"]).unwrap();
        assert_eq!(loud.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn sqlite_path_is_taken_from_flag() {
        let args = Args::try_parse_from(["notekeep", "sqlite", "--path", "/tmp/mine.db"]).unwrap();
        assert_eq!(
            args.backend(),
            Backend::Sqlite {
                path: PathBuf::from("/tmp/mine.db")
            }
        );
    }

    #[test]
    fn path_applies_without_subcommand() {
        let args = Args::try_parse_from(["notekeep", "--path", "/tmp/other.db"]).unwrap();
        assert_eq!(
            args.backend(),
            Backend::Sqlite {
                path: PathBuf::from("/tmp/other.db")
            }
        );
    }

    #[test]
    fn unopenable_database_is_returned_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("missing").join("notes.db");
        let args =
            Args::try_parse_from(["notekeep", "--path", bad.to_str().unwrap()]).unwrap();

        assert!(matches!(
            args.open_service(),
            Err(crate::NoteError::Backend(_))
        ));
    }

    #[test]
    fn memory_backend_opens_empty_service() {
        let args = Args::try_parse_from(["notekeep", "memory"]).unwrap();
        let service = args.open_service().unwrap();
        assert!(service.list_notes().unwrap().is_empty());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Args::try_parse_from(["notekeep", "postgres"]).is_err());
    }
}
