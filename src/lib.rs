#![deny(clippy::cargo)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::nursery)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![deny(clippy::suspicious)]
#![deny(clippy::pedantic)]

use std::fmt;
use std::io;
use tabled::Tabled;
use thiserror::Error;

pub mod app;
pub mod backends;
pub mod setup;
pub mod ui;

// More convenient Result type
pub type Result<T> = std::result::Result<T, NoteError>;

/// A single stored note. `id` is assigned by the backend and never changes
#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
}

/// One-line label used when presenting notes as choices
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | Title: {} | Content: {}",
            self.id, self.title, self.content
        )
    }
}

/// Trait to be implemented by all backends that store and retrieve notes
///
/// Backends never validate titles or contents, that is the job of `NoteService`.
/// Every mutating method must be durable by the time it returns.
pub trait NoteBackend {
    /// Makes sure the underlying storage and the `notes` table exist.
    /// Calling it again on an initialized store is a no-op
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be created or opened
    fn initialize(&self) -> Result<()>;

    /// Stores a new note and returns the ID assigned to it
    ///
    /// # Errors
    ///
    /// Returns an error if the note could not be inserted
    fn create(&self, title: &str, content: &str) -> Result<i64>;

    /// Fetches a single note by ID, `None` if no such note exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    fn read(&self, id: i64) -> Result<Option<Note>>;

    /// Replaces title and content of an existing note.
    /// Returns `false` if there was no note with that ID
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    fn update(&self, id: i64, title: &str, content: &str) -> Result<bool>;

    /// Deletes a note by ID. Returns `false` if there was no note with that ID
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails
    fn delete(&self, id: i64) -> Result<bool>;

    /// Returns every note, sorted by ID ascending
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    fn list(&self) -> Result<Vec<Note>>;

    /// Returns notes whose title or content contains `query`, ignoring ASCII case,
    /// sorted by ID ascending
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    fn search(&self, query: &str) -> Result<Vec<Note>>;
}

// Enum for all possible engine errors
#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Validation(#[from] NoteValidationError),

    #[error("Note not found with ID: {0}")]
    NotFound(i64),

    // Storage is unavailable. Fatal at startup, reported per operation afterwards
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Menu(#[from] MenuError),
}

// Enum for all possible menu input errors
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Failed to read from stdin: {0}")]
    StdinReadError(io::Error),

    #[error("Failed writing to stdout")]
    StdoutWriteError(io::Error),

    #[error("Reached end of input")]
    EndOfInput,

    #[error("Couldn't convert '{0}' to a number. Please enter a number 1-6")]
    ParseError(String),

    #[error("Couldn't convert '{0}' to a MenuOption. Please enter a number 1-6")]
    InvalidOption(u8),
}

/// Note field named by validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Title,
    Content,
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Content => write!(f, "content"),
        }
    }
}

// Enum for all possible data and input validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoteValidationError {
    #[error("The {0} cannot be empty")]
    Empty(NoteField),
}

impl NoteValidationError {
    /// The field that failed validation
    #[must_use]
    pub const fn field(&self) -> NoteField {
        match self {
            Self::Empty(field) => *field,
        }
    }
}

// Enum for all possible storage errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed opening database at '{path}'")]
    DatabaseCreationError {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed creating `notes` table in database")]
    TableCreationError(#[source] rusqlite::Error),

    #[error("Database is locked or busy")]
    DatabaseBusy,

    #[error("Database file is read-only")]
    ReadOnly,

    #[error("Disk is full")]
    DiskFull,

    #[error("Database corruption or file I/O error")]
    DatabaseCorruptOrIo,

    #[error("Database file is not a valid SQLite database")]
    NotADatabase,

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("In-memory store is poisoned by an earlier panic")]
    Poisoned,

    #[error(transparent)]
    Other(#[from] anyhow::Error), // Used as fallback
}
