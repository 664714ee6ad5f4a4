use super::{contains_ignore_case, BackendError, Note, NoteBackend, NoteError, Result};
use log::{debug, trace};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, Error as SqliteError, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const SELECT_NOTE: &str = "SELECT id, title, content FROM notes";

/// Note storage in a single `SQLite` file.
///
/// Holds one connection. `Connection` is not `Sync`, so a backend can only be
/// driven from one thread and writes are naturally serialized.
#[derive(Debug)]
pub struct SqliteBackend {
    connection: Connection,
}

impl SqliteBackend {
    /// Opens (or creates) the `SQLite` database at the given path and makes sure
    /// the `notes` table exists.
    ///
    /// # Errors
    ///
    /// `BackendError::DatabaseCreationError` if the database file cannot be opened
    /// `BackendError::TableCreationError` if the `notes` table cannot be created.
    pub fn new(path: &Path) -> Result<Self> {
        let connection = Connection::open(path).map_err(|source| {
            NoteError::Backend(BackendError::DatabaseCreationError {
                path: path.display().to_string(),
                source,
            })
        })?;
        debug!("Opened connection to db: {}", path.display());
        Self::with_connection(connection)
    }

    /// Opens a private in-memory database. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Same as [`SqliteBackend::new`]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(|source| {
            NoteError::Backend(BackendError::DatabaseCreationError {
                path: ":memory:".to_string(),
                source,
            })
        })?;
        debug!("Opened in-memory db");
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        // Every autocommit write is synced to disk before execute() returns
        connection
            .pragma_update(None, "synchronous", "FULL")
            .map_err(map_sqlite_error)?;

        // SQLite's own lower() only folds ASCII, so search goes through Rust instead
        connection
            .create_scalar_function(
                "contains_ci",
                2,
                FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
                |ctx| {
                    let haystack = ctx.get::<String>(0)?;
                    let needle = ctx.get::<String>(1)?;
                    Ok(contains_ignore_case(&haystack, &needle))
                },
            )
            .map_err(map_sqlite_error)?;

        let backend = Self { connection };
        backend.initialize()?;
        Ok(backend)
    }
}

/// Maps a `rusqlite::Error` into a `NoteError`, wrapping known SQLite-specific codes into domain-specific variants.
///
/// This function is used internally by all database operations.
///
/// # Errors
///
/// Always returns a `NoteError::Backend` variant. Specific known `SQLite` error codes
/// are converted to more descriptive errors; all others are wrapped in `BackendError::Other`.
fn map_sqlite_error(e: rusqlite::Error) -> NoteError {
    match e {
        SqliteError::SqliteFailure(code, _) => match code.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                NoteError::Backend(BackendError::DatabaseBusy)
            }
            ErrorCode::ReadOnly => NoteError::Backend(BackendError::ReadOnly),
            ErrorCode::DiskFull => NoteError::Backend(BackendError::DiskFull),
            ErrorCode::DatabaseCorrupt | ErrorCode::SystemIoFailure => {
                NoteError::Backend(BackendError::DatabaseCorruptOrIo)
            }
            ErrorCode::PermissionDenied | ErrorCode::CannotOpen => {
                NoteError::Backend(BackendError::PermissionDenied)
            }
            ErrorCode::NotADatabase => NoteError::Backend(BackendError::NotADatabase),
            _ => NoteError::Backend(BackendError::Other(anyhow::anyhow!(
                "SQLite error: {:?}",
                code
            ))),
        },
        other => NoteError::Backend(BackendError::Other(anyhow::Error::new(other))),
    }
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
    })
}

impl SqliteBackend {
    fn query_notes(&self, sql: &str, query: Option<&str>) -> Result<Vec<Note>> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(map_sqlite_error)?;

        let notes_iter = match query {
            Some(q) => stmt.query_map(params![q], note_from_row),
            None => stmt.query_map([], note_from_row),
        }
        .map_err(map_sqlite_error)?;

        notes_iter
            .collect::<std::result::Result<_, _>>()
            .map_err(map_sqlite_error)
    }
}

impl NoteBackend for SqliteBackend {
    /// Creates the `notes` table if it doesn't exist.
    ///
    /// `AUTOINCREMENT` keeps SQLite from handing out the ID of a deleted row again.
    ///
    /// # Errors
    ///
    /// `BackendError::TableCreationError` if the statement fails
    fn initialize(&self) -> Result<()> {
        self.connection
            .execute(
                "
                CREATE TABLE IF NOT EXISTS notes (
                    id      INTEGER PRIMARY KEY AUTOINCREMENT,
                    title   TEXT NOT NULL,
                    content TEXT NOT NULL
                )
                ",
                [],
            )
            .map_err(|e| NoteError::Backend(BackendError::TableCreationError(e)))?;
        debug!("Initialized db with `notes` table");
        Ok(())
    }

    /// Inserts a new note into the `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `BackendError::DatabaseBusy`, `ReadOnly`, `DiskFull`, or other mapped SQLite-specific errors.
    /// - `BackendError::Other` if an unknown `SQLite` error occurs.
    fn create(&self, title: &str, content: &str) -> Result<i64> {
        self.connection
            .execute(
                "INSERT INTO notes (title, content) VALUES (?1, ?2)",
                params![title, content],
            )
            .map_err(map_sqlite_error)?;
        let id = self.connection.last_insert_rowid();
        trace!("Created row #{id} with title: {title:?}");
        Ok(id)
    }

    /// Reads a note by ID.
    ///
    /// # Errors
    ///
    /// Returns mapped `SQLite` errors for query failure. A missing note is `Ok(None)`.
    fn read(&self, id: i64) -> Result<Option<Note>> {
        self.connection
            .query_row(
                &format!("{SELECT_NOTE} WHERE id = ?1"),
                params![id],
                note_from_row,
            )
            .optional()
            .map_err(map_sqlite_error)
    }

    /// Updates an existing note's title and content.
    ///
    /// # Errors
    ///
    /// Returns backend errors if the update fails due to `SQLite` issues.
    fn update(&self, id: i64, title: &str, content: &str) -> Result<bool> {
        let rows = self
            .connection
            .execute(
                "UPDATE notes SET title = ?1, content = ?2 WHERE id = ?3",
                params![title, content, id],
            )
            .map_err(map_sqlite_error)?;
        trace!("Updated {rows} row(s) with ID: {id}");
        Ok(rows > 0)
    }

    /// Deletes a note by ID from the database.
    ///
    /// # Errors
    ///
    /// Returns backend errors if the deletion fails.
    fn delete(&self, id: i64) -> Result<bool> {
        let rows = self
            .connection
            .execute("DELETE FROM notes WHERE id = ?1", params![id])
            .map_err(map_sqlite_error)?;
        trace!("Deleted {rows} row(s) with ID: {id}");
        Ok(rows > 0)
    }

    /// Returns a list of all notes in the database, sorted by ID.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the query fails or the data cannot be retrieved.
    fn list(&self) -> Result<Vec<Note>> {
        self.query_notes(&format!("{SELECT_NOTE} ORDER BY id ASC"), None)
    }

    /// Case-insensitive substring search over title and content.
    ///
    /// Uses the `contains_ci` function registered on open rather than `LIKE`, so
    /// non-ASCII letters are folded too and `%` and `_` in the query are matched literally.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the query fails.
    fn search(&self, query: &str) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "{SELECT_NOTE}
                 WHERE contains_ci(title, ?1) OR contains_ci(content, ?1)
                 ORDER BY id ASC"
            ),
            Some(query),
        )
    }
}
