pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

pub use crate::{BackendError, Note, NoteBackend, NoteError, Result};

/// Substring test used by every backend's search. Lowercases with full Unicode rules
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
