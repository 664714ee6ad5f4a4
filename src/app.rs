use crate::{Note, NoteBackend, NoteError, NoteField, NoteValidationError, Result};
use log::{debug, trace};

/// Domain layer between the menu and a storage backend.
///
/// Holds no state of its own between calls; everything lives in the backend.
pub struct NoteService {
    repo: Box<dyn NoteBackend>,
}

impl NoteService {
    pub fn new(repo: Box<dyn NoteBackend>) -> Self {
        Self { repo }
    }

    // Create a new note from untrimmed input
    pub fn add_note(&self, title: &str, content: &str) -> Result<Note> {
        let title = Self::validate_title(title)?;
        let content = Self::validate_content(content)?;

        let id = self.repo.create(title, content)?;
        debug!("Added note with ID: {id}");
        Ok(Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    // Retrieve all notes ordered by ID
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        self.repo.list()
    }

    // Case-insensitive substring search. A blank query matches nothing
    pub fn search_notes(&self, query: &str) -> Result<Vec<Note>> {
        let query = query.trim();
        if query.is_empty() {
            trace!("Blank search query, skipping backend");
            return Ok(Vec::new());
        }
        self.repo.search(query)
    }

    // Fetch a single note, e.g. to show current values before editing
    pub fn get_note(&self, id: i64) -> Result<Note> {
        self.repo.read(id)?.ok_or(NoteError::NotFound(id))
    }

    // Replace title and content of an existing note
    // ID stays the same. New values are validated before the note is looked up
    pub fn edit_note(&self, id: i64, title: &str, content: &str) -> Result<Note> {
        let title = Self::validate_title(title)?;
        let content = Self::validate_content(content)?;

        if !self.repo.update(id, title, content)? {
            return Err(NoteError::NotFound(id));
        }
        debug!("Edited note with ID: {id}");
        Ok(Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    // Delete note by ID
    pub fn delete_note(&self, id: i64) -> Result<()> {
        if self.repo.delete(id)? {
            debug!("Deleted note with ID: {id}");
            Ok(())
        } else {
            Err(NoteError::NotFound(id))
        }
    }

    // --- small helpers ---

    /// Trims a title and rejects it if nothing is left
    ///
    /// # Errors
    ///
    /// `NoteValidationError::Empty(NoteField::Title)` for blank input
    pub fn validate_title(title: &str) -> Result<&str> {
        Self::non_blank(title, NoteField::Title)
    }

    /// Trims note content and rejects it if nothing is left
    ///
    /// # Errors
    ///
    /// `NoteValidationError::Empty(NoteField::Content)` for blank input
    pub fn validate_content(content: &str) -> Result<&str> {
        Self::non_blank(content, NoteField::Content)
    }

    fn non_blank(value: &str, field: NoteField) -> Result<&str> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Err(NoteValidationError::Empty(field).into())
        } else {
            Ok(trimmed)
        }
    }
}
