use super::{contains_ignore_case, BackendError, Note, NoteBackend, NoteError, Result};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Store {
    // Last ID handed out. Only ever grows, so IDs of deleted notes are never reused
    last_id: i64,
    notes: BTreeMap<i64, Note>,
}

/// Notes kept in process memory. Same semantics as `SqliteBackend`, nothing survives exit
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        debug!("Created in-memory note store");
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| NoteError::Backend(BackendError::Poisoned))
    }
}

impl NoteBackend for MemoryBackend {
    fn initialize(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    fn create(&self, title: &str, content: &str) -> Result<i64> {
        let mut store = self.lock()?;
        store.last_id += 1;
        let id = store.last_id;
        store.notes.insert(
            id,
            Note {
                id,
                title: title.to_string(),
                content: content.to_string(),
            },
        );
        trace!("Stored note #{id} in memory");
        Ok(id)
    }

    fn read(&self, id: i64) -> Result<Option<Note>> {
        Ok(self.lock()?.notes.get(&id).cloned())
    }

    fn update(&self, id: i64, title: &str, content: &str) -> Result<bool> {
        let mut store = self.lock()?;
        match store.notes.get_mut(&id) {
            Some(note) => {
                note.title = title.to_string();
                note.content = content.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.lock()?.notes.remove(&id).is_some())
    }

    fn list(&self) -> Result<Vec<Note>> {
        Ok(self.lock()?.notes.values().cloned().collect())
    }

    fn search(&self, query: &str) -> Result<Vec<Note>> {
        Ok(self
            .lock()?
            .notes
            .values()
            .filter(|n| {
                contains_ignore_case(&n.title, query) || contains_ignore_case(&n.content, query)
            })
            .cloned()
            .collect())
    }
}
