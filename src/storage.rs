use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace};
use tempfile::NamedTempFile;

use crate::{Note, NoteError, Result};

/// Loads and saves the whole note collection.
pub trait NoteStore: Send + Sync {
    fn load(&self) -> Result<Vec<Note>>;

    fn save(&self, notes: &[Note]) -> Result<()>;
}

/// Keeps the collection as one pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonNoteStore {
    path: PathBuf,
}

impl JsonNoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn validate(notes: &[Note]) -> Result<()> {
        if let Some(note) = notes.iter().find(|n| n.id.is_empty()) {
            let error_msg = format!("Note {:?} has an empty ID", note.content);
            error!("{}", error_msg);
            return Err(NoteError::InvalidFormat { message: error_msg });
        }
        Ok(())
    }
}

impl NoteStore for JsonNoteStore {
    /// A missing file is an empty collection.
    fn load(&self) -> Result<Vec<Note>> {
        if !self.path.exists() {
            debug!(
                "Notes file {} does not exist yet, starting empty",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        debug!("Loading notes from file: {}", self.path.display());
        let content = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to open notes file {}: {}", self.path.display(), e);
            NoteError::Io(e)
        })?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let notes: Vec<Note> = serde_json::from_str(&content)?;
        Self::validate(&notes)?;

        trace!("Loaded {} notes", notes.len());
        Ok(notes)
    }

    /// Writes through a temporary file in the same directory and renames it
    /// into place, so a crash never leaves a half-written collection.
    fn save(&self, notes: &[Note]) -> Result<()> {
        Self::validate(notes)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            debug!("Creating parent directory: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                NoteError::DirectoryError { path: dir.clone() }
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NoteError::Io(e)
        })?;

        trace!("Serializing {} notes to JSON", notes.len());
        let json = serde_json::to_string_pretty(notes)?;

        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NoteError::Io(e)
        })?;
        temp_file.flush()?;

        temp_file.persist(&self.path).map_err(|e| {
            error!("Failed to persist file {}: {}", self.path.display(), e.error);
            NoteError::Io(e.error)
        })?;

        info!("Saved {} notes to {}", notes.len(), self.path.display());
        Ok(())
    }
}
