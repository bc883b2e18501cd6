//! JsonFileRepository keeps the whole collection in memory and rewrites it to
//! a single JSON array file after every mutation.
//!
//! Writes go to `<file>.tmp` first and are renamed over the target, so a crash
//! mid-write leaves the previous file intact. An in-memory change is committed
//! only once the rewrite has succeeded.

use async_trait::async_trait;
use notes_types::{NewNote, Note, UpdateNoteRequest};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{NoteRepository, normalize_query, now, touched};
use crate::error::{NoteError, NoteResult};

struct FileState {
    notes: Vec<Note>,
    next_id: i64,
}

pub struct JsonFileRepository {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl JsonFileRepository {
    /// Load notes from `path`. A missing file is an empty store; an undecodable
    /// one is moved aside to `<file>.corrupt` and the store starts empty.
    pub fn open(path: PathBuf) -> NoteResult<Self> {
        let notes = load_notes(&path)?;
        let next_id = notes.iter().map(|n| n.id).max().unwrap_or(0) + 1;

        log::info!(
            "[NOTES] Loaded {} notes from {:?} (next id {})",
            notes.len(),
            path,
            next_id
        );

        Ok(Self {
            path,
            state: Mutex::new(FileState { notes, next_id }),
        })
    }

    fn persist(&self, notes: &[Note]) -> NoteResult<()> {
        let json = serde_json::to_string_pretty(notes)?;
        atomic_write(&self.path, json.as_bytes()).map_err(|e| {
            NoteError::Storage(format!("Failed to write {:?}: {}", self.path, e))
        })
    }
}

#[async_trait]
impl NoteRepository for JsonFileRepository {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn list(&self) -> NoteResult<Vec<Note>> {
        Ok(self.state.lock().notes.clone())
    }

    async fn create(&self, new_note: NewNote) -> NoteResult<Note> {
        let mut state = self.state.lock();
        let ts = now();
        let note = Note {
            id: state.next_id,
            title: new_note.title,
            content: new_note.content,
            created_at: ts,
            updated_at: ts,
        };

        state.notes.push(note.clone());
        if let Err(e) = self.persist(&state.notes) {
            state.notes.pop();
            return Err(e);
        }
        state.next_id += 1;

        Ok(note)
    }

    async fn get(&self, id: i64) -> NoteResult<Note> {
        self.state
            .lock()
            .notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or(NoteError::NotFound(id))
    }

    async fn update(&self, id: i64, patch: UpdateNoteRequest) -> NoteResult<Note> {
        let mut state = self.state.lock();
        let idx = state
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or(NoteError::NotFound(id))?;

        let previous = state.notes[idx].clone();
        {
            let note = &mut state.notes[idx];
            if let Some(title) = patch.title {
                note.title = title;
            }
            if let Some(content) = patch.content {
                note.content = content;
            }
            note.updated_at = touched(previous.updated_at);
        }

        if let Err(e) = self.persist(&state.notes) {
            state.notes[idx] = previous;
            return Err(e);
        }

        Ok(state.notes[idx].clone())
    }

    async fn delete(&self, id: i64) -> NoteResult<()> {
        let mut state = self.state.lock();
        let idx = state
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or(NoteError::NotFound(id))?;

        let removed = state.notes.remove(idx);
        if let Err(e) = self.persist(&state.notes) {
            state.notes.insert(idx, removed);
            return Err(e);
        }

        Ok(())
    }

    async fn search(&self, query: &str) -> NoteResult<Vec<Note>> {
        let Some(needle) = normalize_query(query) else {
            return Ok(vec![]);
        };

        Ok(self
            .state
            .lock()
            .notes
            .iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle) || n.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn count(&self) -> NoteResult<usize> {
        Ok(self.state.lock().notes.len())
    }
}

fn load_notes(path: &Path) -> NoteResult<Vec<Note>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => {
            return Err(NoteError::Storage(format!("Failed to read {:?}: {}", path, e)));
        }
    };

    if raw.trim().is_empty() {
        return Ok(vec![]);
    }

    match serde_json::from_str::<Vec<Note>>(&raw) {
        Ok(notes) => Ok(notes),
        Err(e) => {
            let backup = sibling_path(path, ".corrupt");
            log::warn!(
                "[NOTES] {:?} is not a valid notes file ({}), moving it to {:?} and starting empty",
                path,
                e,
                backup
            );
            if let Err(e) = fs::rename(path, &backup) {
                log::warn!("[NOTES] Failed to move corrupt notes file aside: {}", e);
            }
            Ok(vec![])
        }
    }
}

/// `path` with `suffix` appended to the file name (`notes.json` -> `notes.json.tmp`)
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Write to a temporary file next to `path`, then rename it into place
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = sibling_path(path, ".tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)
}
