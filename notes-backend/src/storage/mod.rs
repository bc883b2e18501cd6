//! Note persistence behind a single repository trait.
//!
//! One implementation per backend (flat JSON file, embedded SQLite, remote
//! PostgreSQL). The backend is chosen once at startup and shared with the HTTP
//! layer as `Arc<dyn NoteRepository>`.

pub mod file;
pub mod postgres;
pub mod sqlite;

#[cfg(test)]
pub mod test_support;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use notes_types::{NewNote, Note, UpdateNoteRequest};
use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::error::NoteResult;

pub use file::JsonFileRepository;
pub use postgres::PgRepository;
pub use sqlite::SqliteRepository;

#[async_trait]
pub trait NoteRepository: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// All notes, in the backend's natural order
    async fn list(&self) -> NoteResult<Vec<Note>>;

    async fn create(&self, new_note: NewNote) -> NoteResult<Note>;

    async fn get(&self, id: i64) -> NoteResult<Note>;

    /// Replace the supplied fields and bump `updated_at`
    async fn update(&self, id: i64, patch: UpdateNoteRequest) -> NoteResult<Note>;

    async fn delete(&self, id: i64) -> NoteResult<()>;

    /// Case-insensitive substring match on title or content. A blank query
    /// returns nothing.
    async fn search(&self, query: &str) -> NoteResult<Vec<Note>>;

    async fn count(&self) -> NoteResult<usize>;

    /// Release connections at shutdown
    async fn close(&self) {}
}

/// Open the configured backend, loading or creating its storage
pub async fn open(config: &Config) -> NoteResult<Arc<dyn NoteRepository>> {
    let repo: Arc<dyn NoteRepository> = match &config.backend {
        StorageBackend::File { path } => Arc::new(JsonFileRepository::open(path.clone())?),
        StorageBackend::Sqlite { path } => {
            Arc::new(SqliteRepository::open(path, config.max_connections)?)
        }
        StorageBackend::Postgres { url } => {
            Arc::new(PgRepository::connect(url, config.max_connections).await?)
        }
    };
    Ok(repo)
}

/// Current time at the precision every backend can store
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// New `updated_at` for an edit, never earlier than the previous one
pub(crate) fn touched(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous)
}

/// Lowercased search needle, or `None` for a blank query
pub(crate) fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    }
}

/// `LIKE` pattern matching `needle` anywhere, escaped with `\`
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
