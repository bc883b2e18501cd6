//! SqliteRepository stores notes in a local SQLite database behind an r2d2 pool.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use notes_types::{NewNote, Note, UpdateNoteRequest};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::time::Duration;

use super::{NoteRepository, like_pattern, normalize_query, now};
use crate::error::{NoteError, NoteResult};

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";

pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    /// Open (or create) the database at `path` and ensure the schema exists
    pub fn open(path: &Path, max_connections: u32) -> NoteResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            register_functions(conn)
        });
        let pool = r2d2::Pool::builder()
            .max_size(max_connections)
            .build(manager)?;

        let repo = Self { pool };
        repo.init_schema()?;

        log::info!("[NOTES] SQLite database ready at {:?}", path);
        Ok(repo)
    }

    fn init_schema(&self) -> NoteResult<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at);",
        )?;
        Ok(())
    }
}

/// `unicode_lower(text)` for search. SQLite's `LOWER` folds ASCII only.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
    )
}

/// Fixed-width UTC text so lexical order matches time order
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_ts(3, &created_at)?,
        updated_at: parse_ts(4, &updated_at)?,
    })
}

#[async_trait]
impl NoteRepository for SqliteRepository {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self) -> NoteResult<Vec<Note>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map([], note_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    async fn create(&self, new_note: NewNote) -> NoteResult<Note> {
        let conn = self.pool.get()?;
        let ts = now();
        let ts_str = format_ts(&ts);

        conn.execute(
            "INSERT INTO notes (title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![new_note.title, new_note.content, ts_str],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Note {
            id,
            title: new_note.title,
            content: new_note.content,
            created_at: ts,
            updated_at: ts,
        })
    }

    async fn get(&self, id: i64) -> NoteResult<Note> {
        let conn = self.pool.get()?;
        conn.query_row(
            &format!("SELECT {} FROM notes WHERE id = ?1", NOTE_COLUMNS),
            params![id],
            note_from_row,
        )
        .optional()?
        .ok_or(NoteError::NotFound(id))
    }

    async fn update(&self, id: i64, patch: UpdateNoteRequest) -> NoteResult<Note> {
        let conn = self.pool.get()?;
        let ts_str = format_ts(&now());

        // Single statement: no window between the existence check and the write
        conn.query_row(
            &format!(
                "UPDATE notes
                 SET title = COALESCE(?1, title),
                     content = COALESCE(?2, content),
                     updated_at = MAX(?3, updated_at)
                 WHERE id = ?4
                 RETURNING {}",
                NOTE_COLUMNS
            ),
            params![patch.title, patch.content, ts_str, id],
            note_from_row,
        )
        .optional()?
        .ok_or(NoteError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> NoteResult<()> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(NoteError::NotFound(id));
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> NoteResult<Vec<Note>> {
        let Some(needle) = normalize_query(query) else {
            return Ok(vec![]);
        };

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes
             WHERE unicode_lower(title) LIKE ?1 ESCAPE '\\' OR unicode_lower(content) LIKE ?1 ESCAPE '\\'
             ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map(params![like_pattern(&needle)], note_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    async fn count(&self) -> NoteResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
