//! PgRepository stores notes in a remote PostgreSQL database.

use async_trait::async_trait;
use notes_types::{NewNote, Note, UpdateNoteRequest};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use super::{NoteRepository, like_pattern, normalize_query, now};
use crate::error::{NoteError, NoteResult};

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Connect to `url` and ensure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> NoteResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        let repo = Self::new(pool);
        repo.init_schema().await?;

        log::info!("[NOTES] PostgreSQL database ready");
        Ok(repo)
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn init_schema(&self) -> NoteResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notes (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn note_from_row(row: &PgRow) -> Result<Note, sqlx::Error> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl NoteRepository for PgRepository {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> NoteResult<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notes ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(note_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn create(&self, new_note: NewNote) -> NoteResult<Note> {
        let ts = now();
        let row = sqlx::query(&format!(
            "INSERT INTO notes (title, content, created_at, updated_at)
             VALUES ($1, $2, $3, $3)
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(&new_note.title)
        .bind(&new_note.content)
        .bind(ts)
        .fetch_one(&self.pool)
        .await?;

        Ok(note_from_row(&row)?)
    }

    async fn get(&self, id: i64) -> NoteResult<Note> {
        let row = sqlx::query(&format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(NoteError::NotFound(id))?;

        Ok(note_from_row(&row)?)
    }

    async fn update(&self, id: i64, patch: UpdateNoteRequest) -> NoteResult<Note> {
        // Single statement: no window between the existence check and the write
        let row = sqlx::query(&format!(
            "UPDATE notes
             SET title = COALESCE($1, title),
                 content = COALESCE($2, content),
                 updated_at = GREATEST($3, updated_at)
             WHERE id = $4
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(patch.title)
        .bind(patch.content)
        .bind(now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(NoteError::NotFound(id))?;

        Ok(note_from_row(&row)?)
    }

    async fn delete(&self, id: i64) -> NoteResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NoteError::NotFound(id));
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> NoteResult<Vec<Note>> {
        let Some(needle) = normalize_query(query) else {
            return Ok(vec![]);
        };

        let rows = sqlx::query(&format!(
            "SELECT {} FROM notes
             WHERE LOWER(title) LIKE $1 ESCAPE '\\' OR LOWER(content) LIKE $1 ESCAPE '\\'
             ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        ))
        .bind(like_pattern(&needle))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(note_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn count(&self) -> NoteResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
