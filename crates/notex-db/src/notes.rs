//! Note repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use notex_core::{Error, NewNote, Note, NoteChanges, NoteRepository, Result};

const NOTE_COLUMNS: &str = "id, name, description, bg_color, created_at, updated_at";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_note(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        bg_color: row.get("bg_color"),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let sql = format!(
            "INSERT INTO notes (name, description, bg_color)
             VALUES ($1, $2, $3)
             RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&note.name)
            .bind(&note.description)
            .bind(&note.bg_color)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row_to_note(&row))
    }

    async fn list(&self) -> Result<Vec<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY updated_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(row_to_note).collect())
    }

    async fn fetch(&self, id: i64) -> Result<Note> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(row_to_note).ok_or(Error::NoteNotFound(id))
    }

    async fn update(&self, id: i64, changes: NoteChanges) -> Result<Note> {
        // Single statement: a missing id matches zero rows and returns nothing.
        let sql = format!(
            "UPDATE notes
             SET name = COALESCE($1, name),
                 description = COALESCE($2, description),
                 bg_color = COALESCE($3, bg_color),
                 updated_at = NOW()
             WHERE id = $4
             RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.bg_color)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(row_to_note).ok_or(Error::NoteNotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }
}
