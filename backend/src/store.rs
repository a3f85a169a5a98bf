//! Note store adapter. Every operation is scoped to an owner: the owner id is
//! part of the statement, never checked after a row has been read.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::structs::{Note, NoteDraft, NoteVector};

#[rocket::async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, owner_id: &str, draft: &NoteDraft) -> anyhow::Result<Note>;

    /// Newest first.
    async fn select_by_owner(&self, owner_id: &str) -> anyhow::Result<NoteVector>;

    /// `None` when no row matched both the id and the owner.
    async fn update_by_id_and_owner(
        &self,
        id: i64,
        owner_id: &str,
        draft: &NoteDraft,
    ) -> anyhow::Result<Option<Note>>;

    /// Whether a row was removed.
    async fn delete_by_id_and_owner(&self, id: i64, owner_id: &str) -> anyhow::Result<bool>;
}

pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NoteRow {
    id: i64,
    title: String,
    content: String,
    user_id: String,
    created_at: i64,
}

impl TryFrom<NoteRow> for Note {
    type Error = anyhow::Error;

    fn try_from(row: NoteRow) -> anyhow::Result<Self> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(row.created_at)
            .with_context(|| format!("Note {} has an invalid creation time", row.id))?;

        Ok(Note {
            id: row.id,
            title: row.title,
            content: row.content,
            owner_id: row.user_id,
            created_at,
        })
    }
}

#[rocket::async_trait]
impl NoteStore for SqliteNoteStore {
    async fn insert(&self, owner_id: &str, draft: &NoteDraft) -> anyhow::Result<Note> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO notes ( title, content, user_id, created_at )
            VALUES ( ?1, ?2, ?3, ?4 )
            RETURNING id, title, content, user_id, created_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(owner_id)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .context("Failed writing note")?;

        row.try_into()
    }

    async fn select_by_owner(&self, owner_id: &str) -> anyhow::Result<NoteVector> {
        let rows = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, title, content, user_id, created_at
            FROM notes
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list notes")?;

        rows.into_iter().map(Note::try_from).collect()
    }

    async fn update_by_id_and_owner(
        &self,
        id: i64,
        owner_id: &str,
        draft: &NoteDraft,
    ) -> anyhow::Result<Option<Note>> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            UPDATE notes
            SET title = ?1, content = ?2
            WHERE id = ?3 AND user_id = ?4
            RETURNING id, title, content, user_id, created_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed updating note")?;

        row.map(Note::try_from).transpose()
    }

    async fn delete_by_id_and_owner(&self, id: i64, owner_id: &str) -> anyhow::Result<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM notes
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .context("Failed deleting note")?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
