//! Note repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{Error, NewNote, Note, NotePatch, NoteRepository, Result};

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Build the SET clauses for a partial update.
///
/// Parameter layout: `$1` = updated_at, `$2` = id, `$3` = owner_id; dynamic
/// parameters start at `$4`. Bind order in [`PgNoteRepository::update`] must
/// match the push order here exactly.
fn build_patch_sets(patch: &NotePatch) -> Vec<String> {
    let mut sets = vec!["updated_at = $1".to_string()];
    let mut idx = 4;
    let mut push = |sets: &mut Vec<String>, column: &str| {
        sets.push(format!("{} = ${}", column, idx));
        idx += 1;
    };

    if patch.title.is_some() {
        push(&mut sets, "title");
    }
    if patch.content.is_some() {
        push(&mut sets, "content");
    }
    if patch.priority.is_some() {
        push(&mut sets, "priority");
    }
    if patch.category.is_some() {
        push(&mut sets, "category");
    }
    if patch.tags.is_some() {
        push(&mut sets, "tags");
    }
    if patch.is_pinned.is_some() {
        push(&mut sets, "is_pinned");
    }
    if patch.archived.is_some() {
        push(&mut sets, "archived");
    }
    if patch.completed_at.is_some() {
        push(&mut sets, "completed_at");
    }
    if patch.reminder.is_some() {
        push(&mut sets, "reminder");
    }
    sets
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        let created = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO note
                (id, owner_id, title, content, priority, category, tags,
                 is_pinned, archived, completed_at, reminder, created_at, updated_at)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, false, false, NULL, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(note.owner_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.priority)
        .bind(&note.category)
        .bind(&note.tags)
        .bind(note.reminder)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "insert",
            note_id = %created.id,
            owner_id = %created.owner_id,
            "Note created"
        );
        Ok(created)
    }

    async fn list(&self, owner_id: Uuid, archived: bool) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM note
            WHERE owner_id = $1 AND archived = $2
            ORDER BY is_pinned DESC, created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(archived)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "list",
            owner_id = %owner_id,
            archived,
            result_count = notes.len(),
            "Notes listed"
        );
        Ok(notes)
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, patch: NotePatch) -> Result<Note> {
        let now = Utc::now();
        let sets = build_patch_sets(&patch);
        let query = format!(
            "UPDATE note SET {} WHERE id = $2 AND owner_id = $3 RETURNING *",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, Note>(&query)
            .bind(now)
            .bind(id)
            .bind(owner_id);
        if let Some(title) = &patch.title {
            q = q.bind(title);
        }
        if let Some(content) = &patch.content {
            q = q.bind(content);
        }
        if let Some(priority) = patch.priority {
            q = q.bind(priority);
        }
        if let Some(category) = &patch.category {
            q = q.bind(category.clone());
        }
        if let Some(tags) = &patch.tags {
            q = q.bind(tags.clone());
        }
        if let Some(is_pinned) = patch.is_pinned {
            q = q.bind(is_pinned);
        }
        if let Some(archived) = patch.archived {
            q = q.bind(archived);
        }
        if let Some(completed_at) = patch.completed_at {
            q = q.bind(completed_at);
        }
        if let Some(reminder) = patch.reminder {
            q = q.bind(reminder);
        }

        // The owner_id predicate folds "not yours" into "absent": zero rows
        // for either case.
        let updated = q
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "update",
            note_id = %id,
            owner_id = %owner_id,
            "Note updated"
        );
        Ok(updated)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }

        debug!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = %id,
            owner_id = %owner_id,
            "Note deleted"
        );
        Ok(())
    }

    async fn list_created_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM note
            WHERE owner_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "list_created_between",
            owner_id = %owner_id,
            result_count = notes.len(),
            "Window query complete"
        );
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_only_touches_updated_at() {
        let sets = build_patch_sets(&NotePatch::default());
        assert_eq!(sets, vec!["updated_at = $1"]);
    }

    #[test]
    fn test_patch_sets_start_at_dollar_four() {
        let patch: NotePatch = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        let sets = build_patch_sets(&patch);
        assert_eq!(sets, vec!["updated_at = $1", "title = $4"]);
    }

    #[test]
    fn test_patch_sets_are_contiguous() {
        let patch: NotePatch =
            serde_json::from_str(r#"{"content":"c","isPinned":true,"reminder":null}"#).unwrap();
        let sets = build_patch_sets(&patch);
        assert_eq!(
            sets,
            vec![
                "updated_at = $1",
                "content = $4",
                "is_pinned = $5",
                "reminder = $6"
            ]
        );
    }

    #[test]
    fn test_patch_sets_full() {
        let patch: NotePatch = serde_json::from_str(
            r#"{
                "title": "t", "content": "c", "priority": "URGENT",
                "category": "Work", "tags": ["a"], "isPinned": true,
                "archived": false, "completedAt": "2026-01-01T00:00:00Z",
                "reminder": "2026-01-02T00:00:00Z"
            }"#,
        )
        .unwrap();
        let sets = build_patch_sets(&patch);
        assert_eq!(sets.len(), 10);
        assert_eq!(sets.last().unwrap(), "reminder = $12");
    }

    #[test]
    fn test_cleared_field_still_produces_a_set_clause() {
        // "category": null must bind NULL, not be skipped.
        let patch: NotePatch = serde_json::from_str(r#"{"category":null}"#).unwrap();
        let sets = build_patch_sets(&patch);
        assert_eq!(sets, vec!["updated_at = $1", "category = $4"]);
        assert_eq!(patch.category, Some(None));
    }
}
