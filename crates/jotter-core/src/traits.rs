//! Repository and backend traits.
//!
//! These traits are the seams between the service layer and its
//! collaborators: the relational store, the external auth provider's session
//! table, and the text-completion API. Implementations live in `jotter-db`
//! and `jotter-inference`; tests substitute mocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AuthPrincipal, NewNote, Note, NotePatch};
use crate::Result;

/// Repository for note CRUD operations.
///
/// Every operation is owner-scoped: a note is visible to, and mutable only
/// by, its owner. `update` and `delete` fold "does not exist" and "owned by
/// someone else" into the same [`crate::Error::NoteNotFound`].
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Persist a new note and return it with generated id and timestamps.
    async fn insert(&self, note: NewNote) -> Result<Note>;

    /// List the owner's notes with the given archived flag, ordered by
    /// (is_pinned desc, created_at desc).
    async fn list(&self, owner_id: Uuid, archived: bool) -> Result<Vec<Note>>;

    /// Apply a partial update; only fields present in the patch change.
    /// Always refreshes `updated_at`.
    async fn update(&self, owner_id: Uuid, id: Uuid, patch: NotePatch) -> Result<Note>;

    /// Permanently remove a note. No undo.
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()>;

    /// List the owner's notes created in `[start, end)`, newest first.
    /// Archived notes are included; report windows cover all activity.
    async fn list_created_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Note>>;
}

/// Read-side view of the external auth collaborator's session table.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a session token to a principal. Unknown and expired tokens
    /// both return `None`.
    async fn get_session(&self, token: &str) -> Result<Option<AuthPrincipal>>;
}

/// Backend for text generation (LLM completion API).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for a prompt within the given output budget.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Model identifier used for generation.
    fn model_name(&self) -> &str;
}
