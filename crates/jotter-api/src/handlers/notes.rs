//! Note CRUD HTTP handlers.
//!
//! All routes require a valid session. Ownership is enforced at the
//! repository level: a note owned by someone else reads as absent, and both
//! cases surface the same 404 body.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use jotter_core::{
    defaults, CreateNoteRequest, GenerationBackend, NewNote, NoteAnalysis, NoteImprovements,
    NotePatch, NoteRepository, Priority,
};
use jotter_inference::EnrichmentClient;

use crate::{ApiError, AppState, RequireAuth};

// =============================================================================
// LIST
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListNotesQuery {
    /// When true, list archived notes instead of active ones.
    #[serde(default)]
    archived: bool,
}

/// GET /notes — the caller's notes, pinned first, newest first.
pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
    query: Result<Query<ListNotesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;

    let notes = state
        .db
        .notes
        .list(auth.principal.user_id, query.archived)
        .await?;

    debug!(
        owner_id = %auth.principal.user_id,
        archived = query.archived,
        result_count = notes.len(),
        "Listed notes"
    );

    Ok(Json(serde_json::json!({ "notes": notes })))
}

// =============================================================================
// CREATE
// =============================================================================

/// Parse an RFC 3339 reminder string; unparseable values store no reminder.
fn parse_reminder(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// A usable classification overrides the caller-supplied priority; otherwise
/// the caller's choice (default MINOR) stands.
fn resolve_priority(analysis: Option<&NoteAnalysis>, requested: Option<Priority>) -> Priority {
    analysis
        .map(|a| a.suggested_priority)
        .or(requested)
        .unwrap_or_default()
}

/// Outcome of the optional AI step for a new note.
struct EnrichedDraft {
    title: String,
    content: String,
    analysis: Option<NoteAnalysis>,
    improvements: Option<NoteImprovements>,
}

/// Run correction then classification on the corrected content when AI is
/// requested. With `use_ai` false the inputs pass through untouched and the
/// generation backend is never called.
async fn resolve_enrichment<B: GenerationBackend>(
    client: &EnrichmentClient<B>,
    title: String,
    content: &str,
    use_ai: bool,
) -> EnrichedDraft {
    if !use_ai {
        return EnrichedDraft {
            title,
            content: content.to_string(),
            analysis: None,
            improvements: None,
        };
    }

    let improved = client.improve_note(&title, content).await;
    let analysis = client.analyze_note(&improved.improved_content).await;
    let improvements = NoteImprovements::from_comparison(&title, content, &improved);
    EnrichedDraft {
        title: improved.improved_title,
        content: improved.improved_content,
        analysis,
        improvements: Some(improvements),
    }
}

/// POST /notes — create a note, optionally running AI correction and
/// classification first.
pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }

    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(defaults::UNTITLED_TITLE)
        .to_string();
    let reminder = parse_reminder(req.reminder.as_deref());

    // Both AI calls fall back internally; neither can abort creation.
    let draft = resolve_enrichment(&state.enrichment, title, &req.content, req.use_ai).await;

    let priority = resolve_priority(draft.analysis.as_ref(), req.priority);
    let (category, tags) = match (&draft.analysis, req.use_ai) {
        (Some(a), _) => (Some(a.category.clone()), a.tags.clone()),
        (None, true) => (Some(defaults::FALLBACK_CATEGORY.to_string()), Vec::new()),
        (None, false) => (None, Vec::new()),
    };

    let note = state
        .db
        .notes
        .insert(NewNote {
            owner_id: auth.principal.user_id,
            title: draft.title,
            content: draft.content,
            priority,
            category,
            tags,
            reminder,
        })
        .await?;

    info!(
        note_id = %note.id,
        owner_id = %auth.principal.user_id,
        used_ai = req.use_ai,
        priority = %note.priority,
        "Note created"
    );

    // The response always carries a classification when AI was requested,
    // resolved or fallback, so the client can render it either way.
    let ai_analysis = req
        .use_ai
        .then(|| draft.analysis.unwrap_or_else(NoteAnalysis::fallback));

    Ok(Json(serde_json::json!({
        "note": note,
        "aiAnalysis": ai_analysis,
        "improvements": draft.improvements,
    })))
}

// =============================================================================
// UPDATE / DELETE
// =============================================================================

/// A path segment that is not a UUID names a note that cannot exist, and the
/// response must be indistinguishable from a missing note.
fn parse_note_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Note not found".to_string()))
}

/// PATCH /notes/:id — apply a partial update; only fields present in the
/// body change.
pub async fn update_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    payload: Result<Json<NotePatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_note_id(&id)?;
    let Json(patch) = payload?;

    let note = state
        .db
        .notes
        .update(auth.principal.user_id, id, patch)
        .await?;

    debug!(note_id = %id, owner_id = %auth.principal.user_id, "Note updated");

    Ok(Json(serde_json::json!({ "note": note })))
}

/// DELETE /notes/:id — permanent removal; archiving is a separate flag, not
/// a soft delete.
pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_note_id(&id)?;

    state.db.notes.delete(auth.principal.user_id, id).await?;

    info!(note_id = %id, owner_id = %auth.principal.user_id, "Note deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jotter_inference::MockBackend;

    #[tokio::test]
    async fn test_create_without_ai_never_calls_the_backend() {
        let client = EnrichmentClient::new(MockBackend::new());
        let draft = resolve_enrichment(&client, "Groceries".to_string(), "milk, eggs", false).await;

        assert_eq!(client.backend().call_count(), 0);
        assert_eq!(draft.title, "Groceries");
        assert_eq!(draft.content, "milk, eggs");
        assert!(draft.analysis.is_none());
        assert!(draft.improvements.is_none());
    }

    #[tokio::test]
    async fn test_create_with_ai_runs_correction_then_classification() {
        // One fixed completion serves both calls: correction reads the
        // improved* keys, classification the suggestedPriority/category keys.
        let mock = MockBackend::new().with_response(
            r#"{"improvedTitle": "Pay rent", "improvedContent": "Pay rent by Friday",
                "suggestedPriority": "URGENT", "category": "Payment", "tags": []}"#,
        );
        let client = EnrichmentClient::new(mock);
        let draft = resolve_enrichment(&client, "pay rnt".to_string(), "pay rent fridy", true).await;

        let calls = client.backend().calls();
        assert_eq!(calls.len(), 2);
        // Classification consumes the corrected content, not the original.
        assert!(calls[1].prompt.contains("Pay rent by Friday"));

        assert_eq!(draft.title, "Pay rent");
        assert_eq!(draft.content, "Pay rent by Friday");
        assert_eq!(
            draft.analysis.unwrap().suggested_priority,
            Priority::Urgent
        );
        assert!(draft.improvements.unwrap().was_improved);
    }

    #[tokio::test]
    async fn test_create_with_ai_failure_keeps_originals() {
        let client = EnrichmentClient::new(MockBackend::new().with_failure());
        let draft = resolve_enrichment(&client, "t".to_string(), "c", true).await;

        assert_eq!(client.backend().call_count(), 2);
        assert_eq!(draft.title, "t");
        assert_eq!(draft.content, "c");
        assert!(draft.analysis.is_none());
        assert!(!draft.improvements.unwrap().was_improved);
    }

    #[test]
    fn test_parse_reminder_rfc3339() {
        let parsed = parse_reminder(Some("2026-03-01T09:30:00Z"));
        assert_eq!(
            parsed,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_reminder_normalizes_offset_to_utc() {
        let parsed = parse_reminder(Some("2026-03-01T09:30:00+02:00")).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_reminder_garbage_is_none() {
        assert_eq!(parse_reminder(Some("tomorrow")), None);
        assert_eq!(parse_reminder(Some("")), None);
        assert_eq!(parse_reminder(None), None);
    }

    #[test]
    fn test_resolve_priority_analysis_wins() {
        let analysis = NoteAnalysis {
            suggested_priority: Priority::Urgent,
            category: "Payment".to_string(),
            tags: vec![],
            summary: None,
        };
        assert_eq!(
            resolve_priority(Some(&analysis), Some(Priority::Minor)),
            Priority::Urgent
        );
    }

    #[test]
    fn test_resolve_priority_falls_back_to_request() {
        assert_eq!(
            resolve_priority(None, Some(Priority::Important)),
            Priority::Important
        );
    }

    #[test]
    fn test_resolve_priority_default_is_minor() {
        assert_eq!(resolve_priority(None, None), Priority::Minor);
    }

    #[test]
    fn test_parse_note_id_rejects_non_uuid_as_not_found() {
        match parse_note_id("abc123") {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Note not found"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_note_id_accepts_uuid() {
        let id = Uuid::now_v7();
        assert_eq!(parse_note_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_list_query_archived_defaults_false() {
        let q: ListNotesQuery = serde_json::from_str("{}").unwrap();
        assert!(!q.archived);
    }
}
