//! Core data models for jotter.
//!
//! These types are shared across all jotter crates and represent the core
//! domain entities: notes, patches, AI enrichment results, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// PRIORITY
// =============================================================================

/// Note priority.
///
/// Stored as the Postgres enum `priority`; serialized in uppercase on the
/// wire (`URGENT`, `IMPORTANT`, `MINOR`) to match the client contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "priority", rename_all = "UPPERCASE")]
pub enum Priority {
    Urgent,
    Important,
    #[default]
    Minor,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Urgent => write!(f, "URGENT"),
            Self::Important => write!(f, "IMPORTANT"),
            Self::Minor => write!(f, "MINOR"),
        }
    }
}

// =============================================================================
// NOTE
// =============================================================================

/// A persisted note.
///
/// Wire representation uses camelCase field names; database columns are
/// snake_case and mapped through `sqlx::FromRow`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub archived: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields resolved by the note service before insertion.
///
/// This is what the repository persists after validation, title defaulting,
/// and optional AI enrichment have run.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub reminder: Option<DateTime<Utc>>,
}

/// Client request body for note creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// RFC 3339 timestamp; unparseable values store no reminder.
    #[serde(default)]
    pub reminder: Option<String>,
    #[serde(rename = "useAI", default)]
    pub use_ai: bool,
}

/// Deserialize a field that distinguishes "absent" from "explicit null".
///
/// Combined with `#[serde(default)]`, an omitted field stays `None` while
/// `"field": null` becomes `Some(None)` (clear) and a value becomes
/// `Some(Some(v))` (set).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Explicit partial-update payload for a note.
///
/// One optional field per mutable attribute; only fields present in the
/// request body are applied. `category`, `completed_at`, and `reminder` are
/// tri-state: absent leaves the stored value untouched, `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reminder: Option<Option<DateTime<Utc>>>,
}

// =============================================================================
// AI ENRICHMENT RESULTS
// =============================================================================

/// Classification result from the AI enrichment client.
///
/// `tags` and `category` are clamped to the documented limits before this
/// struct reaches callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteAnalysis {
    pub suggested_priority: Priority,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl NoteAnalysis {
    /// The documented classification fallback: MINOR / "General" / no tags.
    pub fn fallback() -> Self {
        Self {
            suggested_priority: Priority::Minor,
            category: defaults::FALLBACK_CATEGORY.to_string(),
            tags: Vec::new(),
            summary: None,
        }
    }
}

/// Correction result from the AI enrichment client.
///
/// Falls back to the unmodified inputs when the completion is unusable, so
/// both fields are always populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedNote {
    pub improved_title: String,
    pub improved_content: String,
}

/// Transparency payload describing what AI correction changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteImprovements {
    pub original_title: String,
    pub original_content: String,
    pub was_improved: bool,
}

impl NoteImprovements {
    /// Compare originals against the improved pair; strict inequality on
    /// either field counts as an improvement.
    pub fn from_comparison(title: &str, content: &str, improved: &ImprovedNote) -> Self {
        Self {
            original_title: title.to_string(),
            original_content: content.to_string(),
            was_improved: improved.improved_title != title || improved.improved_content != content,
        }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// Report aggregation window type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl ReportPeriod {
    /// Lenient parse; unknown values fall back to daily.
    pub fn parse(s: &str) -> Self {
        match s {
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Daily,
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// Aggregate counts over the notes in a report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReportStats {
    pub total: i64,
    pub urgent: i64,
    pub important: i64,
    pub minor: i64,
    pub completed: i64,
    pub pinned: i64,
}

impl ReportStats {
    /// Compute stats over a fetched note list.
    pub fn for_notes(notes: &[Note]) -> Self {
        let mut stats = Self {
            total: notes.len() as i64,
            ..Self::default()
        };
        for note in notes {
            match note.priority {
                Priority::Urgent => stats.urgent += 1,
                Priority::Important => stats.important += 1,
                Priority::Minor => stats.minor += 1,
            }
            if note.completed_at.is_some() {
                stats.completed += 1;
            }
            if note.is_pinned {
                stats.pinned += 1;
            }
        }
        stats
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Authenticated principal resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPrincipal {
    pub user_id: Uuid,
}

/// A session row written by the external auth collaborator.
///
/// This service only reads sessions; issuance and revocation happen
/// elsewhere.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Expired sessions authenticate as absent.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
