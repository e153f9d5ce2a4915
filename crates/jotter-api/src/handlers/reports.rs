//! Activity report HTTP handler.
//!
//! A report covers the UTC calendar day, Sunday-start week, or month
//! containing the reference date. Stats are computed locally; the narrative
//! comes from the enrichment client and degrades to a placeholder when
//! generation fails.

use axum::{
    extract::rejection::QueryRejection,
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use jotter_core::{NoteRepository, ReportPeriod, ReportStats, ReportWindow};

use crate::{ApiError, AppState, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// "daily", "weekly", or "monthly"; anything else means daily.
    #[serde(rename = "type")]
    kind: Option<String>,
    /// RFC 3339 reference date; defaults to now.
    date: Option<String>,
}

/// The response echoes whatever the client asked for, even when an unknown
/// value resolved to a daily window.
fn period_label(kind: Option<&str>) -> &str {
    kind.unwrap_or("daily")
}

/// Resolve the reference date. Absent means now; present but unparseable is
/// a client error, not a silent fallback.
fn parse_reference_date(raw: Option<&str>) -> Result<DateTime<Utc>, ApiError> {
    match raw {
        None => Ok(Utc::now()),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ApiError::BadRequest("Invalid date".to_string())),
    }
}

/// GET /reports — AI-narrated activity summary over a calendar window.
pub async fn generate_report(
    State(state): State<AppState>,
    auth: RequireAuth,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;

    let period = query
        .kind
        .as_deref()
        .map(ReportPeriod::parse)
        .unwrap_or_default();
    let reference = parse_reference_date(query.date.as_deref())?;
    let window = ReportWindow::containing(period, reference);

    let notes = state
        .db
        .notes
        .list_created_between(auth.principal.user_id, window.start, window.end)
        .await?;

    let stats = ReportStats::for_notes(&notes);
    let report = state.enrichment.report_narrative(&notes, period).await;

    info!(
        owner_id = %auth.principal.user_id,
        period = %period,
        note_count = notes.len(),
        "Report generated"
    );

    Ok(Json(serde_json::json!({
        "report": report,
        "stats": stats,
        "period": period_label(query.kind.as_deref()),
        "date": reference.to_rfc3339(),
        "noteCount": notes.len(),
    })))
}
