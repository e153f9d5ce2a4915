//! AI enrichment client: correction, classification, and report narratives.
//!
//! Every operation here is infallible from the caller's point of view. The
//! documented fallbacks absorb network failures, deadline expiry, and
//! unparseable completions:
//!
//! - correction → the original, unmodified title/content pair
//! - classification → MINOR / "General" / no tags
//! - report narrative → a fixed "unable to generate" placeholder
//!
//! A failure in one step never aborts the surrounding request.

use serde::Deserialize;
use tracing::warn;

use jotter_core::{
    defaults, GenerationBackend, ImprovedNote, Note, NoteAnalysis, ReportPeriod,
};

use crate::extract::parse_first_json;

/// Stateless wrapper around a generation backend, constructed once at
/// process start and injected into handlers.
pub struct EnrichmentClient<B> {
    backend: B,
}

/// Decode target for correction completions. Both keys optional so a
/// half-formed completion still improves the field it did return.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImprovedRaw {
    #[serde(default)]
    improved_title: Option<String>,
    #[serde(default)]
    improved_content: Option<String>,
}

impl<B: GenerationBackend> EnrichmentClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Access the wrapped backend (model name, tests).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fix spelling/grammar/clarity in a note while preserving meaning and
    /// tone. Falls back per-key to the original input.
    pub async fn improve_note(&self, title: &str, content: &str) -> ImprovedNote {
        let prompt = improve_prompt(title, content);
        let fallback = || ImprovedNote {
            improved_title: title.to_string(),
            improved_content: content.to_string(),
        };

        let completion = match self
            .backend
            .generate(&prompt, defaults::IMPROVE_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "enrichment",
                    op = "improve_note",
                    error = %e,
                    "Correction failed, keeping original content"
                );
                return fallback();
            }
        };

        match parse_first_json::<ImprovedRaw>(&completion) {
            Some(raw) => ImprovedNote {
                improved_title: raw.improved_title.unwrap_or_else(|| title.to_string()),
                improved_content: raw
                    .improved_content
                    .unwrap_or_else(|| content.to_string()),
            },
            None => fallback(),
        }
    }

    /// Classify a note into priority/category/tags, clamped to the
    /// documented limits.
    ///
    /// Returns `None` when classification fails or returns nothing usable;
    /// callers apply [`NoteAnalysis::fallback`] for category/tags and keep
    /// the caller-supplied priority. A returned analysis overrides the
    /// caller-supplied priority.
    pub async fn analyze_note(&self, content: &str) -> Option<NoteAnalysis> {
        let prompt = analyze_prompt(content);

        let completion = match self
            .backend
            .generate(&prompt, defaults::ANALYZE_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "enrichment",
                    op = "analyze_note",
                    error = %e,
                    "Classification failed, using fallback"
                );
                return None;
            }
        };

        parse_first_json::<NoteAnalysis>(&completion).map(clamp_analysis)
    }

    /// Generate a free-text activity narrative over a set of notes. Never
    /// fails: errors return the period's placeholder string.
    pub async fn report_narrative(&self, notes: &[Note], period: ReportPeriod) -> String {
        let (prompt, max_tokens) = match period {
            ReportPeriod::Daily => (daily_report_prompt(notes), defaults::REPORT_DAILY_MAX_TOKENS),
            ReportPeriod::Weekly => (
                weekly_report_prompt(notes),
                defaults::REPORT_WEEKLY_MAX_TOKENS,
            ),
            ReportPeriod::Monthly => (
                monthly_report_prompt(notes),
                defaults::REPORT_MONTHLY_MAX_TOKENS,
            ),
        };

        match self.backend.generate(&prompt, max_tokens).await {
            Ok(text) if text.trim().is_empty() => defaults::EMPTY_COMPLETION_FALLBACK.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "enrichment",
                    op = "report_narrative",
                    period = %period,
                    error = %e,
                    "Narrative generation failed, using placeholder"
                );
                match period {
                    ReportPeriod::Daily => defaults::REPORT_DAILY_PLACEHOLDER.to_string(),
                    ReportPeriod::Weekly => defaults::REPORT_WEEKLY_PLACEHOLDER.to_string(),
                    ReportPeriod::Monthly => defaults::REPORT_MONTHLY_PLACEHOLDER.to_string(),
                }
            }
        }
    }
}

/// Clamp AI-suggested classification to the documented limits: at most
/// three tags, category at most twenty characters.
fn clamp_analysis(mut analysis: NoteAnalysis) -> NoteAnalysis {
    analysis.tags.truncate(defaults::MAX_AI_TAGS);
    if analysis.category.chars().count() > defaults::MAX_CATEGORY_LEN {
        analysis.category = analysis
            .category
            .chars()
            .take(defaults::MAX_CATEGORY_LEN)
            .collect();
    }
    analysis
}

/// Truncate to at most `len` characters on a char boundary.
fn snippet(text: &str, len: usize) -> String {
    text.chars().take(len).collect()
}

fn improve_prompt(title: &str, content: &str) -> String {
    format!(
        r#"You are helping improve a note. Fix any spelling errors and improve clarity while maintaining the original meaning and tone. Do NOT completely rewrite - just correct errors and improve clarity where needed.

Original Title: "{title}"
Original Content: "{content}"

Rules:
1. Fix spelling and grammar errors
2. Improve clarity if something is unclear
3. Keep the same tone and style
4. Don't add new information
5. Keep it concise - similar length to original

Respond in JSON format:
{{
  "improvedTitle": "corrected title here",
  "improvedContent": "corrected content here"
}}"#
    )
}

fn analyze_prompt(content: &str) -> String {
    format!(
        r#"Analyze this note and provide:
1. Suggested priority (URGENT, IMPORTANT, or MINOR)
2. A short category (max {max_category} chars, e.g., "Payment", "Meeting", "Personal")
3. Up to {max_tags} relevant tags
4. A brief summary if the note is long

Note: "{content}"

Respond in JSON format:
{{
  "suggestedPriority": "URGENT" | "IMPORTANT" | "MINOR",
  "category": "string",
  "tags": ["tag1", "tag2"],
  "summary": "optional summary"
}}"#,
        max_category = defaults::MAX_CATEGORY_LEN,
        max_tags = defaults::MAX_AI_TAGS,
    )
}

fn daily_report_prompt(notes: &[Note]) -> String {
    let lines = notes
        .iter()
        .map(|n| {
            format!(
                "- [{}] {}: {}",
                n.priority,
                n.title,
                snippet(&n.content, defaults::REPORT_SNIPPET_LEN)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Generate a concise daily report based on today's activities:

{lines}

Create a brief summary highlighting:
1. Key accomplishments
2. Urgent items that need attention
3. Important tasks completed
4. Overview of the day

Keep it actionable and under {words} words."#,
        words = defaults::REPORT_DAILY_WORDS,
    )
}

fn weekly_report_prompt(notes: &[Note]) -> String {
    let lines = notes
        .iter()
        .map(|n| {
            format!(
                "- [{}] {}: {}",
                n.priority,
                n.created_at.format("%Y-%m-%d"),
                n.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Generate a weekly summary based on this week's activities:

{lines}

Provide:
1. Week's highlights
2. Productivity patterns
3. Areas of focus
4. Actionable insights for next week

Keep it strategic and under {words} words."#,
        words = defaults::REPORT_WEEKLY_WORDS,
    )
}

fn monthly_report_prompt(notes: &[Note]) -> String {
    use jotter_core::Priority;

    let urgent = notes.iter().filter(|n| n.priority == Priority::Urgent).count();
    let important = notes
        .iter()
        .filter(|n| n.priority == Priority::Important)
        .count();
    let minor = notes.iter().filter(|n| n.priority == Priority::Minor).count();

    let sample = notes
        .iter()
        .take(defaults::REPORT_MONTHLY_SAMPLE)
        .map(|n| format!("- {}", n.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Generate a monthly executive summary:

Total activities: {total}
Priority breakdown:
- Urgent: {urgent}
- Important: {important}
- Minor: {minor}

Sample activities:
{sample}

Provide:
1. Monthly achievements
2. Key insights
3. Time allocation analysis
4. Strategic recommendations

Keep it executive-level and under {words} words."#,
        total = notes.len(),
        words = defaults::REPORT_MONTHLY_WORDS,
    )
}
