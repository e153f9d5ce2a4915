//! Centralized default constants for the jotter system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// NOTES
// =============================================================================

/// Title substituted when a note is created with a blank title.
pub const UNTITLED_TITLE: &str = "Untitled Note";

// =============================================================================
// AI ENRICHMENT
// =============================================================================

/// Default Anthropic Messages API endpoint.
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default generation model.
pub const GEN_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Deadline for a single generation request (seconds). Expiry is handled
/// like a parse failure: the documented fallback applies.
pub const GEN_TIMEOUT_SECS: u64 = 30;

/// Category fallback when classification fails or returns nothing usable.
pub const FALLBACK_CATEGORY: &str = "General";

/// Maximum AI-suggested tags kept on a note.
pub const MAX_AI_TAGS: usize = 3;

/// Maximum AI-suggested category length in characters.
pub const MAX_CATEGORY_LEN: usize = 20;

// =============================================================================
// OUTPUT BUDGETS (max_tokens per request shape)
// =============================================================================

/// Classification requests.
pub const ANALYZE_MAX_TOKENS: u32 = 500;

/// Correction requests.
pub const IMPROVE_MAX_TOKENS: u32 = 800;

/// Daily report narrative.
pub const REPORT_DAILY_MAX_TOKENS: u32 = 1000;

/// Weekly report narrative.
pub const REPORT_WEEKLY_MAX_TOKENS: u32 = 1500;

/// Monthly report narrative.
pub const REPORT_MONTHLY_MAX_TOKENS: u32 = 2000;

// =============================================================================
// REPORT NARRATIVES
// =============================================================================

/// Word budgets per report period, stated in the prompts.
pub const REPORT_DAILY_WORDS: u32 = 200;
pub const REPORT_WEEKLY_WORDS: u32 = 300;
pub const REPORT_MONTHLY_WORDS: u32 = 400;

/// Content snippet length in daily report prompt lines.
pub const REPORT_SNIPPET_LEN: usize = 100;

/// Sample size of note titles included in the monthly prompt.
pub const REPORT_MONTHLY_SAMPLE: usize = 20;

/// Returned when the completion carries no usable text.
pub const EMPTY_COMPLETION_FALLBACK: &str = "No report generated";

/// Placeholders returned when narrative generation fails outright.
pub const REPORT_DAILY_PLACEHOLDER: &str = "Unable to generate report at this time.";
pub const REPORT_WEEKLY_PLACEHOLDER: &str = "Unable to generate weekly report at this time.";
pub const REPORT_MONTHLY_PLACEHOLDER: &str = "Unable to generate monthly report at this time.";

// =============================================================================
// HTTP SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 3000;

/// Request body size limit in bytes.
pub const BODY_LIMIT_BYTES: usize = 256 * 1024;
