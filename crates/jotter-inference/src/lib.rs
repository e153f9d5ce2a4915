//! # jotter-inference
//!
//! AI enrichment layer for jotter: a generation backend for the Anthropic
//! Messages API, balanced-brace JSON extraction from completion text, and
//! the [`EnrichmentClient`] exposing correction, classification, and report
//! narrative operations with documented fallbacks.

pub mod anthropic;
pub mod enrichment;
pub mod extract;
pub mod mock;

pub use anthropic::AnthropicBackend;
pub use enrichment::EnrichmentClient;
pub use extract::{extract_json_object, parse_first_json};
pub use mock::MockBackend;
