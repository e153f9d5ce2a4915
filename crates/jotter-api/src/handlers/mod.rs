//! HTTP request handlers.

pub mod notes;
pub mod reports;
