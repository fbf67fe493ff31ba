//! Slack RCA — incident channel to root-cause report.
//!
//! Fetches a channel's full conversation tree, normalizes it into prompt text,
//! and runs a size-bounded map-reduce summarization on Bedrock.

// Core types
pub mod config;
pub mod constants;
pub mod error;
pub mod message;
pub mod report;

// Collaborators
pub mod bedrock;
pub mod jira;
pub mod provider;
pub mod slack;

// Pipeline
pub mod cancel;
pub mod processing;
pub mod processor;
pub mod tracing_init;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-exports for convenience
pub use error::{RcaError, RcaResult};
pub use processor::{Collaborators, SlackProcessor};
