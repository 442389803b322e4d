//! suggestbot: diff-anchored code-review suggestions (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod analytics;
pub mod anchor;
pub mod annotations;
pub mod batch;
pub mod config;
pub mod constants;
pub mod diff;
pub mod env;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod providers;
pub mod publish;
