//! Boundary contracts to the surrounding bot.
//!
//! The core never talks to the spreadsheet store or the plugin loader
//! directly; it sees them through these narrow traits so the whole
//! pipeline can run against in-memory doubles (see [`crate::testing`]).

use std::collections::HashSet;
use thiserror::Error;

/// Errors surfaced by a template store implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("template store unavailable: {0}")]
    Unavailable(String),
    #[error("template store query failed: {0}")]
    Query(String),
}

/// Read access to user-authored command templates.
///
/// Implementations may be slow or flaky (the production store is a
/// remote spreadsheet); the resolver and dispatcher degrade store
/// failures to "keyword unknown" rather than propagating them.
pub trait TemplateStore: Send + Sync {
    /// Candidate phrases registered for a custom keyword, possibly empty.
    fn lookup_templates(&self, keyword: &str) -> Result<Vec<String>, StoreError>;

    /// Every keyword users have defined at least one template for.
    fn known_custom_keywords(&self) -> Result<HashSet<String>, StoreError>;
}

/// Pre-resolution extension point for dynamically loaded commands.
///
/// Consulted with the raw joined trigger text before normalization; a
/// `Some` reply short-circuits dispatch entirely.
pub trait PluginResolver: Send + Sync {
    fn resolve_plugin_command(&self, text: &str) -> Option<String>;
}
