//! Per-build session state.
//!
//! [`BuildSession`] replaces ambient per-build flags: warning collection
//! with one-time deduplication, the set of known document anchors, and the
//! image-map name counter all live here and are reset by constructing a
//! fresh session for the next build.

use std::collections::HashSet;

/// Mutable state scoped to one document build.
#[derive(Debug, Default)]
pub struct BuildSession {
    warnings: Vec<String>,
    warned_keys: HashSet<String>,
    anchors: HashSet<String>,
    map_counter: usize,
}

impl BuildSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a warning at most once per build for the given key.
    ///
    /// Repeated occurrences of the same problem (a bad font map, an unknown
    /// configured format) do not spam identical warnings.
    pub fn warn_once(&mut self, key: &str, message: impl Into<String>) {
        if self.warned_keys.insert(key.to_owned()) {
            self.warnings.push(message.into());
        }
    }

    /// Warnings recorded so far, in order.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Register an anchor id that exists in the document.
    pub fn add_anchor(&mut self, id: impl Into<String>) {
        self.anchors.insert(id.into());
    }

    /// Whether the document defines the given anchor id.
    #[must_use]
    pub fn has_anchor(&self, id: &str) -> bool {
        self.anchors.contains(id)
    }

    /// Next unique image-map name for this build (`map_0`, `map_1`, ...).
    pub fn next_map_name(&mut self) -> String {
        let name = format!("map_{}", self.map_counter);
        self.map_counter += 1;
        name
    }
}
