//! Non-fatal conditions collected during a run.
//!
//! Warnings (empty globs, unreadable files, dropped modules, missing icons)
//! and inference misses (a name looked like a special type but its shape did
//! not) never stop a run. They are logged through `tracing` as they happen and
//! handed back next to the catalog.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Inference,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub module: Option<String>,
    pub item: Option<String>,
    pub message: String,
}

/// Thread-safe collector shared by the stages of one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&self, module: Option<&str>, item: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(module = module, item = item, "{}", message);
        self.push(Severity::Warning, module, item, message);
    }

    pub fn infer(&self, item: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(item = item, "{}", message);
        self.push(Severity::Inference, None, Some(item), message);
    }

    fn push(&self, severity: Severity, module: Option<&str>, item: Option<&str>, message: String) {
        let diagnostic = Diagnostic {
            severity,
            module: module.map(str::to_string),
            item: item.map(str::to_string),
            message,
        };
        // A poisoned lock still holds valid entries.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, sorted and deduplicated.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        let mut entries = self
            .entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|e| e.into_inner().clone());
        entries.sort();
        entries.dedup();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_sorted_and_deduplicated() {
        let diagnostics = Diagnostics::new();
        diagnostics.infer("UserConnection", "no edges field");
        diagnostics.warn(Some("users"), None, "glob matched nothing");
        diagnostics.warn(Some("users"), None, "glob matched nothing");

        let entries = diagnostics.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[1].item.as_deref(), Some("UserConnection"));
    }

    #[test]
    fn test_poisoned_lock_keeps_entries() {
        let diagnostics = std::sync::Arc::new(Diagnostics::new());
        diagnostics.warn(Some("users"), None, "icon missing");

        let poisoner = std::sync::Arc::clone(&diagnostics);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the collector");
        })
        .join();
        assert!(result.is_err());
        assert!(diagnostics.entries.is_poisoned());

        diagnostics.infer("UserConnection", "no edges field");
        assert_eq!(diagnostics.len(), 2);
        assert!(!diagnostics.is_empty());
        assert_eq!(diagnostics.snapshot().len(), 2);
    }
}
