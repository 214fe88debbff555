use std::io::ErrorKind;
use std::path::Path;

use log::{info, warn};

/// Server rules as plain text, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDocument(String);

impl RuleDocument {
    /// Returns `None` for blank text.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reads the rule document. A missing, unreadable or empty file disables
/// moderation instead of failing startup.
pub fn load_rules(path: &Path) -> Option<RuleDocument> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let rules = RuleDocument::new(text);
            match &rules {
                Some(rules) => info!(
                    "Loaded moderation rules from {} ({} characters)",
                    path.display(),
                    rules.as_str().len()
                ),
                None => warn!("Rule document {} is empty", path.display()),
            }
            rules
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Rule document {} not found", path.display());
            None
        }
        Err(e) => {
            warn!("Failed to read rule document {}: {e}", path.display());
            None
        }
    }
}
