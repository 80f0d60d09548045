//! Target-application matching.

use regex::{Regex, RegexBuilder};

use crate::error::{FlowError, Result};
use crate::models::WindowObservation;

/// Pattern used when none is configured; matches VS Code and most forks.
pub const DEFAULT_TARGET_PATTERN: &str = "code";

/// Decides whether a foreground window belongs to the target application.
#[derive(Debug, Clone)]
pub struct FocusClassifier {
    pattern: Regex,
}

impl FocusClassifier {
    /// Compile `pattern` as a case-insensitive regex.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| FlowError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { pattern })
    }

    /// `true` when owner name or title matches. A missing observation never does.
    pub fn is_target(&self, observation: Option<&WindowObservation>) -> bool {
        observation.is_some_and(|obs| self.pattern.is_match(&obs.match_text()))
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}
