use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the FlowPilot core and data layers.
#[derive(Error, Debug)]
pub enum FlowError {
    /// The target-application pattern is not a valid regular expression.
    #[error("Invalid target pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An audit record could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value or internal precondition is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the FlowPilot crates.
pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_pattern() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = FlowError::InvalidPattern {
            pattern: "(unclosed".to_string(),
            source,
        };
        assert!(err
            .to_string()
            .starts_with("Invalid target pattern \"(unclosed\""));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = FlowError::FileWrite {
            path: PathBuf::from("/ro/audit-2026-03-01.jsonl"),
            source: io_err,
        };
        assert_eq!(
            err.to_string(),
            "Failed to write file /ro/audit-2026-03-01.jsonl: read-only"
        );
    }

    #[test]
    fn test_error_source_chain_kept() {
        use std::error::Error as _;
        let err = FlowError::FileWrite {
            path: PathBuf::from("/ro/a.jsonl"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk full"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: FlowError = json_err.into();
        assert!(err.to_string().starts_with("Failed to encode JSON"));
    }
}
