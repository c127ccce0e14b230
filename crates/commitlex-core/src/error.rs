use std::path::PathBuf;

/// Errors that can occur across the commitlex workspace.
///
/// Each variant wraps a specific failure domain. Library crates use this
/// type directly; the binary crate converts to `miette` diagnostics at the
/// boundary. Note that empty analysis results are never errors; only
/// malformed requests and upstream collaborator failures are.
///
/// # Examples
///
/// ```
/// use commitlex_core::CommitlexError;
///
/// let err = CommitlexError::InvalidQuery("n must be between 1 and 3".into());
/// assert!(err.to_string().contains("between 1 and 3"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CommitlexError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed analysis request, rejected before any computation.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Git history ingestion failure.
    #[error("git error: {0}")]
    Git(String),

    /// Token annotation backend failure. Distinct from an empty corpus:
    /// callers can tell "no input was available" from "no matches found".
    #[error("annotation error: {0}")]
    Annotation(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CommitlexError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn invalid_query_displays_reason() {
        let err = CommitlexError::InvalidQuery("step_size must be >= 1".into());
        assert_eq!(err.to_string(), "invalid query: step_size must be >= 1");
    }

    #[test]
    fn annotation_failure_is_distinct_from_git_failure() {
        let ann = CommitlexError::Annotation("backend unavailable".into());
        let git = CommitlexError::Git("repository not found".into());
        assert!(ann.to_string().starts_with("annotation error"));
        assert!(git.to_string().starts_with("git error"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = CommitlexError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert!(err.to_string().contains("/tmp/missing.toml"));
    }
}
