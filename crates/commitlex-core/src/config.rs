use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CommitlexError;

/// Top-level configuration loaded from `.commitlex.toml`.
///
/// CLI flags take precedence over config values, which take precedence
/// over the built-in defaults.
///
/// # Examples
///
/// ```
/// use commitlex_core::CommitlexConfig;
///
/// let config = CommitlexConfig::default();
/// assert_eq!(config.analysis.min_frequency, 2);
/// assert_eq!(config.ingest.max_commits, 500);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitlexConfig {
    /// Git history ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Per-corpus analysis defaults.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Two-corpus comparison defaults.
    #[serde(default)]
    pub compare: CompareConfig,
}

impl CommitlexConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CommitlexError::Io`] if the file cannot be read, or
    /// [`CommitlexError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use commitlex_core::CommitlexConfig;
    /// use std::path::Path;
    ///
    /// let config = CommitlexConfig::from_file(Path::new(".commitlex.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CommitlexError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CommitlexError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use commitlex_core::CommitlexConfig;
    ///
    /// let toml = r#"
    /// [analysis]
    /// min_frequency = 3
    /// "#;
    /// let config = CommitlexConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.analysis.min_frequency, 3);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CommitlexError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// A commented template for `commitlex init`.
    pub fn default_template() -> &'static str {
        r#"# commitlex configuration
# All values shown are the defaults.

[ingest]
# Maximum number of commits to read from history.
# max_commits = 500
# Only include commits from the last N days (unset: no cutoff).
# since_days = 365
# Include merge commits in the corpus.
# include_merges = false

[analysis]
# Default n-gram width (1-3).
# n = 2
# Drop n-grams occurring fewer times than this.
# min_frequency = 2
# Context tokens on each side of a KWIC keyword.
# window_size = 5
# Number of common words reported per author.
# common_words = 20

[compare]
# Width of each rank bucket.
# step_size = 10
# Highest rank considered.
# max_rank = 50
"#
    }
}

/// Settings for reading commits out of a local repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum commits to read (default: 500).
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
    /// Only include commits from the last N days (default: no cutoff).
    #[serde(default)]
    pub since_days: Option<u64>,
    /// Whether merge commits are part of the corpus (default: false).
    #[serde(default)]
    pub include_merges: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_commits: default_max_commits(),
            since_days: None,
            include_merges: false,
        }
    }
}

/// Per-corpus analysis defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Default n-gram width (default: 2).
    #[serde(default = "default_n")]
    pub n: u32,
    /// Default minimum n-gram frequency (default: 2).
    #[serde(default = "default_min_frequency")]
    pub min_frequency: u32,
    /// Default KWIC window size (default: 5).
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Common words reported per author (default: 20).
    #[serde(default = "default_common_words")]
    pub common_words: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n: default_n(),
            min_frequency: default_min_frequency(),
            window_size: default_window_size(),
            common_words: default_common_words(),
        }
    }
}

/// Two-corpus comparison defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Default rank bucket width (default: 10).
    #[serde(default = "default_step_size")]
    pub step_size: u32,
    /// Default highest rank considered (default: 50).
    #[serde(default = "default_max_rank")]
    pub max_rank: u32,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            max_rank: default_max_rank(),
        }
    }
}

fn default_max_commits() -> usize {
    500
}

fn default_n() -> u32 {
    2
}

fn default_min_frequency() -> u32 {
    2
}

fn default_window_size() -> usize {
    5
}

fn default_common_words() -> usize {
    20
}

fn default_step_size() -> u32 {
    10
}

fn default_max_rank() -> u32 {
    50
}
