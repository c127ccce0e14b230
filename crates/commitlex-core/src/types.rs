use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommitlexError;

/// A single commit as supplied by an ingestion collaborator.
///
/// Immutable once ingested; the analysis engine only ever receives
/// read-only references to these.
///
/// # Examples
///
/// ```
/// use commitlex_core::Commit;
///
/// let commit = Commit {
///     hash: "abc123def".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     message: "fix: auth bug".into(),
///     timestamp: 1700000000,
///     repository: "acme/api".into(),
/// };
/// assert_eq!(commit.author, "alice");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Full commit hash, unique within a repository.
    pub hash: String,
    /// Author display name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Full commit message (subject and body).
    pub message: String,
    /// Unix timestamp of the commit.
    pub timestamp: i64,
    /// Repository the commit belongs to.
    pub repository: String,
}

/// One annotated token of a commit message.
///
/// Produced by an [`Annotator`] backend; `index` is the only ordering key
/// (sequence order equals message order).
///
/// [`Annotator`]: https://docs.rs/commitlex-engine
///
/// # Examples
///
/// ```
/// use commitlex_core::AnnotatedToken;
///
/// let token = AnnotatedToken {
///     surface: "Fix".into(),
///     normalized: "fix".into(),
///     pos_tag: "VERB".into(),
///     entity_tag: None,
///     index: 0,
///     is_alpha: true,
///     is_stop: false,
/// };
/// assert!(token.is_alpha && !token.is_stop);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedToken {
    /// Surface form as it appears in the message.
    pub surface: String,
    /// Lowercased form used for frequency counting.
    pub normalized: String,
    /// Coarse part-of-speech tag (UPOS-style, e.g. `VERB`, `NOUN`).
    pub pos_tag: String,
    /// Named-entity tag, if the token is part of an entity.
    pub entity_tag: Option<String>,
    /// Zero-based position within the message token sequence.
    pub index: usize,
    /// Whether the token is entirely alphabetic.
    pub is_alpha: bool,
    /// Whether the token is a stop word.
    pub is_stop: bool,
}

/// A commit together with its ordered token annotations.
///
/// Lifetime is scoped to one analysis request and never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedCommit {
    /// The underlying commit.
    pub commit: Commit,
    /// Ordered token sequence for `commit.message`.
    pub tokens: Vec<AnnotatedToken>,
}

/// One entry of a ranked n-gram frequency table.
///
/// Ranks are contiguous from 1 within a (corpus, n) table; ties on
/// frequency are broken by the n-gram text ascending so ranking is a pure
/// function of the corpus.
///
/// # Examples
///
/// ```
/// use commitlex_core::NgramRecord;
///
/// let record = NgramRecord { ngram: "fix bug".into(), frequency: 12, rank: 1 };
/// assert_eq!(record.rank, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramRecord {
    /// Space-joined normalized token sequence.
    pub ngram: String,
    /// Occurrences across the corpus.
    pub frequency: u32,
    /// 1-based rank within the table.
    pub rank: u32,
}

/// The metric attached to a KWIC match when a frequency-based sort was
/// requested, so callers can display the ranking basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortMetric {
    /// Name of the metric, e.g. `next_token_frequency`.
    pub label: String,
    /// Computed frequency; 0 when the match has no following token.
    pub value: u32,
}

/// One keyword-in-context concordance line.
///
/// # Examples
///
/// ```
/// use commitlex_core::KwicMatch;
///
/// let m = KwicMatch {
///     left_context: vec!["fix".into()],
///     keyword: "bug".into(),
///     right_context: vec!["in".into()],
///     commit_hash: "abc123de".into(),
///     sort_metric: None,
/// };
/// assert_eq!(m.keyword, "bug");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KwicMatch {
    /// Up to `window_size` surface tokens before the keyword, never
    /// crossing the commit-message boundary.
    pub left_context: Vec<String>,
    /// The matched token's surface form.
    pub keyword: String,
    /// Up to `window_size` surface tokens after the keyword.
    pub right_context: Vec<String>,
    /// Hash of the commit the match came from (non-owning back-reference).
    pub commit_hash: String,
    /// Present only for frequency-based sort types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_metric: Option<SortMetric>,
}

/// Descriptive statistics for one distinct (author, email) pair.
///
/// # Examples
///
/// ```
/// use commitlex_core::AuthorStat;
///
/// let stat = AuthorStat {
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     commit_count: 4,
///     avg_message_length: 18.5,
///     total_chars: 74,
///     common_words: vec!["fix".into(), "parser".into()],
/// };
/// assert_eq!(stat.commit_count, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStat {
    /// Author display name.
    pub author: String,
    /// Author email; distinct emails are distinct authors.
    pub email: String,
    /// Number of commits by this (author, email) pair.
    pub commit_count: u32,
    /// Mean message length in characters.
    pub avg_message_length: f64,
    /// Total message characters across the group.
    pub total_chars: u64,
    /// Most frequent content words, ties broken alphabetically.
    pub common_words: Vec<String>,
}

/// One rank bucket of a two-corpus n-gram comparison.
///
/// A step is emitted even when the intersection is empty: zero common
/// n-grams is a reportable result, not an omission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStep {
    /// First rank covered by this bucket (1-based, inclusive).
    pub rank_start: u32,
    /// Last rank covered by this bucket (inclusive; the final bucket is
    /// clipped to `max_rank`).
    pub rank_end: u32,
    /// Number of Q-side n-grams whose rank falls in the bucket.
    pub q_ngrams: usize,
    /// Number of K-side n-grams whose rank falls in the bucket.
    pub k_ngrams: usize,
    /// Sorted intersection of the two sides' n-gram texts.
    pub common_ngrams: Vec<String>,
    /// `common_ngrams.len()`.
    pub common_count: usize,
}

/// All comparison steps for one n value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramComparison {
    /// The n this comparison was computed for.
    pub n: u32,
    /// Steps covering `[1, max_rank]` in `step_size` buckets.
    pub steps: Vec<ComparisonStep>,
}

/// What a KWIC query matches against.
///
/// # Examples
///
/// ```
/// use commitlex_core::SearchType;
///
/// let st: SearchType = "pos".parse().unwrap();
/// assert_eq!(st, SearchType::Pos);
/// assert!("lemma".parse::<SearchType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Match the token's surface or normalized form, case-insensitive.
    #[default]
    Token,
    /// Match the token's part-of-speech tag.
    Pos,
    /// Match the token's named-entity tag.
    Entity,
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchType::Token => write!(f, "token"),
            SearchType::Pos => write!(f, "pos"),
            SearchType::Entity => write!(f, "entity"),
        }
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "token" => Ok(SearchType::Token),
            "pos" => Ok(SearchType::Pos),
            "entity" => Ok(SearchType::Entity),
            other => Err(format!("unknown search type: {other}")),
        }
    }
}

/// How KWIC matches are ordered.
///
/// # Examples
///
/// ```
/// use commitlex_core::SortType;
///
/// let st: SortType = "next_token_frequency".parse().unwrap();
/// assert_eq!(st, SortType::NextTokenFrequency);
/// assert_eq!(SortType::Sequential.to_string(), "sequential");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    /// Encounter order: commit iteration order, then token index.
    #[default]
    Sequential,
    /// Descending by frequency of the token following the match.
    NextTokenFrequency,
    /// Descending by frequency of the POS tag following the match.
    NextPosFrequency,
    /// Descending by frequency of the joint (token, POS) pair following
    /// the match.
    NextTokenPosFrequency,
}

impl SortType {
    /// Whether this sort attaches a [`SortMetric`] to each match.
    pub fn is_frequency_based(self) -> bool {
        self != SortType::Sequential
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortType::Sequential => write!(f, "sequential"),
            SortType::NextTokenFrequency => write!(f, "next_token_frequency"),
            SortType::NextPosFrequency => write!(f, "next_pos_frequency"),
            SortType::NextTokenPosFrequency => write!(f, "next_token_pos_frequency"),
        }
    }
}

impl FromStr for SortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(SortType::Sequential),
            "next_token_frequency" => Ok(SortType::NextTokenFrequency),
            "next_pos_frequency" => Ok(SortType::NextPosFrequency),
            "next_token_pos_frequency" | "next_token_pos_combination_frequency" => {
                Ok(SortType::NextTokenPosFrequency)
            }
            other => Err(format!("unknown sort type: {other}")),
        }
    }
}

/// Parameters of an n-gram table request.
///
/// # Examples
///
/// ```
/// use commitlex_core::NgramParams;
///
/// let params = NgramParams { n: 2, min_frequency: 2 };
/// assert!(params.validate().is_ok());
/// assert!(NgramParams { n: 4, min_frequency: 2 }.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramParams {
    /// Window width; 1, 2, or 3.
    pub n: u32,
    /// Entries occurring fewer times than this are dropped.
    pub min_frequency: u32,
}

impl NgramParams {
    /// Reject malformed parameters before any computation happens.
    ///
    /// # Errors
    ///
    /// Returns [`CommitlexError::InvalidQuery`] when `n` is outside 1..=3
    /// or `min_frequency` is zero.
    pub fn validate(&self) -> Result<(), CommitlexError> {
        if !(1..=3).contains(&self.n) {
            return Err(CommitlexError::InvalidQuery(format!(
                "n must be between 1 and 3, got {}",
                self.n
            )));
        }
        if self.min_frequency < 1 {
            return Err(CommitlexError::InvalidQuery(
                "min_frequency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A full KWIC request.
///
/// # Examples
///
/// ```
/// use commitlex_core::{KwicQuery, SearchType, SortType};
///
/// let query = KwicQuery {
///     value: "bug".into(),
///     search_type: SearchType::Token,
///     window_size: 5,
///     sort_type: SortType::Sequential,
/// };
/// assert_eq!(query.window_size, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KwicQuery {
    /// Keyword, POS tag, or entity tag to look for.
    pub value: String,
    /// What `value` matches against.
    pub search_type: SearchType,
    /// Maximum context tokens on each side of the keyword.
    pub window_size: usize,
    /// Ordering of the returned matches.
    pub sort_type: SortType,
}

/// Parameters of a two-corpus comparison request.
///
/// # Examples
///
/// ```
/// use commitlex_core::CompareParams;
///
/// let params = CompareParams {
///     n_values: vec![1, 2, 3],
///     step_size: 10,
///     max_rank: 50,
///     min_frequency_q: 2,
///     min_frequency_k: 2,
/// };
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareParams {
    /// The n values to compare, each in 1..=3.
    pub n_values: Vec<u32>,
    /// Width of each rank bucket.
    pub step_size: u32,
    /// Highest rank considered; the last bucket is clipped here.
    pub max_rank: u32,
    /// Minimum frequency filter applied to the Q-side table.
    pub min_frequency_q: u32,
    /// Minimum frequency filter applied to the K-side table.
    pub min_frequency_k: u32,
}

impl CompareParams {
    /// Reject malformed parameters before any computation happens.
    ///
    /// # Errors
    ///
    /// Returns [`CommitlexError::InvalidQuery`] when the step schedule or
    /// any per-n parameter set is invalid.
    pub fn validate(&self) -> Result<(), CommitlexError> {
        if self.n_values.is_empty() {
            return Err(CommitlexError::InvalidQuery(
                "at least one n value is required".into(),
            ));
        }
        for &n in &self.n_values {
            NgramParams {
                n,
                min_frequency: self.min_frequency_q,
            }
            .validate()?;
            NgramParams {
                n,
                min_frequency: self.min_frequency_k,
            }
            .validate()?;
        }
        if self.step_size < 1 {
            return Err(CommitlexError::InvalidQuery(
                "step_size must be at least 1".into(),
            ));
        }
        if self.max_rank < 1 {
            return Err(CommitlexError::InvalidQuery(
                "max_rank must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use commitlex_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
