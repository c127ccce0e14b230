//! Token annotation for commit messages.
//!
//! The engine consumes tokens through the [`Annotator`] capability trait so
//! any NLP backend can be substituted without touching the analysis
//! algorithms. [`RuleAnnotator`] is the built-in backend: a deterministic
//! rule-based pipeline with coarse POS tags and commit-domain entity tags
//! (issue references, hashes, URLs, paths, versions).

use std::collections::HashSet;
use std::sync::OnceLock;

use commitlex_core::{AnnotatedCommit, AnnotatedToken, Commit, Result};
use regex::Regex;
use tracing::debug;

/// Capability interface: turn a raw message into an ordered token sequence.
///
/// Fallible so that an unavailable or partial backend surfaces as a distinct
/// failure kind rather than an empty token list indistinguishable from a
/// commit with no matches.
pub trait Annotator: Send + Sync {
    /// Annotate one message. Token `index` values must equal sequence order.
    fn annotate(&self, message: &str) -> Result<Vec<AnnotatedToken>>;
}

/// Annotate a whole corpus, pairing each commit with its token sequence.
///
/// # Errors
///
/// Propagates the first backend failure; a partial annotation is never
/// silently returned.
///
/// # Examples
///
/// ```
/// use commitlex_core::Commit;
/// use commitlex_engine::annotate::{annotate_commits, RuleAnnotator};
///
/// let commits = vec![Commit {
///     hash: "abc123de".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     message: "fix bug in parser".into(),
///     timestamp: 1700000000,
///     repository: "acme/api".into(),
/// }];
/// let corpus = annotate_commits(&RuleAnnotator::new(), &commits).unwrap();
/// assert_eq!(corpus[0].tokens.len(), 4);
/// ```
pub fn annotate_commits(
    annotator: &dyn Annotator,
    commits: &[Commit],
) -> Result<Vec<AnnotatedCommit>> {
    let start = std::time::Instant::now();
    let mut corpus = Vec::with_capacity(commits.len());
    for commit in commits {
        let tokens = annotator.annotate(&commit.message)?;
        corpus.push(AnnotatedCommit {
            commit: commit.clone(),
            tokens,
        });
    }
    debug!(
        commits = corpus.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "annotated corpus"
    );
    Ok(corpus)
}

/// Deterministic rule-based annotation backend.
///
/// # Examples
///
/// ```
/// use commitlex_engine::annotate::{Annotator, RuleAnnotator};
///
/// let annotator = RuleAnnotator::new();
/// let tokens = annotator.annotate("Fix #123 in src/parser.rs").unwrap();
/// assert_eq!(tokens[1].entity_tag.as_deref(), Some("ISSUE"));
/// assert_eq!(tokens[3].entity_tag.as_deref(), Some("PATH"));
/// ```
pub struct RuleAnnotator {
    issue: Regex,
    hash: Regex,
    url: Regex,
    path: Regex,
    version: Regex,
}

impl RuleAnnotator {
    /// Build the backend, compiling its entity patterns once.
    pub fn new() -> Self {
        Self {
            issue: Regex::new(r"^(?:#\d+|(?i:GH)-\d+)$").expect("issue pattern"),
            hash: Regex::new(r"^[0-9a-f]{7,40}$").expect("hash pattern"),
            url: Regex::new(r"^https?://\S+$").expect("url pattern"),
            path: Regex::new(r"^[\w.@-]+(?:/[\w.@-]+)+$").expect("path pattern"),
            version: Regex::new(r"^v?\d+\.\d+(?:\.\d+)?(?:-[0-9A-Za-z.]+)?$")
                .expect("version pattern"),
        }
    }

    fn entity_tag(&self, surface: &str) -> Option<String> {
        if self.issue.is_match(surface) {
            return Some("ISSUE".into());
        }
        if self.url.is_match(surface) {
            return Some("URL".into());
        }
        if self.version.is_match(surface) {
            return Some("VERSION".into());
        }
        // Require a digit so all-letter hex-alphabet words are not tagged.
        if self.hash.is_match(&surface.to_lowercase())
            && surface.chars().any(|c| c.is_ascii_digit())
        {
            return Some("HASH".into());
        }
        if self.path.is_match(surface) {
            return Some("PATH".into());
        }
        None
    }

    fn pos_tag(&self, surface: &str, normalized: &str, entity: Option<&str>, index: usize) -> String {
        if !surface.is_empty() && surface.chars().all(|c| c.is_ascii_punctuation()) {
            return "PUNCT".into();
        }
        match entity {
            Some("VERSION") => return "NUM".into(),
            Some(_) => return "PROPN".into(),
            None => {}
        }
        if surface.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
            && surface.chars().any(|c| c.is_ascii_digit())
        {
            return "NUM".into();
        }
        for (class, words) in CLOSED_CLASSES {
            if words.contains(&normalized) {
                return (*class).into();
            }
        }
        if verb_set().contains(normalized) {
            return "VERB".into();
        }
        if normalized.len() > 4 && (normalized.ends_with("ing") || normalized.ends_with("ed")) {
            return "VERB".into();
        }
        if normalized.len() > 3 && normalized.ends_with("ly") {
            return "ADV".into();
        }
        if normalized.len() > 4
            && ["ous", "ful", "ive", "able", "ible"]
                .iter()
                .any(|s| normalized.ends_with(s))
        {
            return "ADJ".into();
        }
        let mut chars = surface.chars();
        let capitalized = chars.next().is_some_and(|c| c.is_uppercase())
            && chars.all(|c| c.is_lowercase());
        if capitalized && index > 0 {
            return "PROPN".into();
        }
        "NOUN".into()
    }
}

impl Default for RuleAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator for RuleAnnotator {
    fn annotate(&self, message: &str) -> Result<Vec<AnnotatedToken>> {
        let text = preprocess(message);
        let mut tokens = Vec::new();
        for surface in tokenize(&text) {
            let normalized = surface.to_lowercase();
            let entity_tag = self.entity_tag(&surface);
            let index = tokens.len();
            let pos_tag = self.pos_tag(&surface, &normalized, entity_tag.as_deref(), index);
            let is_alpha = !surface.is_empty() && surface.chars().all(|c| c.is_alphabetic());
            let is_stop = is_alpha && stop_word_set().contains(normalized.as_str());
            tokens.push(AnnotatedToken {
                surface,
                normalized,
                pos_tag,
                entity_tag,
                index,
                is_alpha,
                is_stop,
            });
        }
        Ok(tokens)
    }
}

/// Collapse whitespace runs to single spaces and trim.
fn preprocess(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace split, then peel clause punctuation off token edges so that
/// `bug.` becomes `bug` `.` while `#123`, `v1.2.3`, and `src/main.rs` stay
/// whole.
fn tokenize(text: &str) -> Vec<String> {
    const DELIMS: &[char] = &[
        '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', '`',
    ];

    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        let mut leading = Vec::new();
        let mut core = chunk;
        while let Some(c) = core.chars().next() {
            if DELIMS.contains(&c) {
                leading.push(c.to_string());
                core = &core[c.len_utf8()..];
            } else {
                break;
            }
        }
        let mut trailing = Vec::new();
        while let Some(c) = core.chars().next_back() {
            if DELIMS.contains(&c) {
                trailing.push(c.to_string());
                core = &core[..core.len() - c.len_utf8()];
            } else {
                break;
            }
        }
        tokens.extend(leading);
        if !core.is_empty() {
            tokens.push(core.to_string());
        }
        tokens.extend(trailing.into_iter().rev());
    }
    tokens
}

const CLOSED_CLASSES: &[(&str, &[&str])] = &[
    (
        "DET",
        &[
            "a", "all", "an", "another", "any", "each", "every", "no", "some", "that", "the",
            "these", "this", "those",
        ],
    ),
    (
        "ADP",
        &[
            "about", "above", "across", "after", "against", "at", "before", "behind", "below",
            "between", "by", "during", "for", "from", "in", "inside", "into", "of", "off", "on",
            "onto", "out", "over", "per", "through", "to", "under", "until", "via", "with",
            "within", "without",
        ],
    ),
    (
        "PRON",
        &[
            "he", "her", "him", "his", "i", "it", "its", "me", "my", "our", "she", "their", "them",
            "they", "us", "we", "what", "which", "who", "you", "your",
        ],
    ),
    ("CCONJ", &["and", "but", "nor", "or", "so", "yet"]),
    (
        "AUX",
        &[
            "am", "are", "be", "been", "being", "can", "could", "did", "do", "does", "had", "has",
            "have", "is", "may", "might", "must", "shall", "should", "was", "were", "will",
            "would",
        ],
    ),
    ("PART", &["not"]),
];

/// Verbs common in commit subjects; the suffix heuristics cover the rest.
const COMMIT_VERBS: &[&str] = &[
    "add", "adds", "allow", "apply", "avoid", "bump", "change", "check", "clean", "create",
    "delete", "disable", "drop", "enable", "ensure", "extract", "fix", "fixes", "handle",
    "implement", "improve", "introduce", "make", "merge", "move", "prevent", "refactor", "remove",
    "rename", "replace", "revert", "rework", "simplify", "split", "support", "test", "tweak",
    "update", "upgrade", "use",
];

/// English stop words, matching the filtering the original token contract
/// exposed via `is_stop`. Content tokens are `is_alpha && !is_stop`.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "another",
    "any", "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "may", "me", "might", "more", "most", "must", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "onto", "or", "other", "our", "ours", "out", "over", "own", "per",
    "same", "shall", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "upon", "very", "via", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "within", "without", "would", "you",
    "your", "yours",
];

fn stop_word_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

fn verb_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| COMMIT_VERBS.iter().copied().collect())
}
