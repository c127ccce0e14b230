//! Frequency-ranked n-gram tables.
//!
//! Slides a width-n window over each commit's content tokens (alphabetic,
//! non-stop, lowercased), counts across the corpus, filters by minimum
//! frequency, and assigns contiguous ranks with a deterministic tie-break.

use std::collections::HashMap;

use commitlex_core::{AnnotatedCommit, NgramParams, NgramRecord, Result};
use tracing::debug;

/// Build the ranked n-gram frequency table for one corpus.
///
/// N-grams never cross commit boundaries: a commit's last token does not
/// combine with the next commit's first token. After counting, entries
/// below `min_frequency` are dropped, the rest are sorted by frequency
/// descending with ties broken by n-gram text ascending, and ranks 1..K
/// are assigned. Ranking is a pure function of the corpus text, never of
/// insertion order.
///
/// An empty table is a valid result, not an error.
///
/// # Errors
///
/// Returns [`CommitlexError::InvalidQuery`] for `n` outside 1..=3 or a
/// zero `min_frequency`, before any computation.
///
/// [`CommitlexError::InvalidQuery`]: commitlex_core::CommitlexError::InvalidQuery
///
/// # Examples
///
/// ```
/// use commitlex_core::{Commit, NgramParams};
/// use commitlex_engine::annotate::{annotate_commits, RuleAnnotator};
/// use commitlex_engine::ngram::extract_ngrams;
///
/// let commits = vec![
///     Commit {
///         hash: "a1".into(),
///         author: "alice".into(),
///         email: "alice@example.com".into(),
///         message: "fix bug in parser".into(),
///         timestamp: 1,
///         repository: "acme/api".into(),
///     },
///     Commit {
///         hash: "b2".into(),
///         author: "alice".into(),
///         email: "alice@example.com".into(),
///         message: "fix another bug".into(),
///         timestamp: 2,
///         repository: "acme/api".into(),
///     },
/// ];
/// let corpus = annotate_commits(&RuleAnnotator::new(), &commits).unwrap();
/// let table = extract_ngrams(&corpus, &NgramParams { n: 1, min_frequency: 2 }).unwrap();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table[0].ngram, "bug");
/// assert_eq!(table[1].ngram, "fix");
/// ```
pub fn extract_ngrams(
    corpus: &[AnnotatedCommit],
    params: &NgramParams,
) -> Result<Vec<NgramRecord>> {
    params.validate()?;
    let start = std::time::Instant::now();
    let n = params.n as usize;

    let mut counts: HashMap<String, u32> = HashMap::new();
    for commit in corpus {
        let content: Vec<&str> = commit
            .tokens
            .iter()
            .filter(|t| t.is_alpha && !t.is_stop)
            .map(|t| t.normalized.as_str())
            .collect();
        for window in content.windows(n) {
            *counts.entry(window.join(" ")).or_default() += 1;
        }
    }

    let mut entries: Vec<(String, u32)> = counts
        .into_iter()
        .filter(|(_, frequency)| *frequency >= params.min_frequency)
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let table: Vec<NgramRecord> = entries
        .into_iter()
        .zip(1u32..)
        .map(|((ngram, frequency), rank)| NgramRecord {
            ngram,
            frequency,
            rank,
        })
        .collect();

    debug!(
        n = params.n,
        min_frequency = params.min_frequency,
        commits = corpus.len(),
        ngrams = table.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "extracted n-gram table"
    );
    Ok(table)
}
