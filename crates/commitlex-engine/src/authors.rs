//! Per-author stylistic aggregates.
//!
//! Groups commits by the exact (author, email) pair and computes
//! descriptive statistics: commit counts, message lengths, and each
//! author's most frequent content words. No identity resolution is
//! performed (distinct emails under the same display name are distinct
//! authors) and nothing is carried over between invocations.

use std::collections::HashMap;

use commitlex_core::{AnnotatedCommit, AuthorStat};
use tracing::debug;

#[derive(Default)]
struct Group {
    commit_count: u32,
    total_chars: u64,
    word_counts: HashMap<String, u32>,
}

/// Aggregate per-author statistics for one corpus.
///
/// Output is ordered by commit count descending, then author name
/// ascending, then email ascending. `common_words` holds up to
/// `common_words_limit` content words (alphabetic, non-stop, lowercased),
/// most frequent first with alphabetical tie-break. Message length is
/// measured in characters.
///
/// The sum of `commit_count` over the result always equals the corpus
/// size, and `avg_message_length * commit_count == total_chars` per
/// author.
///
/// # Examples
///
/// ```
/// use commitlex_core::Commit;
/// use commitlex_engine::annotate::{annotate_commits, RuleAnnotator};
/// use commitlex_engine::authors::aggregate_authors;
///
/// let commits = vec![Commit {
///     hash: "a1".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     message: "fix parser bug".into(),
///     timestamp: 1,
///     repository: "acme/api".into(),
/// }];
/// let corpus = annotate_commits(&RuleAnnotator::new(), &commits).unwrap();
/// let stats = aggregate_authors(&corpus, 20);
/// assert_eq!(stats.len(), 1);
/// assert_eq!(stats[0].commit_count, 1);
/// assert_eq!(stats[0].total_chars, 14);
/// ```
pub fn aggregate_authors(corpus: &[AnnotatedCommit], common_words_limit: usize) -> Vec<AuthorStat> {
    let start = std::time::Instant::now();
    let mut groups: HashMap<(String, String), Group> = HashMap::new();

    for annotated in corpus {
        let commit = &annotated.commit;
        let key = (commit.author.clone(), commit.email.clone());
        let group = groups.entry(key).or_default();
        group.commit_count += 1;
        group.total_chars += commit.message.chars().count() as u64;
        for token in &annotated.tokens {
            if token.is_alpha && !token.is_stop {
                *group
                    .word_counts
                    .entry(token.normalized.clone())
                    .or_default() += 1;
            }
        }
    }

    let mut stats: Vec<AuthorStat> = groups
        .into_iter()
        .map(|((author, email), group)| {
            let mut words: Vec<(String, u32)> = group.word_counts.into_iter().collect();
            words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            AuthorStat {
                author,
                email,
                commit_count: group.commit_count,
                avg_message_length: group.total_chars as f64 / f64::from(group.commit_count),
                total_chars: group.total_chars,
                common_words: words
                    .into_iter()
                    .take(common_words_limit)
                    .map(|(word, _)| word)
                    .collect(),
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.commit_count
            .cmp(&a.commit_count)
            .then_with(|| a.author.cmp(&b.author))
            .then_with(|| a.email.cmp(&b.email))
    });

    debug!(
        commits = corpus.len(),
        authors = stats.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "aggregated author statistics"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{annotate_commits, RuleAnnotator};
    use commitlex_core::Commit;

    fn corpus(commits: &[(&str, &str, &str)]) -> Vec<AnnotatedCommit> {
        let commits: Vec<Commit> = commits
            .iter()
            .enumerate()
            .map(|(i, (author, email, message))| Commit {
                hash: format!("hash{i}"),
                author: (*author).into(),
                email: (*email).into(),
                message: (*message).into(),
                timestamp: i as i64,
                repository: "acme/api".into(),
            })
            .collect();
        annotate_commits(&RuleAnnotator::new(), &commits).unwrap()
    }

    #[test]
    fn groups_by_exact_author_email_pair() {
        let corpus = corpus(&[
            ("alice", "alice@work.com", "fix bug"),
            ("alice", "alice@home.net", "fix crash"),
            ("alice", "alice@work.com", "add tests"),
        ]);
        let stats = aggregate_authors(&corpus, 20);

        // Same display name, different email: two distinct authors.
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].email, "alice@work.com");
        assert_eq!(stats[0].commit_count, 2);
        assert_eq!(stats[1].email, "alice@home.net");
        assert_eq!(stats[1].commit_count, 1);
    }

    #[test]
    fn commit_counts_sum_to_corpus_size() {
        let corpus = corpus(&[
            ("alice", "a@x.com", "fix bug"),
            ("bob", "b@x.com", "add parser"),
            ("carol", "c@x.com", "update docs"),
            ("bob", "b@x.com", "fix lexer"),
        ]);
        let stats = aggregate_authors(&corpus, 20);
        let total: u32 = stats.iter().map(|s| s.commit_count).sum();
        assert_eq!(total as usize, corpus.len());
    }

    #[test]
    fn average_times_count_equals_total_chars() {
        let corpus = corpus(&[
            ("alice", "a@x.com", "fix bug"),
            ("alice", "a@x.com", "refactor the parser"),
        ]);
        let stats = aggregate_authors(&corpus, 20);
        let s = &stats[0];
        let product = s.avg_message_length * f64::from(s.commit_count);
        assert!((product - s.total_chars as f64).abs() < 1e-9);
        assert_eq!(s.total_chars, 7 + 19);
    }

    #[test]
    fn common_words_are_ranked_with_alphabetical_tie_break() {
        let corpus = corpus(&[
            ("alice", "a@x.com", "parser parser zeta alpha"),
            ("alice", "a@x.com", "parser"),
        ]);
        let stats = aggregate_authors(&corpus, 20);
        assert_eq!(
            stats[0].common_words,
            vec!["parser".to_string(), "alpha".into(), "zeta".into()]
        );
    }

    #[test]
    fn common_words_respect_limit_and_skip_stop_words() {
        let corpus = corpus(&[("alice", "a@x.com", "fix the bug in the parser")]);
        let stats = aggregate_authors(&corpus, 2);
        assert_eq!(stats[0].common_words.len(), 2);
        assert!(!stats[0].common_words.contains(&"the".to_string()));
    }

    #[test]
    fn output_ordered_by_count_then_name() {
        let corpus = corpus(&[
            ("zoe", "z@x.com", "fix one"),
            ("zoe", "z@x.com", "fix two"),
            ("amy", "a@x.com", "fix three"),
            ("bob", "b@x.com", "fix four"),
        ]);
        let stats = aggregate_authors(&corpus, 20);
        let names: Vec<&str> = stats.iter().map(|s| s.author.as_str()).collect();
        assert_eq!(names, ["zoe", "amy", "bob"]);
    }

    #[test]
    fn empty_corpus_yields_no_stats() {
        assert!(aggregate_authors(&[], 20).is_empty());
    }

    #[test]
    fn message_length_counts_characters() {
        let corpus = corpus(&[("alice", "a@x.com", "naïve fix")]);
        let stats = aggregate_authors(&corpus, 20);
        assert_eq!(stats[0].total_chars, 9);
    }
}
