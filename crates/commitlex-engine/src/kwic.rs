//! Keyword-in-context concordance search.
//!
//! Finds every token position matching a keyword, POS tag, or entity tag
//! query, collects window-bounded context on both sides, and orders the
//! matches sequentially or by the frequency of what follows the match.

use std::collections::HashMap;

use commitlex_core::{AnnotatedCommit, KwicMatch, KwicQuery, SearchType, SortMetric, SortType};
use commitlex_core::Result;
use tracing::debug;

/// Search one corpus for concordance lines.
///
/// Every matching token position across every commit yields one
/// [`KwicMatch`]; context is truncated at commit-message boundaries and at
/// `window_size` tokens per side. With a frequency-based sort type each
/// match carries a [`SortMetric`] naming the ranking basis; a match with no
/// following token gets the sentinel frequency 0. Frequency sorts are
/// stable: equal frequencies keep their sequential relative order.
///
/// An empty or unmatched query returns an empty sequence, not an error.
///
/// # Errors
///
/// Currently infallible (invalid search and sort types are unrepresentable
/// in [`KwicQuery`]) but returns `Result` so the service surface matches
/// the other engine operations.
///
/// # Examples
///
/// ```
/// use commitlex_core::{Commit, KwicQuery, SearchType, SortType};
/// use commitlex_engine::annotate::{annotate_commits, RuleAnnotator};
/// use commitlex_engine::kwic::search;
///
/// let commits = vec![Commit {
///     hash: "a1".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     message: "fix bug in parser".into(),
///     timestamp: 1,
///     repository: "acme/api".into(),
/// }];
/// let corpus = annotate_commits(&RuleAnnotator::new(), &commits).unwrap();
/// let matches = search(&corpus, &KwicQuery {
///     value: "bug".into(),
///     search_type: SearchType::Token,
///     window_size: 1,
///     sort_type: SortType::Sequential,
/// }).unwrap();
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].left_context, vec!["fix".to_string()]);
/// assert_eq!(matches[0].right_context, vec!["in".to_string()]);
/// ```
pub fn search(corpus: &[AnnotatedCommit], query: &KwicQuery) -> Result<Vec<KwicMatch>> {
    if query.value.trim().is_empty() {
        return Ok(Vec::new());
    }
    let start = std::time::Instant::now();

    let token_needle = query.value.to_lowercase();
    let tag_needle = query.value.to_uppercase();

    // Matches in encounter order, each paired with what follows it.
    let mut matches: Vec<KwicMatch> = Vec::new();
    let mut followers: Vec<Option<(String, String)>> = Vec::new();

    for annotated in corpus {
        let tokens = &annotated.tokens;
        for (i, token) in tokens.iter().enumerate() {
            let hit = match query.search_type {
                SearchType::Token => {
                    token.normalized == token_needle
                        || token.surface.eq_ignore_ascii_case(&query.value)
                }
                SearchType::Pos => token.pos_tag == tag_needle,
                SearchType::Entity => token.entity_tag.as_deref() == Some(tag_needle.as_str()),
            };
            if !hit {
                continue;
            }

            let left_start = i.saturating_sub(query.window_size);
            let right_end = (i + 1 + query.window_size).min(tokens.len());
            matches.push(KwicMatch {
                left_context: tokens[left_start..i].iter().map(|t| t.surface.clone()).collect(),
                keyword: token.surface.clone(),
                right_context: tokens[i + 1..right_end]
                    .iter()
                    .map(|t| t.surface.clone())
                    .collect(),
                commit_hash: annotated.commit.hash.clone(),
                sort_metric: None,
            });
            followers.push(
                tokens
                    .get(i + 1)
                    .map(|next| (next.normalized.clone(), next.pos_tag.clone())),
            );
        }
    }

    if query.sort_type.is_frequency_based() {
        attach_metrics_and_sort(&mut matches, &followers, query.sort_type);
    }

    debug!(
        query = %query.value,
        search_type = %query.search_type,
        sort_type = %query.sort_type,
        matches = matches.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "kwic search finished"
    );
    Ok(matches)
}

/// Count follower keys across all matches, attach the metric to each match,
/// then stable-sort descending so sequential order breaks ties.
fn attach_metrics_and_sort(
    matches: &mut Vec<KwicMatch>,
    followers: &[Option<(String, String)>],
    sort_type: SortType,
) {
    let key_of = |follower: &(String, String)| -> String {
        match sort_type {
            SortType::NextTokenFrequency => follower.0.clone(),
            SortType::NextPosFrequency => follower.1.clone(),
            SortType::NextTokenPosFrequency => format!("{}/{}", follower.0, follower.1),
            SortType::Sequential => unreachable!("sequential sort carries no metric"),
        }
    };

    let mut frequencies: HashMap<String, u32> = HashMap::new();
    for follower in followers.iter().flatten() {
        *frequencies.entry(key_of(follower)).or_default() += 1;
    }

    let label = sort_type.to_string();
    let mut paired: Vec<(u32, KwicMatch)> = std::mem::take(matches)
        .into_iter()
        .zip(followers)
        .map(|(mut m, follower)| {
            let value = follower
                .as_ref()
                .map(|f| frequencies[&key_of(f)])
                .unwrap_or(0);
            m.sort_metric = Some(SortMetric {
                label: label.clone(),
                value,
            });
            (value, m)
        })
        .collect();

    paired.sort_by_key(|(value, _)| std::cmp::Reverse(*value));
    *matches = paired.into_iter().map(|(_, m)| m).collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{annotate_commits, RuleAnnotator};
    use commitlex_core::Commit;

    fn corpus(messages: &[&str]) -> Vec<AnnotatedCommit> {
        let commits: Vec<Commit> = messages
            .iter()
            .enumerate()
            .map(|(i, message)| Commit {
                hash: format!("hash{i}"),
                author: "alice".into(),
                email: "alice@example.com".into(),
                message: (*message).into(),
                timestamp: i as i64,
                repository: "acme/api".into(),
            })
            .collect();
        annotate_commits(&RuleAnnotator::new(), &commits).unwrap()
    }

    fn query(value: &str, search_type: SearchType, window: usize, sort: SortType) -> KwicQuery {
        KwicQuery {
            value: value.into(),
            search_type,
            window_size: window,
            sort_type: sort,
        }
    }

    #[test]
    fn sequential_fixture_contexts() {
        let corpus = corpus(&["fix bug in parser", "fix another bug"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 1, SortType::Sequential),
        )
        .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].left_context, vec!["fix".to_string()]);
        assert_eq!(matches[0].right_context, vec!["in".to_string()]);
        assert_eq!(matches[0].commit_hash, "hash0");
        assert_eq!(matches[1].left_context, vec!["another".to_string()]);
        assert!(matches[1].right_context.is_empty());
        assert!(matches.iter().all(|m| m.sort_metric.is_none()));
    }

    #[test]
    fn window_bounds_hold_and_never_cross_commits() {
        let corpus = corpus(&["one two bug three four five", "bug alone"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 3, SortType::Sequential),
        )
        .unwrap();

        for m in &matches {
            assert!(m.left_context.len() <= 3);
            assert!(m.right_context.len() <= 3);
        }
        // First commit has only two tokens to the left of the match.
        assert_eq!(matches[0].left_context, vec!["one".to_string(), "two".into()]);
        // Second commit starts at the match; nothing leaks in from commit 1.
        assert!(matches[1].left_context.is_empty());
    }

    #[test]
    fn token_match_is_case_insensitive() {
        let corpus = corpus(&["Fix Bug"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 2, SortType::Sequential),
        )
        .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].keyword, "Bug");
    }

    #[test]
    fn pos_query_matches_tag() {
        let corpus = corpus(&["fix the parser"]);
        let matches = search(
            &corpus,
            &query("det", SearchType::Pos, 1, SortType::Sequential),
        )
        .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].keyword, "the");
    }

    #[test]
    fn entity_query_matches_tag() {
        let corpus = corpus(&["fix #42 properly", "close #42"]);
        let matches = search(
            &corpus,
            &query("issue", SearchType::Entity, 1, SortType::Sequential),
        )
        .unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.keyword == "#42"));
    }

    #[test]
    fn next_token_frequency_orders_and_attaches_metric() {
        // "bug" is followed by "in" twice and "today" once.
        let corpus = corpus(&["fix bug in parser", "found bug in lexer", "saw bug today"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 1, SortType::NextTokenFrequency),
        )
        .unwrap();

        assert_eq!(matches.len(), 3);
        let metrics: Vec<u32> = matches
            .iter()
            .map(|m| m.sort_metric.as_ref().unwrap().value)
            .collect();
        assert_eq!(metrics, vec![2, 2, 1]);
        assert!(matches
            .iter()
            .all(|m| m.sort_metric.as_ref().unwrap().label == "next_token_frequency"));
    }

    #[test]
    fn frequency_sort_is_stable_on_ties() {
        let corpus = corpus(&["fix bug in parser", "found bug in lexer"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 1, SortType::NextTokenFrequency),
        )
        .unwrap();
        // Both matches have follower "in" (frequency 2); sequential order
        // must be preserved.
        assert_eq!(matches[0].commit_hash, "hash0");
        assert_eq!(matches[1].commit_hash, "hash1");
    }

    #[test]
    fn end_of_message_follower_gets_sentinel_zero() {
        let corpus = corpus(&["found a bug", "bug in parser"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 0, SortType::NextTokenFrequency),
        )
        .unwrap();
        assert_eq!(matches.len(), 2);
        // The match with a follower sorts first; the end-of-message match
        // carries the sentinel.
        assert_eq!(matches[0].sort_metric.as_ref().unwrap().value, 1);
        assert_eq!(matches[1].sort_metric.as_ref().unwrap().value, 0);
    }

    #[test]
    fn next_pos_frequency_keys_on_tag() {
        // Followers: "quickly" (ADV), "carefully" (ADV), "again"; two ADVs
        // outrank the odd one out.
        let corpus = corpus(&["patched quickly", "patched carefully", "patched again"]);
        let matches = search(
            &corpus,
            &query("patched", SearchType::Token, 1, SortType::NextPosFrequency),
        )
        .unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].sort_metric.as_ref().unwrap().value, 2);
        assert_eq!(matches[2].sort_metric.as_ref().unwrap().value, 1);
    }

    #[test]
    fn combination_frequency_distinguishes_same_surface_different_pos() {
        let corpus = corpus(&["bug in parser", "bug in lexer", "bug fix"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 1, SortType::NextTokenPosFrequency),
        )
        .unwrap();
        assert_eq!(matches[0].sort_metric.as_ref().unwrap().value, 2);
        assert_eq!(
            matches[0].sort_metric.as_ref().unwrap().label,
            "next_token_pos_frequency"
        );
    }

    #[test]
    fn empty_query_returns_empty() {
        let corpus = corpus(&["fix bug"]);
        let matches = search(
            &corpus,
            &query("  ", SearchType::Token, 1, SortType::Sequential),
        )
        .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn unmatched_query_returns_empty() {
        let corpus = corpus(&["fix bug"]);
        let matches = search(
            &corpus,
            &query("nonexistent", SearchType::Token, 1, SortType::Sequential),
        )
        .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn zero_window_yields_no_context() {
        let corpus = corpus(&["fix bug in parser"]);
        let matches = search(
            &corpus,
            &query("bug", SearchType::Token, 0, SortType::Sequential),
        )
        .unwrap();
        assert!(matches[0].left_context.is_empty());
        assert!(matches[0].right_context.is_empty());
    }
}
