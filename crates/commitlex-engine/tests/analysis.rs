//! End-to-end engine scenarios: annotate a fixed corpus, then run all four
//! analyses against it.

use commitlex_core::{
    AnnotatedCommit, Commit, CompareParams, KwicQuery, NgramParams, SearchType, SortType,
};
use commitlex_engine::annotate::{annotate_commits, RuleAnnotator};
use commitlex_engine::authors::aggregate_authors;
use commitlex_engine::compare::compare_corpora;
use commitlex_engine::kwic::search;
use commitlex_engine::ngram::extract_ngrams;

fn fixture_corpus() -> Vec<AnnotatedCommit> {
    let commits = vec![
        commit("a1", "alice", "alice@acme.com", "fix parser bug in tokenizer"),
        commit("a2", "alice", "alice@acme.com", "fix parser crash on empty input"),
        commit("b1", "bob", "bob@acme.com", "add parser tests for #42"),
        commit("a3", "alice", "alice@acme.com", "refactor tokenizer internals"),
    ];
    annotate_commits(&RuleAnnotator::new(), &commits).unwrap()
}

fn commit(hash: &str, author: &str, email: &str, message: &str) -> Commit {
    Commit {
        hash: hash.into(),
        author: author.into(),
        email: email.into(),
        message: message.into(),
        timestamp: 1700000000,
        repository: "acme/api".into(),
    }
}

#[test]
fn ngram_table_properties_hold_on_fixture() {
    let corpus = fixture_corpus();
    let table = extract_ngrams(&corpus, &NgramParams { n: 1, min_frequency: 2 }).unwrap();

    // parser x3, then fix x2 / tokenizer x2 in lexicographic order.
    let entries: Vec<(&str, u32, u32)> = table
        .iter()
        .map(|r| (r.ngram.as_str(), r.frequency, r.rank))
        .collect();
    assert_eq!(
        entries,
        vec![("parser", 3, 1), ("fix", 2, 2), ("tokenizer", 2, 3)]
    );
}

#[test]
fn bigrams_reflect_content_token_adjacency() {
    let corpus = fixture_corpus();
    let table = extract_ngrams(&corpus, &NgramParams { n: 2, min_frequency: 2 }).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].ngram, "fix parser");
    assert_eq!(table[0].frequency, 2);
}

#[test]
fn kwic_and_ngrams_agree_on_the_same_corpus() {
    let corpus = fixture_corpus();
    let matches = search(
        &corpus,
        &KwicQuery {
            value: "parser".into(),
            search_type: SearchType::Token,
            window_size: 2,
            sort_type: SortType::NextTokenFrequency,
        },
    )
    .unwrap();

    assert_eq!(matches.len(), 3);
    for m in &matches {
        assert!(m.left_context.len() <= 2);
        assert!(m.right_context.len() <= 2);
        let metric = m.sort_metric.as_ref().unwrap();
        assert_eq!(metric.label, "next_token_frequency");
    }
    // Followers of "parser": "bug", "crash", "tests", all unique, so the
    // stable sort preserves sequential order.
    let hashes: Vec<&str> = matches.iter().map(|m| m.commit_hash.as_str()).collect();
    assert_eq!(hashes, ["a1", "a2", "b1"]);
}

#[test]
fn entity_search_finds_issue_reference() {
    let corpus = fixture_corpus();
    let matches = search(
        &corpus,
        &KwicQuery {
            value: "issue".into(),
            search_type: SearchType::Entity,
            window_size: 1,
            sort_type: SortType::Sequential,
        },
    )
    .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].keyword, "#42");
    assert_eq!(matches[0].left_context, vec!["for".to_string()]);
}

#[test]
fn self_comparison_shares_everything_in_bucket() {
    let corpus = fixture_corpus();
    let params = CompareParams {
        n_values: vec![1],
        step_size: 10,
        max_rank: 10,
        min_frequency_q: 2,
        min_frequency_k: 2,
    };
    let comparisons = compare_corpora(&corpus, &corpus, &params).unwrap();
    assert_eq!(comparisons.len(), 1);
    let step = &comparisons[0].steps[0];
    assert_eq!(step.q_ngrams, step.k_ngrams);
    assert_eq!(step.common_count, step.q_ngrams);
}

#[test]
fn results_serialize_with_camel_case_keys() {
    let corpus = fixture_corpus();

    let matches = search(
        &corpus,
        &KwicQuery {
            value: "parser".into(),
            search_type: SearchType::Token,
            window_size: 1,
            sort_type: SortType::NextTokenFrequency,
        },
    )
    .unwrap();
    let json = serde_json::to_value(&matches).unwrap();
    assert_eq!(json[0]["keyword"], "parser");
    assert_eq!(json[0]["sortMetric"]["label"], "next_token_frequency");
    assert!(json[0]["commitHash"].is_string());

    let params = CompareParams {
        n_values: vec![1],
        step_size: 10,
        max_rank: 10,
        min_frequency_q: 2,
        min_frequency_k: 2,
    };
    let comparisons = compare_corpora(&corpus, &corpus, &params).unwrap();
    let json = serde_json::to_value(&comparisons).unwrap();
    assert_eq!(json[0]["n"], 1);
    assert_eq!(json[0]["steps"][0]["rankStart"], 1);
    assert_eq!(
        json[0]["steps"][0]["commonCount"],
        json[0]["steps"][0]["qNgrams"]
    );
}

#[test]
fn author_stats_account_for_every_commit() {
    let corpus = fixture_corpus();
    let stats = aggregate_authors(&corpus, 20);

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].author, "alice");
    assert_eq!(stats[0].commit_count, 3);
    assert_eq!(stats[1].author, "bob");
    let total: u32 = stats.iter().map(|s| s.commit_count).sum();
    assert_eq!(total as usize, corpus.len());
    assert!(stats[0].common_words.contains(&"parser".to_string()));
}
