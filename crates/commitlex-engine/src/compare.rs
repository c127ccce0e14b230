//! Step-wise ranked comparison of two n-gram tables.
//!
//! Partitions the rank axis into contiguous buckets and reports, per
//! bucket, how many n-grams the two corpora share. A pure function of two
//! already-ranked tables, so the same comparator serves
//! repository-vs-repository, repository-vs-user, and user-vs-user pairs.

use std::collections::BTreeSet;

use commitlex_core::{
    AnnotatedCommit, CompareParams, ComparisonStep, NgramComparison, NgramParams, NgramRecord,
    Result,
};
use tracing::debug;

use crate::ngram::extract_ngrams;

/// Compare two ranked tables over the rank range `[1, max_rank]`.
///
/// Buckets are `step_size` wide; the last bucket is clipped to `max_rank`,
/// never dropped or padded. A step is emitted for every bucket even when
/// the intersection is empty. The tables' own rank fields are trusted;
/// they carry whatever min-frequency filtering was applied upstream.
///
/// # Errors
///
/// Returns [`CommitlexError::InvalidQuery`] for a zero `step_size` or
/// `max_rank`.
///
/// [`CommitlexError::InvalidQuery`]: commitlex_core::CommitlexError::InvalidQuery
///
/// # Examples
///
/// ```
/// use commitlex_core::NgramRecord;
/// use commitlex_engine::compare::compare_tables;
///
/// let table = |ngrams: &[&str]| -> Vec<NgramRecord> {
///     ngrams.iter().zip(1u32..).map(|(ngram, rank)| NgramRecord {
///         ngram: (*ngram).into(),
///         frequency: 10 - rank,
///         rank,
///     }).collect()
/// };
/// let steps = compare_tables(&table(&["a", "b", "c"]), &table(&["b", "c", "d"]), 3, 3).unwrap();
/// assert_eq!(steps.len(), 1);
/// assert_eq!(steps[0].common_ngrams, vec!["b".to_string(), "c".into()]);
/// assert_eq!(steps[0].common_count, 2);
/// ```
pub fn compare_tables(
    table_q: &[NgramRecord],
    table_k: &[NgramRecord],
    step_size: u32,
    max_rank: u32,
) -> Result<Vec<ComparisonStep>> {
    if step_size < 1 {
        return Err(commitlex_core::CommitlexError::InvalidQuery(
            "step_size must be at least 1".into(),
        ));
    }
    if max_rank < 1 {
        return Err(commitlex_core::CommitlexError::InvalidQuery(
            "max_rank must be at least 1".into(),
        ));
    }

    let mut steps = Vec::new();
    let mut rank_start = 1u32;
    loop {
        let rank_end = rank_start.saturating_add(step_size - 1).min(max_rank);

        let q_bucket: BTreeSet<&str> = bucket(table_q, rank_start, rank_end);
        let k_bucket: BTreeSet<&str> = bucket(table_k, rank_start, rank_end);
        let common_ngrams: Vec<String> = q_bucket
            .intersection(&k_bucket)
            .map(|ngram| (*ngram).to_string())
            .collect();

        steps.push(ComparisonStep {
            rank_start,
            rank_end,
            q_ngrams: q_bucket.len(),
            k_ngrams: k_bucket.len(),
            common_count: common_ngrams.len(),
            common_ngrams,
        });

        if rank_end == max_rank {
            break;
        }
        rank_start = rank_end + 1;
    }
    Ok(steps)
}

/// Build both tables for every requested n and compare them bucket-wise.
///
/// Each side gets its own min-frequency filter; results are grouped by n.
/// Empty corpora produce empty-but-valid step lists, not errors.
///
/// # Errors
///
/// Returns [`CommitlexError::InvalidQuery`] when the parameters fail
/// validation (see [`CompareParams::validate`]).
///
/// [`CommitlexError::InvalidQuery`]: commitlex_core::CommitlexError::InvalidQuery
pub fn compare_corpora(
    corpus_q: &[AnnotatedCommit],
    corpus_k: &[AnnotatedCommit],
    params: &CompareParams,
) -> Result<Vec<NgramComparison>> {
    params.validate()?;
    let start = std::time::Instant::now();

    let mut seen = BTreeSet::new();
    let mut comparisons = Vec::new();
    for &n in &params.n_values {
        if !seen.insert(n) {
            continue;
        }
        let table_q = extract_ngrams(
            corpus_q,
            &NgramParams {
                n,
                min_frequency: params.min_frequency_q,
            },
        )?;
        let table_k = extract_ngrams(
            corpus_k,
            &NgramParams {
                n,
                min_frequency: params.min_frequency_k,
            },
        )?;
        comparisons.push(NgramComparison {
            n,
            steps: compare_tables(&table_q, &table_k, params.step_size, params.max_rank)?,
        });
    }

    debug!(
        n_values = ?params.n_values,
        step_size = params.step_size,
        max_rank = params.max_rank,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "compared corpora"
    );
    Ok(comparisons)
}

fn bucket(table: &[NgramRecord], rank_start: u32, rank_end: u32) -> BTreeSet<&str> {
    table
        .iter()
        .filter(|record| record.rank >= rank_start && record.rank <= rank_end)
        .map(|record| record.ngram.as_str())
        .collect()
}
