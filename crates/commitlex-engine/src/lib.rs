//! Commit text analysis: KWIC concordances, n-gram tables, corpus
//! comparison, and author statistics.
//!
//! Every operation is a pure, side-effect-free function over a read-only
//! `&[AnnotatedCommit]` snapshot; none performs I/O and none blocks, so
//! KWIC, n-gram extraction, and author aggregation for the same corpus may
//! run as independent parallel tasks. The comparator only needs both input
//! tables materialized first.

pub mod annotate;
pub mod authors;
pub mod compare;
pub mod kwic;
pub mod ngram;
