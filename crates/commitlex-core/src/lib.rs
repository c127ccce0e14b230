//! Core types, configuration, and error handling for the commitlex workspace.
//!
//! This crate provides the shared foundation used by all other commitlex
//! crates:
//! - [`CommitlexError`] — unified error type using `thiserror`
//! - [`CommitlexConfig`] — configuration loaded from `.commitlex.toml`
//! - Data model: [`Commit`], [`AnnotatedToken`], [`AnnotatedCommit`],
//!   [`NgramRecord`], [`KwicMatch`], [`AuthorStat`], [`ComparisonStep`]
//! - Typed request parameters: [`NgramParams`], [`KwicQuery`], [`CompareParams`]

mod config;
mod error;
mod types;

pub use config::{AnalysisConfig, CommitlexConfig, CompareConfig, IngestConfig};
pub use error::CommitlexError;
pub use types::{
    AnnotatedCommit, AnnotatedToken, AuthorStat, Commit, CompareParams, ComparisonStep, KwicMatch,
    KwicQuery, NgramComparison, NgramParams, NgramRecord, OutputFormat, SearchType, SortMetric,
    SortType,
};

/// A convenience `Result` type for commitlex operations.
pub type Result<T> = std::result::Result<T, CommitlexError>;
