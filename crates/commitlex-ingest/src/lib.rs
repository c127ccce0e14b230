//! Commit ingestion for the analysis engine.
//!
//! Supplies the read-only, in-memory commit collections the engine
//! analyzes. The only built-in source is local git history; anything
//! network-facing lives outside this workspace.

pub mod history;
