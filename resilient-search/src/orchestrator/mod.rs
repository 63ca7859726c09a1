//! Search orchestrator: guarded fan-out, dedup, scoring, ranking.
//!
//! This module fans a query out to every provider concurrently, merges the
//! successful lists by normalised URL, interleaves them across providers so
//! no single provider dominates, and reports per-provider status.

pub mod dedup;
pub mod rank;
pub mod scoring;
pub mod search;
pub mod url_normalize;

pub use search::SearchOrchestrator;
