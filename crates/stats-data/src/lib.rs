//! Data layer for SynapseStats.
//!
//! Responsible for loading message files from the store directory into an
//! immutable snapshot, running the aggregation queries over it and writing
//! the resulting reports as CSV or JSON.

pub mod aggregator;
pub mod reader;
pub mod report;

pub use stats_core as core;
