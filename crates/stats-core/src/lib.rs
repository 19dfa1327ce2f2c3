//! Shared building blocks for SynapseStats.
//!
//! Holds the message record model, timestamp parsing, number formatting,
//! command-line settings and the common error type used by the data and
//! binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, StatsError};
