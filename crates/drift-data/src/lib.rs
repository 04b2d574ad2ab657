//! Data layer of the fraud monitor.
//!
//! Loads the reference and analysis CSV files, provides the baseline
//! monitoring engine, reduces result tables into report values and runs the
//! sequential pipeline.

pub mod aggregator;
pub mod analysis;
pub mod engine;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_support;

pub use drift_core as core;
