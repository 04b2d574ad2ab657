//! Async scheduling for the fraud monitor.
//!
//! Runs the monitoring calculators of a [`drift_core::service::MonitoringService`]
//! concurrently on the tokio blocking pool, or sequentially when requested.

pub mod orchestrator;

pub use drift_core as core;
pub use drift_data as data;
