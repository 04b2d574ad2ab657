//! Presentation layer of the fraud monitor.
//!
//! Provides themes, the text and JSON reports, and best-effort terminal
//! charts of the result tables built on top of [`ratatui`].

pub mod display;
pub mod plots;
pub mod report;
pub mod themes;

pub use drift_core as core;
