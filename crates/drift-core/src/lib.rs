//! Shared types for the fraud-model monitor: records, result tables,
//! configuration, the monitoring-engine interface and small numeric and
//! time helpers.

pub mod config;
pub mod error;
pub mod formatting;
pub mod models;
pub mod service;
pub mod settings;
pub mod statistics;
pub mod time_utils;

pub use error::{MonitorError, Result};
