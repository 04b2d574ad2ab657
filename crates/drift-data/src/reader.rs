//! CSV loading for the reference and analysis datasets.
//!
//! Both files share one schema (see [`REQUIRED_COLUMNS`]); extra columns are
//! ignored. Rows are converted into [`EventRecord`]s and sorted by
//! timestamp.

use std::fs::File;
use std::path::Path;

use drift_core::error::{MonitorError, Result};
use drift_core::models::{Dataset, EventRecord, REQUIRED_COLUMNS};
use drift_core::time_utils::TimezoneHandler;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

// ── Row schema ────────────────────────────────────────────────────────────────

/// One CSV row as written on disk, before timestamp resolution.
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    #[serde(deserialize_with = "de_flag")]
    is_fraud: bool,
    #[serde(deserialize_with = "de_flag")]
    predicted_fraud: bool,
    predicted_fraud_proba: f64,
    transaction_amount: f64,
    transaction_type: String,
    time_since_login_min: f64,
    #[serde(deserialize_with = "de_flag")]
    is_first_transaction: bool,
    user_tenure_months: f64,
}

/// Parse a boolean column written as `0/1`, `0.0/1.0` or `true/false`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

fn de_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean \"{}\"", raw)))
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load one dataset from `path`.
///
/// Fails before reading any row when the file is missing or a required
/// column is absent from the header, so no partial analysis can start.
pub fn load_dataset(path: &Path, name: &str, tz: &TimezoneHandler) -> Result<Dataset> {
    if !path.exists() {
        return Err(MonitorError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| MonitorError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, &e))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(MonitorError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| csv_error(path, &e))?;
        let line = row.position().map(|p| p.line());
        let parsed: CsvRow = row
            .deserialize(Some(&headers))
            .map_err(|e| MonitorError::CsvParse {
                path: path.to_path_buf(),
                line,
                message: e.to_string(),
            })?;
        records.push(to_record(parsed, path, line, tz)?);
    }

    if records.is_empty() {
        return Err(MonitorError::EmptyDataset(path.to_path_buf()));
    }

    records.sort_by_key(|r| r.timestamp);
    debug!("Loaded {} rows from {}", records.len(), path.display());
    info!(
        "{} dataset: {} records ({} to {})",
        name,
        records.len(),
        records[0].timestamp.format("%Y-%m-%d"),
        records[records.len() - 1].timestamp.format("%Y-%m-%d"),
    );

    Ok(Dataset::new(name, path, records).with_timezone(tz.default_tz()))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn csv_error(path: &Path, err: &csv::Error) -> MonitorError {
    MonitorError::CsvParse {
        path: path.to_path_buf(),
        line: err.position().map(|p| p.line()),
        message: err.to_string(),
    }
}

fn to_record(
    row: CsvRow,
    path: &Path,
    line: Option<u64>,
    tz: &TimezoneHandler,
) -> Result<EventRecord> {
    let timestamp = tz.parse_timestamp(&row.timestamp).ok_or_else(|| {
        let at = line.map(|l| format!(" at line {}", l)).unwrap_or_default();
        MonitorError::TimestampParse(format!(
            "\"{}\" in {}{}",
            row.timestamp,
            path.display(),
            at
        ))
    })?;

    if !(0.0..=1.0).contains(&row.predicted_fraud_proba) {
        return Err(MonitorError::CsvParse {
            path: path.to_path_buf(),
            line,
            message: format!(
                "predicted_fraud_proba {} is outside [0, 1]",
                row.predicted_fraud_proba
            ),
        });
    }

    Ok(EventRecord {
        timestamp,
        is_fraud: row.is_fraud,
        predicted_fraud: row.predicted_fraud,
        predicted_fraud_proba: row.predicted_fraud_proba,
        transaction_amount: row.transaction_amount,
        transaction_type: row.transaction_type,
        time_since_login_min: row.time_since_login_min,
        is_first_transaction: row.is_first_transaction,
        user_tenure_months: row.user_tenure_months,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
