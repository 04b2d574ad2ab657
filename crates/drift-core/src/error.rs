use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the fraud monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// An input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV file is missing one of the required columns.
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// A CSV row could not be decoded.
    #[error("Malformed CSV in {path} (line {}): {message}", display_line(.line))]
    CsvParse {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    /// A dataset contained a header but no records.
    #[error("Dataset is empty: {0}")]
    EmptyDataset(PathBuf),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A chunk key could not be mapped to a calendar month.
    #[error("Invalid chunk key: {0}")]
    InvalidChunkKey(String),

    /// A month label is not of the form `"april_2024"`.
    #[error("Invalid month label: {0}")]
    InvalidMonthLabel(String),

    /// The reference data cannot support fitting a calculator.
    #[error("Insufficient reference data: {0}")]
    InsufficientReferenceData(String),

    /// A calculator was asked to work on data it cannot handle.
    #[error("Calculation failed: {0}")]
    Calculation(String),

    /// The feature ranking table had no rows.
    #[error("Feature ranking is empty")]
    EmptyRanking,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn display_line(line: &Option<u64>) -> String {
    line.map(|l| l.to_string()).unwrap_or_else(|| "?".to_string())
}

/// Convenience alias used throughout the drift crates.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_not_found() {
        let err = MonitorError::FileNotFound(PathBuf::from("reference.csv"));
        assert_eq!(err.to_string(), "File not found: reference.csv");
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = MonitorError::FileRead {
            path: PathBuf::from("/data/analysis.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/analysis.csv"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = MonitorError::MissingColumn {
            path: PathBuf::from("analysis.csv"),
            column: "is_fraud".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required column 'is_fraud' in analysis.csv"
        );
    }

    #[test]
    fn test_error_display_csv_parse_with_line() {
        let err = MonitorError::CsvParse {
            path: PathBuf::from("reference.csv"),
            line: Some(12),
            message: "bad float".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed CSV in reference.csv (line 12): bad float"
        );
    }

    #[test]
    fn test_error_display_csv_parse_without_line() {
        let err = MonitorError::CsvParse {
            path: PathBuf::from("reference.csv"),
            line: None,
            message: "truncated".to_string(),
        };
        assert!(err.to_string().contains("(line ?)"));
    }

    #[test]
    fn test_error_display_chunk_key() {
        let err = MonitorError::InvalidChunkKey("Q2".to_string());
        assert_eq!(err.to_string(), "Invalid chunk key: Q2");
    }

    #[test]
    fn test_error_display_empty_ranking() {
        assert_eq!(MonitorError::EmptyRanking.to_string(), "Feature ranking is empty");
    }

    #[test]
    fn test_error_display_config() {
        let err = MonitorError::Config("unknown feature 'foo'".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown feature 'foo'");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: MonitorError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
