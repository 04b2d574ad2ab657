use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

/// Column names every input CSV must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "timestamp",
    "is_fraud",
    "predicted_fraud",
    "predicted_fraud_proba",
    "transaction_amount",
    "transaction_type",
    "time_since_login_min",
    "is_first_transaction",
    "user_tenure_months",
];

/// Natural statistical type of a model input column, `None` for columns
/// that are not model inputs.
pub fn feature_kind(column: &str) -> Option<FeatureKind> {
    match column {
        "transaction_amount" | "time_since_login_min" | "user_tenure_months" => {
            Some(FeatureKind::Continuous)
        }
        "transaction_type" | "is_first_transaction" => Some(FeatureKind::Categorical),
        _ => None,
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// A single scored transaction read from a reference or analysis CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// UTC timestamp of the transaction.
    pub timestamp: DateTime<Utc>,
    /// Ground-truth fraud label.
    pub is_fraud: bool,
    /// Label predicted by the model.
    pub predicted_fraud: bool,
    /// Model score for the positive (fraud) class, in `[0, 1]`.
    pub predicted_fraud_proba: f64,
    pub transaction_amount: f64,
    pub transaction_type: String,
    pub time_since_login_min: f64,
    pub is_first_transaction: bool,
    pub user_tenure_months: f64,
}

impl EventRecord {
    /// Look up a model input by column name.
    ///
    /// Returns `None` for names that are not feature columns (including the
    /// timestamp and the label / prediction columns).
    pub fn feature(&self, name: &str) -> Option<FeatureValue> {
        let value = match name {
            "transaction_amount" => FeatureValue::Continuous(self.transaction_amount),
            "time_since_login_min" => FeatureValue::Continuous(self.time_since_login_min),
            "user_tenure_months" => FeatureValue::Continuous(self.user_tenure_months),
            "transaction_type" => FeatureValue::Categorical(self.transaction_type.clone()),
            "is_first_transaction" => {
                FeatureValue::Categorical(self.is_first_transaction.to_string())
            }
            _ => return None,
        };
        Some(value)
    }

    /// Probability that the model's own prediction is correct, taking the
    /// score at face value.
    pub fn prediction_confidence(&self) -> f64 {
        if self.predicted_fraud {
            self.predicted_fraud_proba
        } else {
            1.0 - self.predicted_fraud_proba
        }
    }

    /// Whether the prediction matches the ground truth.
    pub fn is_correct(&self) -> bool {
        self.is_fraud == self.predicted_fraud
    }
}

/// A feature value extracted from an [`EventRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Continuous(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Continuous(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }
}

/// Statistical type of a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Continuous,
    Categorical,
}

/// A loaded CSV file.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Human-readable name, e.g. `"reference"`.
    pub name: String,
    /// File the records were read from.
    pub source: PathBuf,
    /// Records sorted by timestamp.
    pub records: Vec<EventRecord>,
    /// Zone the naive timestamps were read in; monthly chunks follow its
    /// calendar.
    pub timezone: Tz,
}

impl Dataset {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        records: Vec<EventRecord>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            records,
            timezone: Tz::UTC,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── Chunks ────────────────────────────────────────────────────────────────────

/// Which dataset a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataPeriod {
    Reference,
    Analysis,
}

impl fmt::Display for DataPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataPeriod::Reference => write!(f, "reference"),
            DataPeriod::Analysis => write!(f, "analysis"),
        }
    }
}

/// Identity of one time bucket in a result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// Bucket key, `"YYYY-MM"` for monthly chunks.
    pub key: String,
    /// Position of the chunk within its period.
    pub index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period: DataPeriod,
    /// Number of records in the chunk.
    pub size: usize,
}

// ── Result tables ─────────────────────────────────────────────────────────────

/// A metric value together with its alerting band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
    pub upper_threshold: Option<f64>,
    pub lower_threshold: Option<f64>,
    pub alert: bool,
}

impl MetricValue {
    /// Build a value whose alert flag is derived from the thresholds.
    ///
    /// A value strictly outside the band raises an alert; missing bounds
    /// never do. NaN values never alert.
    pub fn with_thresholds(value: f64, lower: Option<f64>, upper: Option<f64>) -> Self {
        let above = upper.is_some_and(|u| value > u);
        let below = lower.is_some_and(|l| value < l);
        Self {
            value,
            upper_threshold: upper,
            lower_threshold: lower,
            alert: above || below,
        }
    }

    /// `value - upper_threshold`, when the upper bound is known.
    pub fn upper_deviation(&self) -> Option<f64> {
        self.upper_threshold.map(|u| self.value - u)
    }

    /// `lower_threshold - value`, when the lower bound is known.
    pub fn lower_deviation(&self) -> Option<f64> {
        self.lower_threshold.map(|l| l - self.value)
    }
}

/// One row of a [`MetricResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub chunk: ChunkInfo,
    pub metric: MetricValue,
}

/// Per-chunk values of a single metric (or a single summarized column).
///
/// Rows are ordered reference chunks first, then analysis chunks, each in
/// chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Metric or column name, e.g. `"accuracy"` or `"transaction_amount"`.
    pub name: String,
    pub rows: Vec<MetricRow>,
}

impl MetricResult {
    pub fn new(name: impl Into<String>, rows: Vec<MetricRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Copy of the table restricted to one period.
    pub fn filter_period(&self, period: DataPeriod) -> MetricResult {
        MetricResult {
            name: self.name.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.chunk.period == period)
                .cloned()
                .collect(),
        }
    }

    /// Rows whose alert flag is set, in table order.
    pub fn alerted_rows(&self) -> impl Iterator<Item = &MetricRow> {
        self.rows.iter().filter(|r| r.metric.alert)
    }

    /// Find the row for a chunk key.
    pub fn row(&self, key: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.chunk.key == key)
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.metric.value).collect()
    }
}

/// Estimated and realized values of the same metric for one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub chunk: ChunkInfo,
    pub estimated: MetricValue,
    pub realized: MetricValue,
}

/// Paired estimated-vs-realized performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub metric: String,
    pub rows: Vec<ComparisonRow>,
}

/// Drift of one column within one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftRow {
    pub chunk: ChunkInfo,
    /// Test statistic with its alerting band.
    pub metric: MetricValue,
    pub p_value: f64,
}

/// Per-chunk drift of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub column_name: String,
    /// Name of the statistical test, e.g. `"kolmogorov_smirnov"`.
    pub method: String,
    pub rows: Vec<DriftRow>,
}

impl ColumnDrift {
    /// Whether any chunk of the analysis period raised a drift alert.
    pub fn has_drifted(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.chunk.period == DataPeriod::Analysis && r.metric.alert)
    }
}

/// Univariate drift for all monitored columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub columns: Vec<ColumnDrift>,
}

impl DriftResult {
    pub fn column(&self, name: &str) -> Option<&ColumnDrift> {
        self.columns.iter().find(|c| c.column_name == name)
    }
}

/// Per-chunk summary statistics, one table per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatsResult {
    pub columns: Vec<MetricResult>,
}

impl SummaryStatsResult {
    pub fn column(&self, name: &str) -> Option<&MetricResult> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// One row of the feature ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    /// 1-based rank as reported by the ranker.
    pub rank: usize,
    pub column_name: String,
    /// Pearson correlation between drift and performance change.
    pub correlation: f64,
    pub p_value: f64,
    pub has_drifted: bool,
}

impl RankingRow {
    /// Ranking order: descending correlation, NaN rows last.
    pub fn by_correlation_desc(a: &Self, b: &Self) -> Ordering {
        match (a.correlation.is_nan(), b.correlation.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b
                .correlation
                .partial_cmp(&a.correlation)
                .unwrap_or(Ordering::Equal),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
