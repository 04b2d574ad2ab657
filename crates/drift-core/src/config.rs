//! Monitoring configuration: which metric, tests and columns to track.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the standard fraud-model setup: monthly chunks, accuracy,
//! Kolmogorov–Smirnov for continuous and chi-squared for categorical
//! features, and average transaction amount as the summary statistic.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};
use crate::models::{feature_kind, FeatureKind};

/// Literal reported when no summary-statistic row signals anything.
pub const DEFAULT_FALLBACK_AMOUNT: f64 = 3069.8184;

/// Multiplier applied to the reference standard deviation for thresholds.
pub const DEFAULT_STD_MULTIPLIER: f64 = 3.0;

/// Significance level for p-value based drift alerts.
pub const DEFAULT_DRIFT_ALPHA: f64 = 0.05;

// ── Enumerated options ────────────────────────────────────────────────────────

/// Time-bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkPeriod {
    #[default]
    #[serde(rename = "month", alias = "m", alias = "M")]
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    #[default]
    ClassificationBinary,
}

/// Performance metric tracked by the estimator and the realized calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Accuracy,
    Precision,
    Recall,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuousMethod {
    #[default]
    KolmogorovSmirnov,
}

impl ContinuousMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ContinuousMethod::KolmogorovSmirnov => "kolmogorov_smirnov",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalMethod {
    #[default]
    Chi2,
}

impl CategoricalMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalMethod::Chi2 => "chi2",
        }
    }
}

/// A monitored model input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    fn new(name: &str, kind: FeatureKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

fn default_features() -> Vec<FeatureSpec> {
    vec![
        FeatureSpec::new("time_since_login_min", FeatureKind::Continuous),
        FeatureSpec::new("transaction_amount", FeatureKind::Continuous),
        FeatureSpec::new("transaction_type", FeatureKind::Categorical),
        FeatureSpec::new("is_first_transaction", FeatureKind::Categorical),
        FeatureSpec::new("user_tenure_months", FeatureKind::Continuous),
    ]
}

fn default_summary_columns() -> Vec<String> {
    vec!["transaction_amount".to_string()]
}

// ── MonitoringConfig ──────────────────────────────────────────────────────────

/// Options handed to every monitoring calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub chunk_period: ChunkPeriod,
    pub problem_type: ProblemType,
    pub metric: Metric,
    pub continuous_method: ContinuousMethod,
    pub categorical_method: CategoricalMethod,
    pub features: Vec<FeatureSpec>,
    /// Continuous columns whose per-chunk mean is tracked.
    pub summary_columns: Vec<String>,
    pub threshold_std_multiplier: f64,
    pub drift_alpha: f64,
    /// Reported when no summary row alerts or deviates; `null` reports
    /// "no signal" instead.
    pub fallback_amount: Option<f64>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            chunk_period: ChunkPeriod::default(),
            problem_type: ProblemType::default(),
            metric: Metric::default(),
            continuous_method: ContinuousMethod::default(),
            categorical_method: CategoricalMethod::default(),
            features: default_features(),
            summary_columns: default_summary_columns(),
            threshold_std_multiplier: DEFAULT_STD_MULTIPLIER,
            drift_alpha: DEFAULT_DRIFT_ALPHA,
            fallback_amount: Some(DEFAULT_FALLBACK_AMOUNT),
        }
    }
}

impl MonitoringConfig {
    /// Load and validate a JSON config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MonitorError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| MonitorError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MonitoringConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::default()),
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_std_multiplier.is_finite() && self.threshold_std_multiplier > 0.0) {
            return Err(MonitorError::Config(format!(
                "threshold_std_multiplier must be positive, got {}",
                self.threshold_std_multiplier
            )));
        }
        if !(self.drift_alpha > 0.0 && self.drift_alpha < 1.0) {
            return Err(MonitorError::Config(format!(
                "drift_alpha must be in (0, 1), got {}",
                self.drift_alpha
            )));
        }
        if self.features.is_empty() {
            return Err(MonitorError::Config("at least one feature is required".to_string()));
        }

        let mut seen = HashSet::new();
        for feature in &self.features {
            let Some(natural) = feature_kind(&feature.name) else {
                return Err(MonitorError::Config(format!(
                    "unknown feature '{}'",
                    feature.name
                )));
            };
            // Numeric columns may be binned as categories, not the reverse.
            if feature.kind == FeatureKind::Continuous && natural == FeatureKind::Categorical {
                return Err(MonitorError::Config(format!(
                    "feature '{}' is categorical",
                    feature.name
                )));
            }
            if !seen.insert(feature.name.as_str()) {
                return Err(MonitorError::Config(format!(
                    "feature '{}' listed twice",
                    feature.name
                )));
            }
        }

        for column in &self.summary_columns {
            if feature_kind(column) != Some(FeatureKind::Continuous) {
                return Err(MonitorError::Config(format!(
                    "summary column '{}' is not a continuous feature",
                    column
                )));
            }
        }

        if let Some(v) = self.fallback_amount {
            if !v.is_finite() {
                return Err(MonitorError::Config("fallback_amount must be finite".to_string()));
            }
        }
        Ok(())
    }

    /// Statistical test name used for a feature of the given kind.
    pub fn method_for(&self, kind: FeatureKind) -> &'static str {
        match kind {
            FeatureKind::Continuous => self.continuous_method.name(),
            FeatureKind::Categorical => self.categorical_method.name(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
