//! Univariate drift per monitored column.
//!
//! Every chunk is compared against the full reference sample: continuous
//! columns with the two-sample Kolmogorov–Smirnov statistic, categorical
//! columns with a chi-squared contingency test.

use std::collections::BTreeMap;

use drift_core::config::{ChunkPeriod, MonitoringConfig};
use drift_core::error::{MonitorError, Result};
use drift_core::models::{
    feature_kind, ColumnDrift, DataPeriod, Dataset, DriftResult, DriftRow, EventRecord,
    FeatureKind, FeatureValue, MetricValue,
};
use drift_core::statistics::{chi2_contingency, ks_two_sample};
use tracing::debug;

use super::chunking::{chunk_dataset, Chunk};
use super::Band;

// ── Column samples ────────────────────────────────────────────────────────────

/// Values of one column, in the shape its test needs.
#[derive(Debug, Clone)]
enum Sample {
    Continuous(Vec<f64>),
    Categorical(BTreeMap<String, usize>),
}

impl Sample {
    fn collect<'a>(
        column: &str,
        kind: FeatureKind,
        records: impl IntoIterator<Item = &'a EventRecord>,
    ) -> Self {
        let values = records.into_iter().filter_map(|r| r.feature(column));
        match kind {
            FeatureKind::Continuous => {
                Sample::Continuous(values.filter_map(|v| v.as_f64()).collect())
            }
            FeatureKind::Categorical => {
                let mut counts = BTreeMap::new();
                for value in values {
                    *counts.entry(category_label(value)).or_insert(0) += 1;
                }
                Sample::Categorical(counts)
            }
        }
    }

    /// Test `self` (a chunk) against `reference`: `(statistic, p_value)`.
    fn test_against(&self, reference: &Sample) -> (f64, f64) {
        match (reference, self) {
            (Sample::Continuous(r), Sample::Continuous(c)) => ks_two_sample(r, c),
            (Sample::Categorical(r), Sample::Categorical(c)) => chi2_contingency(r, c),
            // Both samples are built with the same kind.
            _ => (f64::NAN, f64::NAN),
        }
    }
}

/// Numeric columns treated as categorical are binned by their exact value.
fn category_label(value: FeatureValue) -> String {
    match value {
        FeatureValue::Categorical(s) => s,
        FeatureValue::Continuous(v) => v.to_string(),
    }
}

// ── Fitted columns ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct FittedColumn {
    name: String,
    kind: FeatureKind,
    method: &'static str,
    reference: Sample,
    band: Band,
    reference_rows: Vec<DriftRow>,
}

/// Drift calculator fitted on the reference dataset.
#[derive(Debug, Clone)]
pub struct UnivariateDriftCalculator {
    chunk_period: ChunkPeriod,
    alpha: f64,
    columns: Vec<FittedColumn>,
}

impl UnivariateDriftCalculator {
    pub fn fit(reference: &Dataset, config: &MonitoringConfig) -> Result<Self> {
        let chunks = chunk_dataset(reference, config.chunk_period, DataPeriod::Reference);
        if chunks.is_empty() {
            return Err(MonitorError::InsufficientReferenceData(
                "reference dataset has no chunks".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(config.features.len());
        for feature in &config.features {
            if feature_kind(&feature.name).is_none() {
                return Err(MonitorError::Calculation(format!(
                    "'{}' is not a feature column",
                    feature.name
                )));
            }
            let sample = Sample::collect(&feature.name, feature.kind, &reference.records);

            let stats: Vec<(f64, f64)> = chunks
                .iter()
                .map(|c| {
                    Sample::collect(&feature.name, feature.kind, c.records.iter().copied())
                        .test_against(&sample)
                })
                .collect();

            let band = match feature.kind {
                FeatureKind::Continuous => {
                    let values: Vec<f64> = stats.iter().map(|s| s.0).collect();
                    Band::from_reference(&values, config.threshold_std_multiplier, None)
                        .upper_only()
                }
                FeatureKind::Categorical => Band {
                    lower: None,
                    upper: None,
                },
            };

            let mut column = FittedColumn {
                name: feature.name.clone(),
                kind: feature.kind,
                method: config.method_for(feature.kind),
                reference: sample,
                band,
                reference_rows: Vec::new(),
            };
            column.reference_rows = chunks
                .iter()
                .zip(stats)
                .map(|(c, (stat, p))| column.row(c, stat, p, config.drift_alpha))
                .collect();

            debug!(
                "Fitted {} drift for '{}' on {} reference chunks",
                column.method,
                column.name,
                column.reference_rows.len()
            );
            columns.push(column);
        }

        Ok(Self {
            chunk_period: config.chunk_period,
            alpha: config.drift_alpha,
            columns,
        })
    }

    pub fn calculate(&self, analysis: &Dataset) -> Result<DriftResult> {
        let chunks = chunk_dataset(analysis, self.chunk_period, DataPeriod::Analysis);
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut rows = column.reference_rows.clone();
                rows.extend(chunks.iter().map(|c| {
                    let sample =
                        Sample::collect(&column.name, column.kind, c.records.iter().copied());
                    let (stat, p) = sample.test_against(&column.reference);
                    column.row(c, stat, p, self.alpha)
                }));
                ColumnDrift {
                    column_name: column.name.clone(),
                    method: column.method.to_string(),
                    rows,
                }
            })
            .collect();
        Ok(DriftResult { columns })
    }
}

impl FittedColumn {
    fn row(&self, chunk: &Chunk<'_>, statistic: f64, p_value: f64, alpha: f64) -> DriftRow {
        let period = chunk.info.period;
        let metric = match self.kind {
            FeatureKind::Continuous => self.band.apply(statistic, period),
            FeatureKind::Categorical => MetricValue {
                value: statistic,
                upper_threshold: None,
                lower_threshold: None,
                alert: period == DataPeriod::Analysis && p_value < alpha,
            },
        };
        DriftRow {
            chunk: chunk.info.clone(),
            metric,
            p_value,
        }
    }
}
