use std::collections::HashMap;

use drift_core::error::{MonitorError, Result};
use drift_core::models::{DataPeriod, DriftResult, MetricResult, RankingRow};
use drift_core::statistics::{mean, pearson, pearson_p_value};
use tracing::debug;

/// Ranks drift columns by the correlation between their per-chunk drift
/// statistic and the absolute change of performance from the reference
/// mean.
#[derive(Debug, Clone)]
pub struct CorrelationRanker {
    metric: String,
    reference_mean: f64,
}

impl CorrelationRanker {
    /// Fit on a performance table. Only reference-period rows are used, so
    /// passing the full table or its reference slice is equivalent.
    pub fn fit(reference_performance: &MetricResult) -> Result<Self> {
        let reference = reference_performance.filter_period(DataPeriod::Reference);
        let reference_mean = mean(&reference.values()).ok_or_else(|| {
            MonitorError::InsufficientReferenceData(format!(
                "no finite reference values for '{}'",
                reference_performance.name
            ))
        })?;
        debug!(
            "Fitted correlation ranker on '{}' (reference mean {:.4})",
            reference_performance.name, reference_mean
        );
        Ok(Self {
            metric: reference_performance.name.clone(),
            reference_mean,
        })
    }

    /// Rank all drift columns over the analysis chunks.
    ///
    /// Rows come back sorted by correlation, highest first; columns whose
    /// correlation is undefined sort last with a NaN correlation.
    pub fn rank(&self, drift: &DriftResult, performance: &MetricResult) -> Result<Vec<RankingRow>> {
        if performance.name != self.metric {
            return Err(MonitorError::Calculation(format!(
                "ranker was fitted on '{}' but got '{}'",
                self.metric, performance.name
            )));
        }

        let change: HashMap<&str, f64> = performance
            .rows
            .iter()
            .filter(|r| r.chunk.period == DataPeriod::Analysis)
            .map(|r| (r.chunk.key.as_str(), (r.metric.value - self.reference_mean).abs()))
            .collect();

        let mut rows: Vec<RankingRow> = drift
            .columns
            .iter()
            .map(|column| {
                let (x, y): (Vec<f64>, Vec<f64>) = column
                    .rows
                    .iter()
                    .filter(|r| r.chunk.period == DataPeriod::Analysis)
                    .filter_map(|r| change.get(r.chunk.key.as_str()).map(|c| (r.metric.value, *c)))
                    .unzip();
                let correlation = pearson(&x, &y).unwrap_or(f64::NAN);
                RankingRow {
                    rank: 0,
                    column_name: column.column_name.clone(),
                    correlation,
                    p_value: pearson_p_value(correlation, x.len()),
                    has_drifted: column.has_drifted(),
                }
            })
            .collect();

        rows.sort_by(RankingRow::by_correlation_desc);
        for (i, row) in rows.iter_mut().enumerate() {
            row.rank = i + 1;
        }
        Ok(rows)
    }
}
