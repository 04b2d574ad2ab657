use drift_core::config::{ChunkPeriod, MonitoringConfig};
use drift_core::error::{MonitorError, Result};
use drift_core::models::{
    feature_kind, DataPeriod, Dataset, FeatureKind, MetricResult, MetricRow, SummaryStatsResult,
};
use drift_core::statistics::mean;

use super::chunking::{chunk_dataset, Chunk};
use super::Band;

#[derive(Debug, Clone)]
struct FittedSummary {
    column: String,
    band: Band,
    reference_rows: Vec<MetricRow>,
}

/// Per-chunk average of continuous columns, with bands fitted on the
/// reference chunk averages.
#[derive(Debug, Clone)]
pub struct SummaryStatsCalculator {
    chunk_period: ChunkPeriod,
    columns: Vec<FittedSummary>,
}

fn chunk_mean(column: &str, chunk: &Chunk<'_>) -> f64 {
    let values: Vec<f64> = chunk
        .records
        .iter()
        .filter_map(|r| r.feature(column).and_then(|v| v.as_f64()))
        .collect();
    mean(&values).unwrap_or(f64::NAN)
}

impl SummaryStatsCalculator {
    pub fn fit(reference: &Dataset, config: &MonitoringConfig) -> Result<Self> {
        let chunks = chunk_dataset(reference, config.chunk_period, DataPeriod::Reference);
        if chunks.is_empty() {
            return Err(MonitorError::InsufficientReferenceData(
                "reference dataset has no chunks".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(config.summary_columns.len());
        for column in &config.summary_columns {
            if feature_kind(column) != Some(FeatureKind::Continuous) {
                return Err(MonitorError::Calculation(format!(
                    "cannot average non-continuous column '{}'",
                    column
                )));
            }
            let means: Vec<f64> = chunks.iter().map(|c| chunk_mean(column, c)).collect();
            let band = Band::from_reference(&means, config.threshold_std_multiplier, None);
            let reference_rows = chunks
                .iter()
                .zip(&means)
                .map(|(c, m)| MetricRow {
                    chunk: c.info.clone(),
                    metric: band.apply(*m, DataPeriod::Reference),
                })
                .collect();
            columns.push(FittedSummary {
                column: column.clone(),
                band,
                reference_rows,
            });
        }

        Ok(Self {
            chunk_period: config.chunk_period,
            columns,
        })
    }

    pub fn calculate(&self, analysis: &Dataset) -> Result<SummaryStatsResult> {
        let chunks = chunk_dataset(analysis, self.chunk_period, DataPeriod::Analysis);
        let columns = self
            .columns
            .iter()
            .map(|fitted| {
                let mut rows = fitted.reference_rows.clone();
                rows.extend(chunks.iter().map(|c| MetricRow {
                    chunk: c.info.clone(),
                    metric: fitted
                        .band
                        .apply(chunk_mean(&fitted.column, c), DataPeriod::Analysis),
                }));
                MetricResult::new(fitted.column.clone(), rows)
            })
            .collect();
        Ok(SummaryStatsResult { columns })
    }
}
