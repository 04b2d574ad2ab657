//! Interface to the monitoring engine.
//!
//! The report only consumes typed result tables; how they are computed is
//! the engine's business. Each capability follows a fit-on-reference,
//! apply-to-analysis pattern, with the fitted state held in an associated
//! type so engines can carry whatever they need between the two steps.

use crate::config::MonitoringConfig;
use crate::error::{MonitorError, Result};
use crate::models::{
    ComparisonResult, ComparisonRow, Dataset, DriftResult, MetricResult, RankingRow,
    SummaryStatsResult,
};

/// A monitoring engine: performance estimation, realized performance,
/// univariate drift, drift/performance ranking and summary statistics.
pub trait MonitoringService: Send + Sync {
    /// Fitted confidence-based performance estimator.
    type Estimator: Send + Sync;
    /// Fitted realized-performance calculator.
    type Calculator: Send + Sync;
    /// Fitted univariate drift calculator.
    type DriftCalculator: Send + Sync;
    /// Fitted correlation ranker.
    type Ranker: Send + Sync;
    /// Fitted summary-statistics calculator.
    type StatsCalculator: Send + Sync;

    fn fit_estimator(&self, reference: &Dataset, config: &MonitoringConfig)
        -> Result<Self::Estimator>;

    /// Estimated metric for every reference and analysis chunk, without
    /// looking at the labels of the analysis data.
    fn estimate(&self, estimator: &Self::Estimator, analysis: &Dataset) -> Result<MetricResult>;

    fn fit_calculator(
        &self,
        reference: &Dataset,
        config: &MonitoringConfig,
    ) -> Result<Self::Calculator>;

    /// Realized metric for every reference and analysis chunk.
    fn calculate(&self, calculator: &Self::Calculator, analysis: &Dataset)
        -> Result<MetricResult>;

    /// Pair estimated and realized values by chunk key and period.
    ///
    /// Rows present in only one table are dropped; the estimated table's
    /// order is kept.
    fn compare(
        &self,
        estimated: &MetricResult,
        realized: &MetricResult,
    ) -> Result<ComparisonResult> {
        if estimated.name != realized.name {
            return Err(MonitorError::Calculation(format!(
                "cannot compare '{}' with '{}'",
                estimated.name, realized.name
            )));
        }
        let rows = estimated
            .rows
            .iter()
            .filter_map(|est| {
                realized
                    .rows
                    .iter()
                    .find(|r| r.chunk.key == est.chunk.key && r.chunk.period == est.chunk.period)
                    .map(|real| ComparisonRow {
                        chunk: est.chunk.clone(),
                        estimated: est.metric,
                        realized: real.metric,
                    })
            })
            .collect();
        Ok(ComparisonResult {
            metric: estimated.name.clone(),
            rows,
        })
    }

    fn fit_drift(
        &self,
        reference: &Dataset,
        config: &MonitoringConfig,
    ) -> Result<Self::DriftCalculator>;

    fn calculate_drift(
        &self,
        calculator: &Self::DriftCalculator,
        analysis: &Dataset,
    ) -> Result<DriftResult>;

    /// Fit a ranker on the reference slice of a realized-performance table.
    fn fit_ranker(&self, reference_performance: &MetricResult) -> Result<Self::Ranker>;

    /// Rank drift columns by how closely they track performance change.
    ///
    /// Engines return rows ordered by descending correlation; callers should
    /// not rely on it blindly.
    fn rank(
        &self,
        ranker: &Self::Ranker,
        drift: &DriftResult,
        performance: &MetricResult,
    ) -> Result<Vec<RankingRow>>;

    fn fit_summary_stats(
        &self,
        reference: &Dataset,
        config: &MonitoringConfig,
    ) -> Result<Self::StatsCalculator>;

    fn calculate_summary(
        &self,
        calculator: &Self::StatsCalculator,
        analysis: &Dataset,
    ) -> Result<SummaryStatsResult>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
