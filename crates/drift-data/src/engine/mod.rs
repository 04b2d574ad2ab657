//! Baseline in-process monitoring engine.
//!
//! A compact implementation of [`MonitoringService`] so the pipeline runs
//! without an external library: monthly chunks, standard-deviation alert
//! bands fitted on reference chunks, confidence-based estimation, KS and
//! chi-squared drift, and Pearson correlation ranking.

mod chunking;
mod drift;
mod performance;
mod ranker;
mod summary_stats;

pub use chunking::{chunk_by_month, chunk_dataset, Chunk};
pub use drift::UnivariateDriftCalculator;
pub use performance::{
    estimated_metric, realized_metric, ConfidenceEstimator, RealizedPerformanceCalculator,
};
pub use ranker::CorrelationRanker;
pub use summary_stats::SummaryStatsCalculator;

use drift_core::config::MonitoringConfig;
use drift_core::error::Result;
use drift_core::models::{
    DataPeriod, Dataset, DriftResult, MetricResult, MetricValue, RankingRow, SummaryStatsResult,
};
use drift_core::service::MonitoringService;
use drift_core::statistics::std_thresholds;

// ── Band ──────────────────────────────────────────────────────────────────────

/// Alerting band fitted on the per-chunk values of the reference period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Band {
    /// `mean ± multiplier·σ` of `reference`, optionally clamped.
    pub fn from_reference(reference: &[f64], multiplier: f64, clamp: Option<(f64, f64)>) -> Self {
        let (lower, upper) = std_thresholds(reference, multiplier, clamp);
        Self { lower, upper }
    }

    /// Drop the lower bound, for statistics where only growth matters.
    pub fn upper_only(self) -> Self {
        Self {
            lower: None,
            upper: self.upper,
        }
    }

    /// Wrap a chunk value. Reference chunks define the band and never alert.
    pub fn apply(&self, value: f64, period: DataPeriod) -> MetricValue {
        let metric = MetricValue::with_thresholds(value, self.lower, self.upper);
        match period {
            DataPeriod::Reference => MetricValue {
                alert: false,
                ..metric
            },
            DataPeriod::Analysis => metric,
        }
    }
}

// ── BaselineService ───────────────────────────────────────────────────────────

/// Default [`MonitoringService`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineService;

impl BaselineService {
    pub fn new() -> Self {
        Self
    }
}

impl MonitoringService for BaselineService {
    type Estimator = ConfidenceEstimator;
    type Calculator = RealizedPerformanceCalculator;
    type DriftCalculator = UnivariateDriftCalculator;
    type Ranker = CorrelationRanker;
    type StatsCalculator = SummaryStatsCalculator;

    fn fit_estimator(
        &self,
        reference: &Dataset,
        config: &MonitoringConfig,
    ) -> Result<ConfidenceEstimator> {
        ConfidenceEstimator::fit(reference, config)
    }

    fn estimate(
        &self,
        estimator: &ConfidenceEstimator,
        analysis: &Dataset,
    ) -> Result<MetricResult> {
        estimator.estimate(analysis)
    }

    fn fit_calculator(
        &self,
        reference: &Dataset,
        config: &MonitoringConfig,
    ) -> Result<RealizedPerformanceCalculator> {
        RealizedPerformanceCalculator::fit(reference, config)
    }

    fn calculate(
        &self,
        calculator: &RealizedPerformanceCalculator,
        analysis: &Dataset,
    ) -> Result<MetricResult> {
        calculator.calculate(analysis)
    }

    fn fit_drift(
        &self,
        reference: &Dataset,
        config: &MonitoringConfig,
    ) -> Result<UnivariateDriftCalculator> {
        UnivariateDriftCalculator::fit(reference, config)
    }

    fn calculate_drift(
        &self,
        calculator: &UnivariateDriftCalculator,
        analysis: &Dataset,
    ) -> Result<DriftResult> {
        calculator.calculate(analysis)
    }

    fn fit_ranker(&self, reference_performance: &MetricResult) -> Result<CorrelationRanker> {
        CorrelationRanker::fit(reference_performance)
    }

    fn rank(
        &self,
        ranker: &CorrelationRanker,
        drift: &DriftResult,
        performance: &MetricResult,
    ) -> Result<Vec<RankingRow>> {
        ranker.rank(drift, performance)
    }

    fn fit_summary_stats(
        &self,
        reference: &Dataset,
        config: &MonitoringConfig,
    ) -> Result<SummaryStatsCalculator> {
        SummaryStatsCalculator::fit(reference, config)
    }

    fn calculate_summary(
        &self,
        calculator: &SummaryStatsCalculator,
        analysis: &Dataset,
    ) -> Result<SummaryStatsResult> {
        calculator.calculate(analysis)
    }
}
