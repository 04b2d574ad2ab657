//! Monitoring pipeline: load both datasets, run the calculators and reduce
//! their tables into an [`AnalysisSummary`].
//!
//! The calculator jobs are exposed individually so a scheduler can run them
//! concurrently; [`run_pipeline`] runs them one after another.

use std::path::Path;

use chrono::Utc;
use drift_core::config::MonitoringConfig;
use drift_core::error::{MonitorError, Result};
use drift_core::models::{
    ComparisonResult, DataPeriod, Dataset, DriftResult, MetricResult, RankingRow,
    SummaryStatsResult,
};
use drift_core::service::MonitoringService;
use drift_core::time_utils::{MonthLabel, TimezoneHandler};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregator::{AmountSignal, ResultAggregator, TopFeature};
use crate::reader::load_dataset;

/// Summary-statistic column the alert amount is read from.
pub const AMOUNT_COLUMN: &str = "transaction_amount";

// ── Public types ──────────────────────────────────────────────────────────────

/// Every table produced by the monitoring service for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringOutputs {
    pub estimated: MetricResult,
    pub realized: MetricResult,
    pub comparison: ComparisonResult,
    pub drift: DriftResult,
    pub ranking: Vec<RankingRow>,
    pub summary_stats: SummaryStatsResult,
}

/// Facts about the run, reported alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when the summary was produced.
    pub generated_at: String,
    pub metric: String,
    pub reference_records: usize,
    pub analysis_records: usize,
    pub analysis_chunks: usize,
}

/// The reduced, reportable outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub months_with_performance_alerts: Vec<MonthLabel>,
    pub highest_correlation_feature: TopFeature,
    pub alert_avg_transaction_amount: AmountSignal,
    pub ranking: Vec<RankingRow>,
    pub metadata: AnalysisMetadata,
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load the reference and analysis datasets.
///
/// Both files are loaded before any calculation starts, so a bad analysis
/// file never leaves a half-finished run behind.
pub fn load_inputs(
    reference: &Path,
    analysis: &Path,
    tz: &TimezoneHandler,
) -> Result<(Dataset, Dataset)> {
    let reference = load_dataset(reference, "reference", tz)?;
    let analysis = load_dataset(analysis, "analysis", tz)?;
    Ok((reference, analysis))
}

// ── Calculator jobs ───────────────────────────────────────────────────────────

/// Estimated performance without analysis labels.
pub fn estimate_performance<S: MonitoringService>(
    service: &S,
    reference: &Dataset,
    analysis: &Dataset,
    config: &MonitoringConfig,
) -> Result<MetricResult> {
    let estimator = service.fit_estimator(reference, config)?;
    service.estimate(&estimator, analysis)
}

/// Realized performance from labels.
pub fn realized_performance<S: MonitoringService>(
    service: &S,
    reference: &Dataset,
    analysis: &Dataset,
    config: &MonitoringConfig,
) -> Result<MetricResult> {
    let calculator = service.fit_calculator(reference, config)?;
    service.calculate(&calculator, analysis)
}

pub fn univariate_drift<S: MonitoringService>(
    service: &S,
    reference: &Dataset,
    analysis: &Dataset,
    config: &MonitoringConfig,
) -> Result<DriftResult> {
    let calculator = service.fit_drift(reference, config)?;
    service.calculate_drift(&calculator, analysis)
}

pub fn summary_statistics<S: MonitoringService>(
    service: &S,
    reference: &Dataset,
    analysis: &Dataset,
    config: &MonitoringConfig,
) -> Result<SummaryStatsResult> {
    let calculator = service.fit_summary_stats(reference, config)?;
    service.calculate_summary(&calculator, analysis)
}

/// Rank drift columns against realized performance, fitting the ranker on
/// the reference slice of the performance table.
pub fn rank_features<S: MonitoringService>(
    service: &S,
    realized: &MetricResult,
    drift: &DriftResult,
) -> Result<Vec<RankingRow>> {
    let ranker = service.fit_ranker(&realized.filter_period(DataPeriod::Reference))?;
    service.rank(&ranker, drift, realized)
}

/// Combine the independent job results; compares performance tables and
/// ranks features when `ranking` has not been computed yet.
pub fn assemble<S: MonitoringService>(
    service: &S,
    estimated: MetricResult,
    realized: MetricResult,
    drift: DriftResult,
    ranking: Option<Vec<RankingRow>>,
    summary_stats: SummaryStatsResult,
) -> Result<MonitoringOutputs> {
    let comparison = service.compare(&estimated, &realized)?;
    let ranking = match ranking {
        Some(r) => r,
        None => rank_features(service, &realized, &drift)?,
    };
    Ok(MonitoringOutputs {
        estimated,
        realized,
        comparison,
        drift,
        ranking,
        summary_stats,
    })
}

/// Run every calculator on the current thread.
pub fn run_pipeline<S: MonitoringService>(
    service: &S,
    reference: &Dataset,
    analysis: &Dataset,
    config: &MonitoringConfig,
) -> Result<MonitoringOutputs> {
    debug!("Running monitoring calculators sequentially");
    let estimated = estimate_performance(service, reference, analysis, config)?;
    let realized = realized_performance(service, reference, analysis, config)?;
    let drift = univariate_drift(service, reference, analysis, config)?;
    let summary_stats = summary_statistics(service, reference, analysis, config)?;
    assemble(service, estimated, realized, drift, None, summary_stats)
}

// ── Reduction ─────────────────────────────────────────────────────────────────

/// Reduce the service tables to the reported values.
pub fn summarize(
    outputs: &MonitoringOutputs,
    config: &MonitoringConfig,
    reference: &Dataset,
    analysis: &Dataset,
) -> Result<AnalysisSummary> {
    let months = ResultAggregator::alert_months(&outputs.estimated, &outputs.realized)?;
    let top = ResultAggregator::top_feature(&outputs.ranking)?;

    let amount_stats = outputs.summary_stats.column(AMOUNT_COLUMN).ok_or_else(|| {
        MonitorError::Calculation(format!(
            "summary statistics do not include '{}'",
            AMOUNT_COLUMN
        ))
    })?;
    let amount = ResultAggregator::alert_amount(amount_stats, config.fallback_amount);

    info!(
        "{} alert month(s), top feature '{}', amount source: {}",
        months.len(),
        top.column_name,
        amount.describe()
    );

    let analysis_chunks = outputs
        .realized
        .rows
        .iter()
        .filter(|r| r.chunk.period == DataPeriod::Analysis)
        .count();

    Ok(AnalysisSummary {
        months_with_performance_alerts: months,
        highest_correlation_feature: top,
        alert_avg_transaction_amount: amount,
        ranking: outputs.ranking.clone(),
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            metric: outputs.realized.name.clone(),
            reference_records: reference.len(),
            analysis_records: analysis.len(),
            analysis_chunks,
        },
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
