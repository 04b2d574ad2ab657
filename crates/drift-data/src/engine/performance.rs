//! Estimated (label-free) and realized classification performance.

use drift_core::config::{ChunkPeriod, Metric, MonitoringConfig};
use drift_core::error::{MonitorError, Result};
use drift_core::models::{DataPeriod, Dataset, EventRecord, MetricResult, MetricRow};
use tracing::debug;

use super::chunking::{chunk_dataset, Chunk};
use super::Band;

/// Performance values are probabilities, so thresholds stay inside `[0, 1]`.
const PERFORMANCE_CLAMP: Option<(f64, f64)> = Some((0.0, 1.0));

// ── Metric formulas ───────────────────────────────────────────────────────────

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        f64::NAN
    }
}

/// Metric computed from ground-truth labels. NaN when undefined (e.g.
/// precision without positive predictions).
pub fn realized_metric(metric: Metric, records: &[&EventRecord]) -> f64 {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    let mut correct = 0.0;
    for r in records {
        match (r.predicted_fraud, r.is_fraud) {
            (true, true) => tp += 1.0,
            (true, false) => fp += 1.0,
            (false, true) => fn_ += 1.0,
            (false, false) => {}
        }
        if r.is_correct() {
            correct += 1.0;
        }
    }
    match metric {
        Metric::Accuracy => ratio(correct, records.len() as f64),
        Metric::Precision => ratio(tp, tp + fp),
        Metric::Recall => ratio(tp, tp + fn_),
    }
}

/// Metric expected from the model scores alone.
///
/// Each score is taken as the probability of the positive class, which
/// gives an expected confusion matrix: a positive prediction adds `p` to
/// TP and `1 - p` to FP, a negative one adds `p` to FN.
pub fn estimated_metric(metric: Metric, records: &[&EventRecord]) -> f64 {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    let mut confidence = 0.0;
    for r in records {
        let p = r.predicted_fraud_proba;
        if r.predicted_fraud {
            tp += p;
            fp += 1.0 - p;
        } else {
            fn_ += p;
        }
        confidence += r.prediction_confidence();
    }
    match metric {
        Metric::Accuracy => ratio(confidence, records.len() as f64),
        Metric::Precision => ratio(tp, tp + fp),
        Metric::Recall => ratio(tp, tp + fn_),
    }
}

// ── Fitted state ──────────────────────────────────────────────────────────────

/// Reference rows and band shared by both performance calculators.
#[derive(Debug, Clone)]
struct FittedPerformance {
    metric: Metric,
    chunk_period: ChunkPeriod,
    band: Band,
    reference_rows: Vec<MetricRow>,
}

impl FittedPerformance {
    /// Fit the band on realized reference values and keep the reference rows
    /// computed with `value_of`.
    fn fit(
        reference: &Dataset,
        config: &MonitoringConfig,
        value_of: fn(Metric, &[&EventRecord]) -> f64,
    ) -> Self {
        let chunks = chunk_dataset(reference, config.chunk_period, DataPeriod::Reference);
        let realized: Vec<f64> = chunks
            .iter()
            .map(|c| realized_metric(config.metric, &c.records))
            .collect();
        let band =
            Band::from_reference(&realized, config.threshold_std_multiplier, PERFORMANCE_CLAMP);

        let reference_rows = chunks
            .iter()
            .map(|c| MetricRow {
                chunk: c.info.clone(),
                metric: band.apply(value_of(config.metric, &c.records), DataPeriod::Reference),
            })
            .collect();

        Self {
            metric: config.metric,
            chunk_period: config.chunk_period,
            band,
            reference_rows,
        }
    }

    fn apply(
        &self,
        analysis: &Dataset,
        value_of: fn(Metric, &[&EventRecord]) -> f64,
    ) -> MetricResult {
        let chunks: Vec<Chunk<'_>> =
            chunk_dataset(analysis, self.chunk_period, DataPeriod::Analysis);
        let mut rows = self.reference_rows.clone();
        rows.extend(chunks.iter().map(|c| MetricRow {
            chunk: c.info.clone(),
            metric: self
                .band
                .apply(value_of(self.metric, &c.records), DataPeriod::Analysis),
        }));
        MetricResult::new(self.metric.name(), rows)
    }
}

// ── ConfidenceEstimator ───────────────────────────────────────────────────────

/// Estimates performance on unlabeled data from the model's own scores.
#[derive(Debug, Clone)]
pub struct ConfidenceEstimator {
    fitted: FittedPerformance,
}

impl ConfidenceEstimator {
    /// Fit on reference data. Needs at least two reference chunks so the
    /// alert band has a spread.
    pub fn fit(reference: &Dataset, config: &MonitoringConfig) -> Result<Self> {
        let fitted = FittedPerformance::fit(reference, config, estimated_metric);
        if fitted.reference_rows.len() < 2 {
            return Err(MonitorError::InsufficientReferenceData(format!(
                "estimation needs at least 2 reference chunks, got {}",
                fitted.reference_rows.len()
            )));
        }
        debug!(
            "Fitted {} estimator on {} reference chunks (band {:?}..{:?})",
            fitted.metric.name(),
            fitted.reference_rows.len(),
            fitted.band.lower,
            fitted.band.upper
        );
        Ok(Self { fitted })
    }

    /// Estimated metric for reference and analysis chunks. Labels of the
    /// analysis data are never read.
    pub fn estimate(&self, analysis: &Dataset) -> Result<MetricResult> {
        Ok(self.fitted.apply(analysis, estimated_metric))
    }
}

// ── RealizedPerformanceCalculator ─────────────────────────────────────────────

/// Computes performance from ground-truth labels.
#[derive(Debug, Clone)]
pub struct RealizedPerformanceCalculator {
    fitted: FittedPerformance,
}

impl RealizedPerformanceCalculator {
    pub fn fit(reference: &Dataset, config: &MonitoringConfig) -> Result<Self> {
        let fitted = FittedPerformance::fit(reference, config, realized_metric);
        if fitted.reference_rows.is_empty() {
            return Err(MonitorError::InsufficientReferenceData(
                "reference dataset has no chunks".to_string(),
            ));
        }
        Ok(Self { fitted })
    }

    pub fn calculate(&self, analysis: &Dataset) -> Result<MetricResult> {
        Ok(self.fitted.apply(analysis, realized_metric))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{analysis_dataset, reference_dataset, MonthSpec};

    fn refs(records: &[EventRecord]) -> Vec<&EventRecord> {
        records.iter().collect()
    }

    // ── Formulas ──────────────────────────────────────────────────────────────

    #[test]
    fn test_realized_accuracy() {
        let records = MonthSpec::new(2024, 1).rows(20).wrong(4).records();
        let acc = realized_metric(Metric::Accuracy, &refs(&records));
        assert!((acc - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_realized_precision_and_recall() {
        // Fraud at 0, 4, 8, 12, 16; record 0 mispredicted (missed fraud),
        // records 1..3 mispredicted (false alarms).
        let records = MonthSpec::new(2024, 1).rows(20).wrong(4).records();
        let r = refs(&records);
        // TP = 4, FP = 3, FN = 1
        assert!((realized_metric(Metric::Precision, &r) - 4.0 / 7.0).abs() < 1e-12);
        assert!((realized_metric(Metric::Recall, &r) - 4.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_undefined_without_positive_predictions() {
        let records = vec![crate::test_support::record_at(2024, 1, 1)];
        assert!(realized_metric(Metric::Precision, &refs(&records)).is_nan());
        assert!(estimated_metric(Metric::Precision, &refs(&records)).is_nan());
    }

    #[test]
    fn test_estimated_accuracy_is_mean_confidence() {
        let records = MonthSpec::new(2024, 1).confidence(0.8).wrong(10).records();
        let est = estimated_metric(Metric::Accuracy, &refs(&records));
        assert!((est - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_estimated_metric_ignores_labels() {
        let mut records = MonthSpec::new(2024, 1).records();
        let before = estimated_metric(Metric::Recall, &refs(&records));
        for r in &mut records {
            r.is_fraud = !r.is_fraud;
        }
        assert_eq!(estimated_metric(Metric::Recall, &refs(&records)), before);
    }

    // ── Estimator / calculator ────────────────────────────────────────────────

    #[test]
    fn test_estimator_requires_two_reference_chunks() {
        let reference = MonthSpec::new(2023, 1).dataset("reference");
        let err = ConfidenceEstimator::fit(&reference, &MonitoringConfig::default()).unwrap_err();
        assert!(matches!(err, MonitorError::InsufficientReferenceData(_)));
    }

    #[test]
    fn test_realized_calculator_alerts_on_degraded_months() {
        let config = MonitoringConfig::default();
        let calc = RealizedPerformanceCalculator::fit(&reference_dataset(), &config).unwrap();
        let result = calc.calculate(&analysis_dataset()).unwrap();

        assert_eq!(result.name, "accuracy");
        assert_eq!(result.filter_period(DataPeriod::Reference).rows.len(), 6);
        assert_eq!(result.filter_period(DataPeriod::Analysis).rows.len(), 6);

        let alerted: Vec<&str> = result.alerted_rows().map(|r| r.chunk.key.as_str()).collect();
        assert_eq!(alerted, vec!["2024-04", "2024-05"]);

        let first = &result.rows[0].metric;
        assert!(first.upper_threshold.unwrap() <= 1.0);
        assert!((first.lower_threshold.unwrap() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_estimator_alerts_on_low_confidence_months() {
        let config = MonitoringConfig::default();
        let est = ConfidenceEstimator::fit(&reference_dataset(), &config).unwrap();
        let result = est.estimate(&analysis_dataset()).unwrap();

        let alerted: Vec<&str> = result.alerted_rows().map(|r| r.chunk.key.as_str()).collect();
        assert_eq!(alerted, vec!["2024-04", "2024-06"]);
        assert!((result.row("2024-04").unwrap().metric.value - 0.6).abs() < 1e-12);
    }
}
