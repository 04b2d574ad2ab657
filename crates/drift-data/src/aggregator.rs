//! Post-processing of monitoring result tables into the three reported
//! values: alerted months, the top drift feature and the transaction
//! amount to investigate.
//!
//! Everything here is a pure function of its inputs.

use std::collections::BTreeSet;

use drift_core::error::{MonitorError, Result};
use drift_core::formatting::round_to;
use drift_core::models::{MetricResult, MetricValue, RankingRow};
use drift_core::time_utils::MonthLabel;
use serde::Serialize;
use tracing::{debug, warn};

/// Decimal places of the reported transaction amount.
pub const AMOUNT_DECIMALS: u32 = 4;

// ── Output types ──────────────────────────────────────────────────────────────

/// The feature most correlated with performance change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopFeature {
    pub column_name: String,
    pub correlation: f64,
    /// Whether the ranking table arrived out of order and was re-sorted.
    pub reordered: bool,
}

/// Where the reported transaction amount came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AmountSignal {
    /// First chunk whose summary statistic alerted.
    Alert { chunk: String, value: f64 },
    /// Chunk furthest above its upper threshold.
    UpperDeviation {
        chunk: String,
        value: f64,
        deviation: f64,
    },
    /// Chunk furthest below its lower threshold.
    LowerDeviation {
        chunk: String,
        value: f64,
        deviation: f64,
    },
    /// Configured literal used when no chunk stands out.
    Fallback { value: f64 },
    /// No chunk stands out and no literal is configured.
    NoSignal,
}

impl AmountSignal {
    /// Reported amount, already rounded.
    pub fn value(&self) -> Option<f64> {
        match self {
            AmountSignal::Alert { value, .. }
            | AmountSignal::UpperDeviation { value, .. }
            | AmountSignal::LowerDeviation { value, .. }
            | AmountSignal::Fallback { value } => Some(*value),
            AmountSignal::NoSignal => None,
        }
    }

    /// Short human-readable description of the source.
    pub fn describe(&self) -> String {
        match self {
            AmountSignal::Alert { chunk, .. } => format!("alert in {}", chunk),
            AmountSignal::UpperDeviation { chunk, deviation, .. } => {
                format!("largest deviation above threshold ({:+.4}) in {}", deviation, chunk)
            }
            AmountSignal::LowerDeviation { chunk, deviation, .. } => {
                format!("largest deviation below threshold ({:+.4}) in {}", deviation, chunk)
            }
            AmountSignal::Fallback { .. } => "configured fallback, no chunk deviated".to_string(),
            AmountSignal::NoSignal => "no chunk deviated".to_string(),
        }
    }
}

// ── ResultAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that reduces result tables to report values.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Months in which both the estimated and the realized metric alerted.
    ///
    /// Returns labels in chronological order without duplicates. A chunk key
    /// that is not a calendar month is an error.
    pub fn alert_months(
        estimated: &MetricResult,
        realized: &MetricResult,
    ) -> Result<Vec<MonthLabel>> {
        let est = Self::alerted_months(estimated)?;
        let real = Self::alerted_months(realized)?;
        debug!(
            "{} estimated and {} realized alert months",
            est.len(),
            real.len()
        );
        Ok(est.intersection(&real).copied().collect())
    }

    /// The top-ranked feature.
    ///
    /// The ranking is expected in descending correlation order. When it is
    /// not, a warning is logged and the rows are re-sorted (stable, NaN
    /// last) before reading the top entry.
    pub fn top_feature(ranking: &[RankingRow]) -> Result<TopFeature> {
        let first = ranking.first().ok_or(MonitorError::EmptyRanking)?;

        let sorted = ranking
            .windows(2)
            .all(|w| RankingRow::by_correlation_desc(&w[0], &w[1]).is_le());
        if sorted {
            return Ok(TopFeature {
                column_name: first.column_name.clone(),
                correlation: first.correlation,
                reordered: false,
            });
        }

        warn!("Feature ranking is not sorted by correlation; re-sorting");
        let mut rows: Vec<&RankingRow> = ranking.iter().collect();
        rows.sort_by(|a, b| RankingRow::by_correlation_desc(a, b));
        let top = rows[0];
        Ok(TopFeature {
            column_name: top.column_name.clone(),
            correlation: top.correlation,
            reordered: true,
        })
    }

    /// Transaction amount to report from a summary-statistic table.
    ///
    /// 1. The first alerted row, in table order.
    /// 2. Otherwise the row with the largest positive `value - upper`, first
    ///    maximum wins.
    /// 3. Otherwise the row with the largest positive `lower - value`.
    /// 4. Otherwise `fallback`, or [`AmountSignal::NoSignal`] without one.
    ///
    /// Values are rounded to [`AMOUNT_DECIMALS`] places, halves away from
    /// zero.
    pub fn alert_amount(stats: &MetricResult, fallback: Option<f64>) -> AmountSignal {
        if let Some(row) = stats.alerted_rows().next() {
            return AmountSignal::Alert {
                chunk: row.chunk.key.clone(),
                value: round_to(row.metric.value, AMOUNT_DECIMALS),
            };
        }

        if let Some((idx, deviation)) = Self::max_positive(stats, |r| r.upper_deviation()) {
            let row = &stats.rows[idx];
            return AmountSignal::UpperDeviation {
                chunk: row.chunk.key.clone(),
                value: round_to(row.metric.value, AMOUNT_DECIMALS),
                deviation,
            };
        }

        if let Some((idx, deviation)) = Self::max_positive(stats, |r| r.lower_deviation()) {
            let row = &stats.rows[idx];
            return AmountSignal::LowerDeviation {
                chunk: row.chunk.key.clone(),
                value: round_to(row.metric.value, AMOUNT_DECIMALS),
                deviation,
            };
        }

        match fallback {
            Some(value) => {
                warn!("No summary statistic deviated; reporting fallback amount {}", value);
                AmountSignal::Fallback {
                    value: round_to(value, AMOUNT_DECIMALS),
                }
            }
            None => AmountSignal::NoSignal,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn alerted_months(result: &MetricResult) -> Result<BTreeSet<MonthLabel>> {
        result
            .alerted_rows()
            .map(|row| MonthLabel::from_chunk_key(&row.chunk.key))
            .collect()
    }

    /// Index and value of the first strictly largest positive deviation.
    fn max_positive(
        stats: &MetricResult,
        deviation: impl Fn(&MetricValue) -> Option<f64>,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, row) in stats.rows.iter().enumerate() {
            let Some(dev) = deviation(&row.metric) else {
                continue;
            };
            if dev.is_nan() || dev <= 0.0 {
                continue;
            }
            if best.map_or(true, |(_, b)| dev > b) {
                best = Some((idx, dev));
            }
        }
        best
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
