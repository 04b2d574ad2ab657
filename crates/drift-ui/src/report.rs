//! Text and JSON rendering of an [`AnalysisSummary`].

use std::fmt::Write as _;

use drift_core::formatting::{format_fixed, format_float, format_label_list};
use drift_core::models::RankingRow;
use drift_data::aggregator::AmountSignal;
use drift_data::analysis::AnalysisSummary;
use unicode_width::UnicodeWidthStr;

const RANKING_HEADERS: [&str; 5] = ["rank", "column_name", "correlation", "p_value", "has_drifted"];

/// Left-align `s` in a field `width` terminal columns wide.
fn pad(s: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(used)))
}

/// Reported amount as printed in the results, `None` when there is no signal.
fn amount_text(signal: &AmountSignal) -> String {
    signal
        .value()
        .map(format_float)
        .unwrap_or_else(|| "None".to_string())
}

/// The ranking as an aligned plain-text table.
pub fn render_ranking_table(ranking: &[RankingRow]) -> String {
    let cells: Vec<[String; 5]> = ranking
        .iter()
        .map(|r| {
            [
                r.rank.to_string(),
                r.column_name.clone(),
                format_fixed(r.correlation, 4),
                format_fixed(r.p_value, 4),
                r.has_drifted.to_string(),
            ]
        })
        .collect();

    let mut widths = RANKING_HEADERS.map(UnicodeWidthStr::width);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let line = |fields: &[&str]| -> String {
        let padded: Vec<String> = fields
            .iter()
            .zip(widths)
            .map(|(f, w)| pad(f, w))
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    let mut out = line(&RANKING_HEADERS);
    out.push('\n');
    for row in &cells {
        let fields: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&line(&fields));
        out.push('\n');
    }
    out
}

/// Results section: alert months, top feature, ranking, alert amount and
/// the final-results block.
pub fn render_text_report(summary: &AnalysisSummary) -> String {
    let months = format_label_list(&summary.months_with_performance_alerts);
    let top = &summary.highest_correlation_feature;
    let amount = &summary.alert_avg_transaction_amount;
    let mut out = String::new();

    let _ = writeln!(out, "Months with performance alerts: {}", months);
    let _ = writeln!(out, "Feature with highest correlation: {}", top.column_name);
    if top.reordered {
        let _ = writeln!(out, "Note: the correlation ranking arrived unsorted and was re-sorted");
    }
    let _ = writeln!(out, "Correlation ranking:");
    out.push_str(&render_ranking_table(&summary.ranking));
    let _ = writeln!(
        out,
        "Alert transaction amount: {} ({})",
        amount_text(amount),
        amount.describe()
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "=== FINAL RESULTS ===");
    let _ = writeln!(out, "months_with_performance_alerts = {}", months);
    let _ = writeln!(out, "highest_correlation_feature = '{}'", top.column_name);
    let _ = writeln!(out, "alert_avg_transaction_amount = {}", amount_text(amount));
    out
}

/// Narrative explanation of the outcome.
pub fn render_explanation(summary: &AnalysisSummary) -> String {
    let top = &summary.highest_correlation_feature.column_name;
    let months: Vec<String> = summary
        .months_with_performance_alerts
        .iter()
        .map(ToString::to_string)
        .collect();
    let drifted: Vec<&str> = summary
        .ranking
        .iter()
        .filter(|r| r.has_drifted)
        .map(|r| r.column_name.as_str())
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "=== DETAILED EXPLANATION ===");
    let _ = writeln!(out, "Analysis of model performance degradation:");
    let _ = writeln!(
        out,
        "1. The feature '{}' showed the strongest correlation with performance drops",
        top
    );
    let _ = writeln!(out, "2. Key observations from the data:");
    if months.is_empty() {
        let _ = writeln!(
            out,
            "   - No month raised both an estimated and a realized performance alert"
        );
    } else {
        let _ = writeln!(
            out,
            "   - Estimated and realized performance both alerted in: {}",
            months.join(", ")
        );
    }
    if drifted.is_empty() {
        let _ = writeln!(out, "   - No feature drifted beyond its reference band");
    } else {
        let _ = writeln!(out, "   - Drifted features: {}", drifted.join(", "));
    }
    let _ = writeln!(
        out,
        "   - Transaction amounts: {}",
        summary.alert_avg_transaction_amount.describe()
    );
    let _ = writeln!(out, "3. Possible explanation:");
    let _ = writeln!(
        out,
        "   The distribution of '{}' moved away from the reference period while",
        top
    );
    let _ = writeln!(
        out,
        "   the model kept scoring it with patterns learned on reference data."
    );
    out
}

/// The summary as pretty-printed JSON. NaN correlations become `null`.
pub fn render_json(summary: &AnalysisSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
