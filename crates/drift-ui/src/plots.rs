//! Line charts of the monitoring result tables.
//!
//! Builders turn a result table into a [`PlotSpec`] that owns its points;
//! [`render_plot`] draws a spec as a ratatui [`Chart`]. The x axis is the
//! row position within the table (reference chunks first), labelled with
//! chunk keys. NaN values are left out of the series.

use drift_core::models::{ChunkInfo, ComparisonResult, DriftResult, MetricResult, MetricValue};
use ratatui::{
    layout::Rect,
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use crate::themes::Theme;

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Scatter,
}

/// One named series of `(x, y)` points.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub style: Style,
    pub kind: SeriesKind,
}

impl Series {
    fn line(name: impl Into<String>, points: Vec<(f64, f64)>, style: Style) -> Self {
        Self {
            name: name.into(),
            points,
            style,
            kind: SeriesKind::Line,
        }
    }

    fn scatter(name: impl Into<String>, points: Vec<(f64, f64)>, style: Style) -> Self {
        Self {
            name: name.into(),
            points,
            style,
            kind: SeriesKind::Scatter,
        }
    }
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone)]
pub struct PlotSpec {
    pub title: String,
    pub y_title: String,
    /// Chunk key of each x position.
    pub chunk_keys: Vec<String>,
    pub series: Vec<Series>,
}

impl PlotSpec {
    pub fn x_bounds(&self) -> [f64; 2] {
        let last = self.chunk_keys.len().saturating_sub(1).max(1);
        [0.0, last as f64]
    }

    /// Range of every plotted y value, padded by 5 %.
    pub fn y_bounds(&self) -> [f64; 2] {
        let ys = self.series.iter().flat_map(|s| s.points.iter().map(|p| p.1));
        let (lo, hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
        if !lo.is_finite() || !hi.is_finite() {
            return [0.0, 1.0];
        }
        if (hi - lo).abs() < f64::EPSILON {
            return [lo - 1.0, hi + 1.0];
        }
        let pad = (hi - lo) * 0.05;
        [lo - pad, hi + pad]
    }

    /// First, middle and last chunk keys.
    pub fn x_labels(&self) -> Vec<String> {
        match self.chunk_keys.len() {
            0 => Vec::new(),
            1 => vec![self.chunk_keys[0].clone()],
            2 => self.chunk_keys.clone(),
            n => vec![
                self.chunk_keys[0].clone(),
                self.chunk_keys[n / 2].clone(),
                self.chunk_keys[n - 1].clone(),
            ],
        }
    }

    fn has_data(&self) -> bool {
        self.series
            .iter()
            .any(|s| s.kind == SeriesKind::Line && !s.points.is_empty())
    }
}

// ── Point extraction ──────────────────────────────────────────────────────────

fn finite_points(values: impl Iterator<Item = Option<f64>>) -> Vec<(f64, f64)> {
    values
        .enumerate()
        .filter_map(|(i, v)| v.filter(|y| y.is_finite()).map(|y| (i as f64, y)))
        .collect()
}

fn value_points<'a>(metrics: impl Iterator<Item = &'a MetricValue>) -> Vec<(f64, f64)> {
    finite_points(metrics.map(|m| Some(m.value)))
}

fn upper_points<'a>(metrics: impl Iterator<Item = &'a MetricValue>) -> Vec<(f64, f64)> {
    finite_points(metrics.map(|m| m.upper_threshold))
}

fn lower_points<'a>(metrics: impl Iterator<Item = &'a MetricValue>) -> Vec<(f64, f64)> {
    finite_points(metrics.map(|m| m.lower_threshold))
}

fn alert_points<'a>(metrics: impl Iterator<Item = &'a MetricValue>) -> Vec<(f64, f64)> {
    finite_points(metrics.map(|m| Some(m.value).filter(|_| m.alert)))
}

fn keys<'a>(chunks: impl Iterator<Item = &'a ChunkInfo>) -> Vec<String> {
    chunks.map(|c| c.key.clone()).collect()
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Estimated against realized performance with the estimation band.
///
/// `None` when the table has nothing to draw.
pub fn performance_plot(comparison: &ComparisonResult, theme: &Theme) -> Option<PlotSpec> {
    let rows = &comparison.rows;
    let mut alerts = alert_points(rows.iter().map(|r| &r.estimated));
    alerts.extend(alert_points(rows.iter().map(|r| &r.realized)));

    let spec = PlotSpec {
        title: format!("Estimated vs realized {}", comparison.metric),
        y_title: comparison.metric.clone(),
        chunk_keys: keys(rows.iter().map(|r| &r.chunk)),
        series: vec![
            Series::line(
                "estimated",
                value_points(rows.iter().map(|r| &r.estimated)),
                theme.estimated,
            ),
            Series::line(
                "realized",
                value_points(rows.iter().map(|r| &r.realized)),
                theme.realized,
            ),
            Series::line(
                "upper",
                upper_points(rows.iter().map(|r| &r.estimated)),
                theme.threshold,
            ),
            Series::line(
                "lower",
                lower_points(rows.iter().map(|r| &r.estimated)),
                theme.threshold,
            ),
            Series::scatter("alert", alerts, theme.alert),
        ],
    };
    spec.has_data().then_some(spec)
}

/// One chart per drift method, each showing the per-chunk statistic of the
/// columns tested with that method.
pub fn drift_plots(drift: &DriftResult, theme: &Theme) -> Vec<PlotSpec> {
    let mut methods: Vec<&str> = Vec::new();
    for column in &drift.columns {
        if !methods.contains(&column.method.as_str()) {
            methods.push(&column.method);
        }
    }

    methods
        .into_iter()
        .filter_map(|method| {
            let columns: Vec<_> = drift.columns.iter().filter(|c| c.method == method).collect();
            let chunk_keys = columns
                .iter()
                .map(|c| keys(c.rows.iter().map(|r| &r.chunk)))
                .max_by_key(Vec::len)
                .unwrap_or_default();

            let mut series: Vec<Series> = columns
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    Series::line(
                        c.column_name.clone(),
                        value_points(c.rows.iter().map(|r| &r.metric)),
                        theme.series_style(i),
                    )
                })
                .collect();
            let alerts = columns
                .iter()
                .flat_map(|c| alert_points(c.rows.iter().map(|r| &r.metric)))
                .collect();
            series.push(Series::scatter("alert", alerts, theme.alert));

            let spec = PlotSpec {
                title: format!("Feature drift ({})", method),
                y_title: "statistic".to_string(),
                chunk_keys,
                series,
            };
            spec.has_data().then_some(spec)
        })
        .collect()
}

/// Per-chunk average of a summarized column with its band.
pub fn amount_plot(stats: &MetricResult, theme: &Theme) -> Option<PlotSpec> {
    let metrics = || stats.rows.iter().map(|r| &r.metric);
    let spec = PlotSpec {
        title: format!("Average {}", stats.name),
        y_title: "mean".to_string(),
        chunk_keys: keys(stats.rows.iter().map(|r| &r.chunk)),
        series: vec![
            Series::line("mean", value_points(metrics()), theme.estimated),
            Series::line("upper", upper_points(metrics()), theme.threshold),
            Series::line("lower", lower_points(metrics()), theme.threshold),
            Series::scatter("alert", alert_points(metrics()), theme.alert),
        ],
    };
    spec.has_data().then_some(spec)
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Draw `spec` into `area`.
pub fn render_plot(frame: &mut Frame, area: Rect, spec: &PlotSpec, theme: &Theme) {
    let datasets: Vec<Dataset> = spec
        .series
        .iter()
        .filter(|s| !s.points.is_empty())
        .map(|s| {
            let (marker, graph) = match s.kind {
                SeriesKind::Line => (symbols::Marker::Braille, GraphType::Line),
                SeriesKind::Scatter => (symbols::Marker::Dot, GraphType::Scatter),
            };
            Dataset::default()
                .name(s.name.clone())
                .marker(marker)
                .graph_type(graph)
                .style(s.style)
                .data(&s.points)
        })
        .collect();

    let [y_lo, y_hi] = spec.y_bounds();
    let y_labels = vec![
        format!("{:.3}", y_lo),
        format!("{:.3}", (y_lo + y_hi) / 2.0),
        format!("{:.3}", y_hi),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(format!(" {} ", spec.title), theme.header)),
        )
        .x_axis(
            Axis::default()
                .title(Span::styled("chunk", theme.label))
                .style(theme.axis)
                .bounds(spec.x_bounds())
                .labels(spec.x_labels()),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(spec.y_title.clone(), theme.label))
                .style(theme.axis)
                .bounds([y_lo, y_hi])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use drift_core::models::{ColumnDrift, ComparisonRow, DataPeriod, DriftRow, MetricRow};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn chunk(key: &str, index: usize, period: DataPeriod) -> ChunkInfo {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ChunkInfo {
            key: key.to_string(),
            index,
            start: ts,
            end: ts,
            period,
            size: 10,
        }
    }

    fn value(v: f64) -> MetricValue {
        MetricValue::with_thresholds(v, Some(0.8), Some(1.0))
    }

    fn comparison() -> ComparisonResult {
        let rows = [
            ("2023-11", DataPeriod::Reference, 0.95, 0.94),
            ("2023-12", DataPeriod::Reference, 0.93, 0.92),
            ("2024-01", DataPeriod::Analysis, 0.90, f64::NAN),
            ("2024-02", DataPeriod::Analysis, 0.70, 0.65),
        ]
        .iter()
        .enumerate()
        .map(|(i, (key, period, est, real))| ComparisonRow {
            chunk: chunk(key, i, *period),
            estimated: value(*est),
            realized: value(*real),
        })
        .collect();
        ComparisonResult {
            metric: "accuracy".to_string(),
            rows,
        }
    }

    fn drift_column(name: &str, method: &str, values: &[f64]) -> ColumnDrift {
        ColumnDrift {
            column_name: name.to_string(),
            method: method.to_string(),
            rows: values
                .iter()
                .enumerate()
                .map(|(i, v)| DriftRow {
                    chunk: chunk(&format!("2024-{:02}", i + 1), i, DataPeriod::Analysis),
                    metric: MetricValue::with_thresholds(*v, None, Some(0.5)),
                    p_value: 0.5,
                })
                .collect(),
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── Builders ──────────────────────────────────────────────────────────────

    #[test]
    fn test_performance_plot_series() {
        let spec = performance_plot(&comparison(), &Theme::dark()).unwrap();
        assert_eq!(spec.chunk_keys.len(), 4);
        let realized = spec.series.iter().find(|s| s.name == "realized").unwrap();
        // NaN realized value is skipped, x positions keep their row index.
        assert_eq!(realized.points, vec![(0.0, 0.94), (1.0, 0.92), (3.0, 0.65)]);
        let alerts = spec.series.iter().find(|s| s.name == "alert").unwrap();
        assert_eq!(alerts.kind, SeriesKind::Scatter);
        assert_eq!(alerts.points, vec![(3.0, 0.70), (3.0, 0.65)]);
    }

    #[test]
    fn test_performance_plot_empty_is_none() {
        let empty = ComparisonResult {
            metric: "accuracy".to_string(),
            rows: Vec::new(),
        };
        assert!(performance_plot(&empty, &Theme::dark()).is_none());
    }

    #[test]
    fn test_drift_plots_grouped_by_method() {
        let drift = DriftResult {
            columns: vec![
                drift_column("transaction_amount", "kolmogorov_smirnov", &[0.1, 0.2, 0.9]),
                drift_column("transaction_type", "chi2", &[1.0, 40.0, 2.0]),
                drift_column("time_since_login_min", "kolmogorov_smirnov", &[0.1, 0.1, 1.0]),
            ],
        };
        let plots = drift_plots(&drift, &Theme::dark());
        assert_eq!(plots.len(), 2);
        assert_eq!(plots[0].title, "Feature drift (kolmogorov_smirnov)");
        // Two columns plus the alert scatter.
        assert_eq!(plots[0].series.len(), 3);
        assert_eq!(plots[1].series.len(), 2);
        assert_eq!(plots[0].x_labels(), vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn test_amount_plot_alert_points() {
        let rows = [100.0, 101.0, 300.0]
            .iter()
            .enumerate()
            .map(|(i, v)| MetricRow {
                chunk: chunk(&format!("2024-{:02}", i + 1), i, DataPeriod::Analysis),
                metric: MetricValue::with_thresholds(*v, Some(95.0), Some(105.0)),
            })
            .collect();
        let stats = MetricResult::new("transaction_amount", rows);
        let spec = amount_plot(&stats, &Theme::light()).unwrap();
        assert_eq!(spec.title, "Average transaction_amount");
        let alerts = spec.series.iter().find(|s| s.name == "alert").unwrap();
        assert_eq!(alerts.points, vec![(2.0, 300.0)]);
    }

    // ── Bounds and labels ─────────────────────────────────────────────────────

    #[test]
    fn test_y_bounds_padded() {
        let spec = PlotSpec {
            title: String::new(),
            y_title: String::new(),
            chunk_keys: vec!["a".into(), "b".into()],
            series: vec![Series::line("s", vec![(0.0, 0.0), (1.0, 10.0)], Style::default())],
        };
        assert_eq!(spec.y_bounds(), [-0.5, 10.5]);
        assert_eq!(spec.x_bounds(), [0.0, 1.0]);
    }

    #[test]
    fn test_y_bounds_flat_series() {
        let spec = PlotSpec {
            title: String::new(),
            y_title: String::new(),
            chunk_keys: vec!["a".into()],
            series: vec![Series::line("s", vec![(0.0, 5.0)], Style::default())],
        };
        assert_eq!(spec.y_bounds(), [4.0, 6.0]);
        assert_eq!(spec.x_bounds(), [0.0, 1.0]);
        assert_eq!(spec.x_labels(), vec!["a"]);
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_performance_plot() {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let spec = performance_plot(&comparison(), &theme).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_plot(frame, area, &spec, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Estimated vs realized accuracy"));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let backend = TestBackend::new(10, 4);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::light();
        let spec = performance_plot(&comparison(), &theme).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_plot(frame, area, &spec, &theme);
            })
            .unwrap();
    }
}
