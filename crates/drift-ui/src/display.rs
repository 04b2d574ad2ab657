//! Best-effort terminal plots.
//!
//! Whether plots can be drawn is decided once per run by
//! [`PlotCapability::detect`]. When they can, each chart is drawn into an
//! inline viewport below the report; a chart that fails to draw is reported
//! as an informational line and the run carries on.

use std::io::{self, IsTerminal, Write};

use crossterm::{cursor::MoveTo, execute};
use ratatui::{backend::CrosstermBackend, Terminal, TerminalOptions, Viewport};
use tracing::{debug, info};

use drift_data::analysis::{MonitoringOutputs, AMOUNT_COLUMN};

use crate::plots::{self, PlotSpec};
use crate::themes::Theme;

/// Smallest terminal the charts are drawn in.
const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 12;
/// Tallest chart, in rows.
const MAX_PLOT_HEIGHT: u16 = 18;

// ── PlotCapability ────────────────────────────────────────────────────────────

/// Result of the one-time check for plotting support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotCapability {
    Available { width: u16, height: u16 },
    Unavailable(String),
}

impl PlotCapability {
    /// Probe stdout. Plots need a terminal whose size can be read.
    pub fn detect(no_plot: bool) -> Self {
        if no_plot {
            return Self::Unavailable("plotting disabled".to_string());
        }
        if !io::stdout().is_terminal() {
            return Self::Unavailable("stdout is not a terminal".to_string());
        }
        match crossterm::terminal::size() {
            Ok((width, height)) => Self::from_size(width, height),
            Err(e) => Self::Unavailable(format!("terminal size unavailable: {}", e)),
        }
    }

    fn from_size(width: u16, height: u16) -> Self {
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            Self::Unavailable(format!("terminal too small ({}x{})", width, height))
        } else {
            Self::Available { width, height }
        }
    }

    /// Rows given to each chart.
    pub fn plot_height(&self) -> Option<u16> {
        match self {
            Self::Available { height, .. } => Some(height.saturating_sub(2).min(MAX_PLOT_HEIGHT)),
            Self::Unavailable(_) => None,
        }
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Every chart of a run, labelled for the status lines.
pub fn collect_plots(
    outputs: &MonitoringOutputs,
    theme: &Theme,
) -> Vec<(String, Option<PlotSpec>)> {
    let mut specs = vec![(
        "Performance comparison".to_string(),
        plots::performance_plot(&outputs.comparison, theme),
    )];

    let drift = plots::drift_plots(&outputs.drift, theme);
    if drift.is_empty() {
        specs.push(("Feature drift".to_string(), None));
    }
    specs.extend(drift.into_iter().map(|spec| (spec.title.clone(), Some(spec))));

    specs.push((
        "Transaction amount statistics".to_string(),
        outputs
            .summary_stats
            .column(AMOUNT_COLUMN)
            .and_then(|stats| plots::amount_plot(stats, theme)),
    ));
    specs
}

/// Draw every chart inline on stdout, writing one status line per chart to
/// `out`. Returns the number of charts drawn.
pub fn render_plots<W: Write>(
    outputs: &MonitoringOutputs,
    theme: &Theme,
    capability: &PlotCapability,
    out: &mut W,
) -> io::Result<usize> {
    let Some(height) = capability.plot_height() else {
        return render_plots_with(outputs, theme, capability, out, |_| Ok(()));
    };
    render_plots_with(outputs, theme, capability, out, |spec| {
        draw_inline(spec, theme, height)
    })
}

/// [`render_plots`] with the drawing step supplied by the caller.
pub fn render_plots_with<W, F>(
    outputs: &MonitoringOutputs,
    theme: &Theme,
    capability: &PlotCapability,
    out: &mut W,
    mut draw: F,
) -> io::Result<usize>
where
    W: Write,
    F: FnMut(&PlotSpec) -> io::Result<()>,
{
    writeln!(out)?;
    writeln!(out, "=== ENHANCED ANALYSIS ===")?;

    if let PlotCapability::Unavailable(reason) = capability {
        info!("Skipping plots: {}", reason);
        writeln!(out, "Plots not displayed: {}", reason)?;
        return Ok(0);
    }

    let mut drawn = 0;
    for (label, spec) in collect_plots(outputs, theme) {
        let Some(spec) = spec else {
            writeln!(out, "{} plot could not be displayed: no data", label)?;
            continue;
        };
        out.flush()?;
        match draw(&spec) {
            Ok(()) => {
                drawn += 1;
                writeln!(out, "{} plot displayed", label)?;
            }
            Err(e) => {
                debug!("Drawing '{}' failed: {}", label, e);
                writeln!(out, "{} plot could not be displayed: {}", label, e)?;
            }
        }
    }
    Ok(drawn)
}

fn draw_inline(spec: &PlotSpec, theme: &Theme, height: u16) -> io::Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(height),
        },
    )?;
    terminal.draw(|frame| {
        let area = frame.area();
        plots::render_plot(frame, area, spec, theme);
    })?;
    let bottom = terminal.get_frame().area().bottom();
    execute!(terminal.backend_mut(), MoveTo(0, bottom))?;
    terminal.show_cursor()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
