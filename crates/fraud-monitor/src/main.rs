mod bootstrap;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use drift_core::settings::Settings;
use drift_core::time_utils::TimezoneHandler;
use drift_data::analysis::summarize;
use drift_data::engine::BaselineService;
use drift_runtime::orchestrator::{ExecutionMode, MonitoringOrchestrator};
use drift_ui::display::{render_plots, PlotCapability};
use drift_ui::report::{render_explanation, render_json, render_text_report};
use drift_ui::themes::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("fraud-monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Reference: {}, Analysis: {}, Output: {}",
        settings.reference.display(),
        settings.analysis.display(),
        settings.output
    );

    let config = settings.monitoring_config()?;
    let tz = TimezoneHandler::new(&settings.timezone)?;

    let orchestrator = MonitoringOrchestrator::new(
        BaselineService::new(),
        config.clone(),
        ExecutionMode::from_flag(settings.sequential),
    );

    // Both files must load before any calculation starts.
    let (reference, analysis) = orchestrator
        .load(settings.reference.clone(), settings.analysis.clone(), tz)
        .await?;
    let reference = Arc::new(reference);
    let analysis = Arc::new(analysis);

    let outputs = orchestrator
        .run(Arc::clone(&reference), Arc::clone(&analysis))
        .await?;
    let summary = summarize(&outputs, &config, &reference, &analysis)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if settings.wants_json() {
        writeln!(out, "{}", render_json(&summary)?)?;
        return Ok(());
    }

    write!(out, "{}", render_text_report(&summary))?;

    let capability = PlotCapability::detect(settings.no_plot);
    let theme = Theme::from_name(&settings.theme);
    render_plots(&outputs, &theme, &capability, &mut out)?;

    writeln!(out)?;
    write!(out, "{}", render_explanation(&summary))?;
    out.flush()?;

    Ok(())
}
