use clap::Parser;
use std::path::PathBuf;

use crate::config::MonitoringConfig;
use crate::error::Result;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Production monitoring report for a binary fraud-detection model
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fraud-monitor",
    about = "Compare production data against a reference baseline and report performance alerts, feature drift and unusual transaction amounts",
    version
)]
pub struct Settings {
    /// Reference (baseline) dataset
    #[arg(long, default_value = "reference.csv")]
    pub reference: PathBuf,

    /// Analysis (production) dataset
    #[arg(long, default_value = "analysis.csv")]
    pub analysis: PathBuf,

    /// JSON file with monitoring options (metric, features, thresholds)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// IANA timezone used for timestamps without an offset
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Report format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub output: String,

    /// Skip terminal plots
    #[arg(long)]
    pub no_plot: bool,

    /// Run calculators one after another on the current thread
    #[arg(long)]
    pub sequential: bool,

    /// Plot colour theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(
        long,
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path (logs go to stderr otherwise)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Parse an explicit argument list; `--debug` overrides `--log-level`.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Resolve the monitoring options from `--config`, or the defaults.
    pub fn monitoring_config(&self) -> Result<MonitoringConfig> {
        MonitoringConfig::load_or_default(self.config.as_deref())
    }

    pub fn wants_json(&self) -> bool {
        self.output == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
