//! Scheduling of the monitoring calculators.
//!
//! The four calculator jobs (estimated performance, realized performance,
//! drift, summary statistics) are independent and run as blocking tasks on
//! the tokio pool. Ranking needs realized performance and drift, so it is
//! chained after those two. The first failing job aborts the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context};
use drift_core::config::MonitoringConfig;
use drift_core::error::Result as MonitorResult;
use drift_core::models::Dataset;
use drift_core::service::MonitoringService;
use drift_core::time_utils::TimezoneHandler;
use drift_data::analysis::{self, MonitoringOutputs};
use drift_data::reader::load_dataset;
use tokio::task::JoinHandle;
use tracing::debug;

// ── ExecutionMode ─────────────────────────────────────────────────────────────

/// How the calculator jobs are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Independent jobs on the blocking pool.
    Concurrent,
    /// Every job on the calling thread, one after another.
    Sequential,
}

impl ExecutionMode {
    pub fn from_flag(sequential: bool) -> Self {
        if sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        }
    }
}

// ── MonitoringOrchestrator ────────────────────────────────────────────────────

/// Runs a [`MonitoringService`] over one reference/analysis pair.
pub struct MonitoringOrchestrator<S> {
    service: Arc<S>,
    config: Arc<MonitoringConfig>,
    mode: ExecutionMode,
}

impl<S> MonitoringOrchestrator<S>
where
    S: MonitoringService + 'static,
{
    pub fn new(service: S, config: MonitoringConfig, mode: ExecutionMode) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            mode,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Load both datasets in parallel. Either failure aborts before any
    /// calculation starts.
    pub async fn load(
        &self,
        reference: PathBuf,
        analysis: PathBuf,
        tz: TimezoneHandler,
    ) -> anyhow::Result<(Dataset, Dataset)> {
        if self.mode == ExecutionMode::Sequential {
            return Ok(analysis::load_inputs(&reference, &analysis, &tz)?);
        }
        let tz_ref = tz.clone();
        let reference_job =
            tokio::task::spawn_blocking(move || load_dataset(&reference, "reference", &tz_ref));
        let analysis_job =
            tokio::task::spawn_blocking(move || load_dataset(&analysis, "analysis", &tz));
        let (reference, analysis) = tokio::try_join!(
            join("load reference", reference_job),
            join("load analysis", analysis_job)
        )?;
        Ok((reference, analysis))
    }

    /// Run every calculator and collect the result tables.
    pub async fn run(
        &self,
        reference: Arc<Dataset>,
        analysis: Arc<Dataset>,
    ) -> anyhow::Result<MonitoringOutputs> {
        let started = Instant::now();
        let outputs = match self.mode {
            ExecutionMode::Sequential => {
                analysis::run_pipeline(&*self.service, &reference, &analysis, &self.config)?
            }
            ExecutionMode::Concurrent => self.run_concurrent(reference, analysis).await?,
        };
        debug!(
            "Monitoring calculators finished in {:.3}s ({:?})",
            started.elapsed().as_secs_f64(),
            self.mode
        );
        Ok(outputs)
    }

    // ── Private implementation ────────────────────────────────────────────────

    async fn run_concurrent(
        &self,
        reference: Arc<Dataset>,
        analysis: Arc<Dataset>,
    ) -> anyhow::Result<MonitoringOutputs> {
        let estimated = self.spawn(&reference, &analysis, analysis::estimate_performance::<S>);
        let realized = self.spawn(&reference, &analysis, analysis::realized_performance::<S>);
        let drift = self.spawn(&reference, &analysis, analysis::univariate_drift::<S>);
        let summary = self.spawn(&reference, &analysis, analysis::summary_statistics::<S>);

        let service = Arc::clone(&self.service);
        let ranked = async move {
            let (realized, drift) = tokio::try_join!(
                join("realized performance", realized),
                join("univariate drift", drift)
            )?;
            let job = tokio::task::spawn_blocking(move || {
                analysis::rank_features(&*service, &realized, &drift)
                    .map(|ranking| (realized, drift, ranking))
            });
            join("feature ranking", job).await
        };

        let (estimated, (realized, drift, ranking), summary) = tokio::try_join!(
            join("estimated performance", estimated),
            ranked,
            join("summary statistics", summary)
        )?;

        Ok(analysis::assemble(
            &*self.service,
            estimated,
            realized,
            drift,
            Some(ranking),
            summary,
        )?)
    }

    fn spawn<T>(
        &self,
        reference: &Arc<Dataset>,
        analysis: &Arc<Dataset>,
        job: fn(&S, &Dataset, &Dataset, &MonitoringConfig) -> MonitorResult<T>,
    ) -> JoinHandle<MonitorResult<T>>
    where
        T: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let config = Arc::clone(&self.config);
        let reference = Arc::clone(reference);
        let analysis = Arc::clone(analysis);
        tokio::task::spawn_blocking(move || job(&service, &reference, &analysis, &config))
    }
}

/// Await a blocking job, flattening panics and job errors into one error.
async fn join<T>(name: &'static str, handle: JoinHandle<MonitorResult<T>>) -> anyhow::Result<T> {
    match handle.await {
        Ok(result) => result.with_context(|| format!("{} failed", name)),
        Err(e) => Err(anyhow!("{} task did not complete: {}", name, e)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use drift_core::error::MonitorError;
    use drift_core::models::EventRecord;
    use drift_data::engine::BaselineService;
    use std::io::Write;
    use std::path::Path;

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// `months` months of 20 records each starting January `year`; accuracy
    /// and amounts vary a little from month to month.
    fn records(year: i32, months: u32, amount_shift: f64) -> Vec<EventRecord> {
        let mut out = Vec::new();
        for m in 1..=months {
            for i in 0..20u32 {
                let is_fraud = i % 4 == 0;
                let wrong = i < m % 3;
                let predicted = is_fraud != wrong;
                out.push(EventRecord {
                    timestamp: Utc.with_ymd_and_hms(year, m, 1 + i, 8, 0, 0).unwrap(),
                    is_fraud,
                    predicted_fraud: predicted,
                    predicted_fraud_proba: if predicted { 0.9 } else { 0.1 },
                    transaction_amount: 100.0 + amount_shift * f64::from(m) + f64::from(i % 7),
                    transaction_type: if i % 3 == 0 { "transfer" } else { "purchase" }.to_string(),
                    time_since_login_min: f64::from(i % 5) + f64::from(m % 2),
                    is_first_transaction: i % 6 == 0,
                    user_tenure_months: 10.0 + f64::from(i % 10),
                });
            }
        }
        out
    }

    fn datasets() -> (Arc<Dataset>, Arc<Dataset>) {
        (
            Arc::new(Dataset::new("reference", "reference.csv", records(2023, 6, 1.0))),
            Arc::new(Dataset::new("analysis", "analysis.csv", records(2024, 6, 40.0))),
        )
    }

    fn write_csv(dir: &Path, name: &str, records: &[EventRecord]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "timestamp,is_fraud,predicted_fraud,predicted_fraud_proba,transaction_amount,transaction_type,time_since_login_min,is_first_transaction,user_tenure_months").unwrap();
        for r in records {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{}",
                r.timestamp.to_rfc3339(),
                r.is_fraud,
                r.predicted_fraud,
                r.predicted_fraud_proba,
                r.transaction_amount,
                r.transaction_type,
                r.time_since_login_min,
                r.is_first_transaction,
                r.user_tenure_months
            )
            .unwrap();
        }
        path
    }

    // ── ExecutionMode ─────────────────────────────────────────────────────────

    #[test]
    fn test_execution_mode_from_flag() {
        assert_eq!(ExecutionMode::from_flag(true), ExecutionMode::Sequential);
        assert_eq!(ExecutionMode::from_flag(false), ExecutionMode::Concurrent);
    }

    // ── run ───────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let (reference, analysis) = datasets();
        let config = MonitoringConfig::default();

        let concurrent = MonitoringOrchestrator::new(
            BaselineService::new(),
            config.clone(),
            ExecutionMode::Concurrent,
        );
        let sequential =
            MonitoringOrchestrator::new(BaselineService::new(), config, ExecutionMode::Sequential);

        let a = concurrent
            .run(Arc::clone(&reference), Arc::clone(&analysis))
            .await
            .unwrap();
        let b = sequential.run(reference, analysis).await.unwrap();

        // Debug output compares NaN correlations as equal.
        assert_eq!(format!("{:?}", a), format!("{:?}", b));
        assert_eq!(a.ranking.len(), 5);
        assert_eq!(a.comparison.rows.len(), 12);
        assert_eq!(a.summary_stats.columns.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_on_multi_thread_runtime() {
        let (reference, analysis) = datasets();
        let orch = MonitoringOrchestrator::new(
            BaselineService::new(),
            MonitoringConfig::default(),
            ExecutionMode::Concurrent,
        );
        let outputs = orch.run(reference, analysis).await.unwrap();
        assert_eq!(outputs.estimated.name, "accuracy");
        assert_eq!(outputs.drift.columns.len(), 5);
    }

    #[tokio::test]
    async fn test_job_error_aborts_run() {
        // A single reference month cannot fit the estimator.
        let reference = Arc::new(Dataset::new("reference", "reference.csv", records(2023, 1, 1.0)));
        let analysis = Arc::new(Dataset::new("analysis", "analysis.csv", records(2024, 3, 1.0)));
        let orch = MonitoringOrchestrator::new(
            BaselineService::new(),
            MonitoringConfig::default(),
            ExecutionMode::Concurrent,
        );

        let err = orch.run(reference, analysis).await.unwrap_err();
        assert!(err.to_string().contains("estimated performance"));
        assert!(matches!(
            err.downcast_ref::<MonitorError>(),
            Some(MonitorError::InsufficientReferenceData(_))
        ));
    }

    // ── load ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_load_both_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let reference = write_csv(dir.path(), "reference.csv", &records(2023, 2, 1.0));
        let analysis = write_csv(dir.path(), "analysis.csv", &records(2024, 1, 1.0));

        let orch = MonitoringOrchestrator::new(
            BaselineService::new(),
            MonitoringConfig::default(),
            ExecutionMode::Concurrent,
        );
        let (r, a) = orch
            .load(reference, analysis, TimezoneHandler::utc())
            .await
            .unwrap();
        assert_eq!(r.len(), 40);
        assert_eq!(a.len(), 20);
        assert_eq!(a.name, "analysis");
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let reference = write_csv(dir.path(), "reference.csv", &records(2023, 2, 1.0));

        for mode in [ExecutionMode::Concurrent, ExecutionMode::Sequential] {
            let orch = MonitoringOrchestrator::new(
                BaselineService::new(),
                MonitoringConfig::default(),
                mode,
            );
            let err = orch
                .load(reference.clone(), dir.path().join("nope.csv"), TimezoneHandler::utc())
                .await
                .unwrap_err();
            let root = err.root_cause().to_string();
            assert!(root.contains("nope.csv"), "{root}");
        }
    }
}
