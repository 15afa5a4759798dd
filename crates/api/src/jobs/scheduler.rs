use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
    Hourly,
    Daily,
}

impl JobFrequency {
    fn interval(&self) -> Duration {
        match self {
            JobFrequency::Seconds(s) => Duration::from_secs(*s),
            JobFrequency::Minutes(m) => Duration::from_secs(m * 60),
            JobFrequency::Hourly => Duration::from_secs(60 * 60),
            JobFrequency::Daily => Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// A periodic background task.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;
    fn frequency(&self) -> JobFrequency;
    async fn execute(&self) -> anyhow::Result<()>;
}

/// Runs registered jobs on their intervals until shutdown.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
        }
    }

    pub fn register(&mut self, job: Arc<dyn Job>) {
        self.jobs.push(job);
    }

    /// Spawns one task per job. The first tick fires immediately and is
    /// skipped so startup is not delayed by slow jobs.
    pub fn start(&self) {
        for job in &self.jobs {
            let job = job.clone();
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(job.frequency().interval());
                interval.tick().await;

                tracing::info!(job = job.name(), "Background job scheduled");
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let start = std::time::Instant::now();
                            match job.execute().await {
                                Ok(()) => {
                                    tracing::debug!(
                                        job = job.name(),
                                        duration_ms = start.elapsed().as_millis() as u64,
                                        "Job run completed"
                                    );
                                }
                                Err(err) => {
                                    tracing::error!(
                                        job = job.name(),
                                        error = %err,
                                        "Job run failed"
                                    );
                                }
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                tracing::info!(job = job.name(), "Background job stopped");
                                break;
                            }
                        }
                    }
                }
            });
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingJob {
        runs: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(1)
        }

        async fn execute(&self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_on_interval_and_stop_on_shutdown() {
        let runs = Arc::new(AtomicU32::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(Arc::new(CountingJob { runs: runs.clone() }));
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let after_run = runs.load(Ordering::SeqCst);
        assert!(after_run >= 2, "expected at least two runs, got {after_run}");

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_shutdown = runs.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }
}
