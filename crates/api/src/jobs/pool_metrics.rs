use super::{Job, JobFrequency};
use async_trait::async_trait;
use persistence::metrics::record_pool_metrics;
use sqlx::PgPool;

/// Exports connection pool gauges for Prometheus.
pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        record_pool_metrics(&self.pool);
        Ok(())
    }
}
