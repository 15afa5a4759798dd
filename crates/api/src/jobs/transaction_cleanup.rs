use super::{Job, JobFrequency};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use persistence::repositories::PaymentTransactionRepository;
use sqlx::PgPool;

/// Prunes old non-success transactions. Successful payments are the
/// purchase record and are kept forever.
pub struct TransactionCleanupJob {
    transactions: PaymentTransactionRepository,
    retention_days: i64,
}

impl TransactionCleanupJob {
    pub fn new(pool: PgPool, retention_days: i64) -> Self {
        Self {
            transactions: PaymentTransactionRepository::new(pool),
            retention_days,
        }
    }
}

#[async_trait]
impl Job for TransactionCleanupJob {
    fn name(&self) -> &'static str {
        "transaction_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Daily
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let cutoff = Utc::now() - Duration::days(self.retention_days);
        let deleted = self.transactions.delete_stale_non_success(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, retention_days = self.retention_days, "Stale transactions removed");
        }
        Ok(())
    }
}
