use super::{Job, JobFrequency};
use async_trait::async_trait;
use persistence::repositories::OtpRepository;
use sqlx::PgPool;

/// Removes expired one-time codes. Consumed codes expire too, so this
/// also bounds table growth under heavy login traffic.
pub struct OtpCleanupJob {
    otps: OtpRepository,
}

impl OtpCleanupJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            otps: OtpRepository::new(pool),
        }
    }
}

#[async_trait]
impl Job for OtpCleanupJob {
    fn name(&self) -> &'static str {
        "otp_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let deleted = self.otps.delete_expired().await?;
        if deleted > 0 {
            tracing::info!(deleted, "Expired OTP codes removed");
        }
        Ok(())
    }
}
