pub mod otp_cleanup;
pub mod pool_metrics;
pub mod scheduler;
pub mod transaction_cleanup;

pub use otp_cleanup::OtpCleanupJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use transaction_cleanup::TransactionCleanupJob;
