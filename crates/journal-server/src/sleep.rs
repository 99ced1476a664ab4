use std::time::Duration;
use async_trait::async_trait;
use journal_core::ports::SleepPort;

/// Sleeps on the actix (tokio) runtime between run status checks.
pub struct TokioSleep;

#[async_trait(?Send)]
impl SleepPort for TokioSleep {
    async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
