//! Fixed pause between documents to stay under upstream rate limits

use tokio::time::{Duration, sleep};

#[derive(Debug, Clone, Copy)]
pub struct RateGovernor {
    delay: Duration,
}

impl RateGovernor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        tracing::info!(delay_secs = self.delay.as_secs_f64(), "Pausing before next document");
        sleep(self.delay).await;
    }
}
