use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Process-wide pacing point in front of every outbound call.
///
/// Waiters are admitted in arrival order (tokio's `Mutex` is fair). The lock is
/// held only while waiting for the slot and stamping it, never across the call
/// itself, so responses may overlap while call starts stay spaced out.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self::new(Duration::from_secs_f64(secs.max(0.0)))
    }

    /// Waits for the next free slot and returns the dispatch instant.
    pub async fn admit(&self) -> Instant {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if Instant::now() < ready_at {
                tracing::trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "waiting at rate gate"
                );
                sleep_until(ready_at).await;
            }
        }
        let now = Instant::now();
        *last = Some(now);
        now
    }
}
