use crate::domain::model::{Fingerprint, GuardDecision, RejectReason};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Ledger size above which a check also sweeps every expired entry.
pub const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
struct Ledger {
    last_accepted: HashMap<String, DateTime<Utc>>,
    recent: HashMap<(String, Fingerprint), DateTime<Utc>>,
}

impl Ledger {
    fn len(&self) -> usize {
        self.last_accepted.len() + self.recent.len()
    }
}

/// Per-requester cooldown plus short-window duplicate suppression.
///
/// Both maps sit behind one lock so a check always sees them consistently.
/// Expired entries are dropped when consulted; a full sweep only runs once the
/// ledger outgrows [`SWEEP_THRESHOLD`].
#[derive(Debug)]
pub struct CooldownGuard {
    cooldown: Duration,
    dedup_window: Duration,
    ledger: Mutex<Ledger>,
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::milliseconds((secs.max(0.0) * 1000.0).round() as i64)
}

impl CooldownGuard {
    pub fn new(cooldown: Duration, dedup_window: Duration) -> Self {
        Self {
            cooldown,
            dedup_window,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn from_secs_f64(cooldown_secs: f64, dedup_window_secs: f64) -> Self {
        Self::new(secs_to_duration(cooldown_secs), secs_to_duration(dedup_window_secs))
    }

    /// Decides and, on `Accept`, records the request in one step.
    pub fn check(
        &self,
        requester: &str,
        fingerprint: &Fingerprint,
        now: DateTime<Utc>,
    ) -> GuardDecision {
        let mut ledger = match self.ledger.lock() {
            Ok(guard) => guard,
            // 鎖被污染時資料仍可用
            Err(poisoned) => poisoned.into_inner(),
        };

        if ledger.len() > SWEEP_THRESHOLD {
            self.sweep(&mut ledger, now);
        }

        if let Some(last) = ledger.last_accepted.get(requester).copied() {
            if now - last < self.cooldown {
                tracing::debug!(
                    requester,
                    since_last_ms = (now - last).num_milliseconds(),
                    "Requester on cooldown"
                );
                return GuardDecision::Reject(RejectReason::Cooldown);
            }
            ledger.last_accepted.remove(requester);
        }

        // 冷卻過後才看是否為重複請求
        let key = (requester.to_string(), fingerprint.clone());
        if let Some(seen) = ledger.recent.get(&key).copied() {
            if now - seen < self.dedup_window {
                tracing::debug!(requester, "Suppressed duplicate request");
                return GuardDecision::Reject(RejectReason::Duplicate);
            }
            ledger.recent.remove(&key);
        }

        ledger.last_accepted.insert(requester.to_string(), now);
        ledger.recent.insert(key, now);
        GuardDecision::Accept
    }

    fn sweep(&self, ledger: &mut Ledger, now: DateTime<Utc>) {
        let before = ledger.len();
        ledger.last_accepted.retain(|_, at| now - *at < self.cooldown);
        ledger.recent.retain(|_, at| now - *at < self.dedup_window);
        tracing::debug!(removed = before - ledger.len(), "Swept cooldown ledger");
    }

    #[cfg(test)]
    fn tracked_entries(&self) -> usize {
        match self.ledger.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
