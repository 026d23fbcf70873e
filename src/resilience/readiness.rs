use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub const DEFAULT_READY_ATTEMPTS: u32 = 30;
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(2);

/// Anything that can answer "is the service up right now?".
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> bool;
}

/// Adapts an async closure into a [`HealthProbe`].
pub struct FnProbe<F>(pub F);

#[async_trait]
impl<F, Fut> HealthProbe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn probe(&self) -> bool {
        (self.0)().await
    }
}

/// Outcome of one readiness wait. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub ready: bool,
    pub checked_at: SystemTime,
    /// Probes performed, including the successful one.
    pub attempts: u32,
}

/// Poll `probe` until it reports healthy or `max_attempts` probes have failed.
///
/// Sleeps `interval` between attempts but not after the last one. Exhaustion
/// yields `ready: false`; this never errors. `max_attempts == 0` behaves as 1.
pub async fn wait_until_ready(
    probe: &dyn HealthProbe,
    max_attempts: u32,
    interval: Duration,
) -> HealthStatus {
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        if probe.probe().await {
            info!(attempt, "service ready");
            return HealthStatus {
                ready: true,
                checked_at: SystemTime::now(),
                attempts: attempt,
            };
        }
        debug!(attempt, max_attempts, "service not ready yet");
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }
    warn!(
        attempts = max_attempts,
        interval_ms = interval.as_millis() as u64,
        "service did not become ready"
    );
    HealthStatus {
        ready: false,
        checked_at: SystemTime::now(),
        attempts: max_attempts,
    }
}

/// Polling budget for [`wait_until_ready`].
///
/// Defaults: 30 attempts, 2 s apart. Env overrides:
/// - `AI_SERVICES_READY_ATTEMPTS`
/// - `AI_SERVICES_READY_INTERVAL_MS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessGate {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_READY_ATTEMPTS,
            interval: DEFAULT_READY_INTERVAL,
        }
    }
}

impl ReadinessGate {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_env() -> Self {
        let d = Self::default();
        let max_attempts = std::env::var("AI_SERVICES_READY_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(d.max_attempts);
        let interval = std::env::var("AI_SERVICES_READY_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(d.interval);
        Self::new(max_attempts, interval)
    }

    pub async fn wait(&self, probe: &dyn HealthProbe) -> HealthStatus {
        wait_until_ready(probe, self.max_attempts, self.interval).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_probe() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let probe = FnProbe(move || {
            let c = c.clone();
            async move { c.fetch_add(1, Ordering::SeqCst) >= 2 }
        });
        let status = wait_until_ready(&probe, 5, Duration::from_secs(2)).await;
        assert!(status.ready);
        assert_eq!(status.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_probes_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let probe = FnProbe(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                false
            }
        });
        let status = wait_until_ready(&probe, 0, Duration::from_secs(1)).await;
        assert!(!status.ready);
        assert_eq!(status.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_final_attempt() {
        let probe = FnProbe(|| async { false });
        let start = tokio::time::Instant::now();
        let status = wait_until_ready(&probe, 3, Duration::from_secs(10)).await;
        assert!(!status.ready);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[test]
    fn test_default_budget() {
        let gate = ReadinessGate::default();
        assert_eq!(gate.max_attempts, 30);
        assert_eq!(gate.interval, Duration::from_secs(2));
    }
}
