use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration shared by the queue backoff and the analysis engine.
/// Delays grow exponentially from `base_delay`; `jitter_factor` adds up to
/// that fraction of the computed delay on top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter_factor: f64,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration, jitter_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            jitter_factor,
        }
    }

    /// Queue redelivery default: 3 attempts, exponential from 1s.
    pub const fn queue_default() -> Self {
        Self::new(3, Duration::from_secs(1), 0.0)
    }

    /// Engine-side generation attempts: retries are immediate, the AI call's
    /// own latency is the only pacing.
    pub const fn generation_default() -> Self {
        Self::new(3, Duration::ZERO, 0.0)
    }

    /// Delay to wait after the given 1-based failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self.base_delay.saturating_mul(1u32 << exponent);

        if self.jitter_factor <= 0.0 || base.is_zero() {
            return base;
        }

        let jitter = rand::thread_rng().gen_range(0.0..self.jitter_factor);
        base + base.mul_f64(jitter)
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping the policy delay
/// between failures. The closure receives the 1-based attempt number.
pub async fn retry_with_policy<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(_) if attempt < attempts => {
                let delay = policy.delay_for_attempt(attempt);
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delays_double_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1), 0.0);

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn jitter_stays_within_factor() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2), 0.5);

        for attempt in 1..=3 {
            let base = Duration::from_secs(2) * (1 << (attempt - 1));
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay >= base);
            assert!(delay <= base + base.mul_f64(0.5));
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO, 0.0);

        let result: Result<u32, &str> = retry_with_policy(&policy, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err("transient")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_exhausted() {
        let policy = RetryPolicy::new(2, Duration::ZERO, 0.0);

        let result: Result<(), String> =
            retry_with_policy(&policy, |attempt| async move {
                Err(format!("attempt {attempt} failed"))
            })
            .await;

        assert_eq!(result, Err("attempt 2 failed".to_string()));
    }
}
