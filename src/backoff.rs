//! Reconnect policy with exponential backoff.

use crate::config::ReconnectConfig;
use rand::Rng;
use std::time::Duration;

/// How a connection task retries failed opens and dropped sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Retry at all.
    pub enabled: bool,
    /// Consecutive failed opens tolerated before giving up.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Growth per attempt.
    pub factor: f64,
    /// Randomization factor in `[0, 1]`.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            factor: 2.0,
            jitter: 0.5,
        }
    }
}

impl ReconnectPolicy {
    /// Never retry.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Whether another open may be tried after `failures` consecutive
    /// failures.
    pub fn allows_retry(&self, failures: u32) -> bool {
        self.enabled && failures < self.max_attempts
    }

    /// Delay before retry number `attempt` (0-based).
    ///
    /// `initial * factor^attempt`, moved by up to `jitter * delay` in either
    /// direction and capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let initial = self.initial_delay.as_secs_f64();
        let cap = self.max_delay.as_secs_f64();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let mut delay = (initial * self.factor.powi(exponent)).min(cap);

        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter > 0.0 && delay > 0.0 {
            let spread = delay * jitter;
            delay += rand::thread_rng().gen_range(-spread..=spread);
        }

        Duration::from_secs_f64(delay.clamp(0.0, cap))
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            factor: config.factor,
            jitter: config.jitter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> ReconnectPolicy {
        ReconnectPolicy {
            jitter: 0.0,
            ..ReconnectPolicy::default()
        }
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let policy = fixed();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(5));
        assert_eq!(policy.delay_for(40), Duration::from_secs(5));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = ReconnectPolicy::default();
        for _ in 0..200 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(1), "{:?}", delay);
            assert!(delay <= Duration::from_secs(3), "{:?}", delay);
        }
        for _ in 0..200 {
            assert!(policy.delay_for(10) <= Duration::from_secs(5));
        }
    }

    #[test]
    fn test_allows_retry() {
        let policy = fixed();
        assert!(policy.allows_retry(0));
        assert!(policy.allows_retry(4));
        assert!(!policy.allows_retry(5));
        assert!(!ReconnectPolicy::disabled().allows_retry(0));
    }

    #[test]
    fn test_from_config() {
        let config = ReconnectConfig {
            max_attempts: 3,
            initial_delay_ms: 250,
            ..ReconnectConfig::default()
        };
        let policy = ReconnectPolicy::from(&config);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
    }
}
