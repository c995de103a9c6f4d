//! Exponential backoff for idempotent upstream reads.
//!
//! Writes are never retried: a timed-out POST may already have been
//! applied upstream.

use std::time::Duration;

/// Tunable parameters for the backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let config = RetryConfig::default();
        let d = next_delay(Duration::from_millis(200), &config);
        assert_eq!(d, Duration::from_millis(400));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(1),
            ..Default::default()
        };
        let d = next_delay(Duration::from_millis(800), &config);
        assert_eq!(d, Duration::from_secs(1));
    }

    #[test]
    fn disabled_has_no_retries() {
        assert_eq!(RetryConfig::disabled().max_retries, 0);
    }
}
