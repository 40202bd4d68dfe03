// ── Reconnection backoff ──

use std::time::Duration;

/// Exponential backoff configuration for push-channel reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 10s.
    pub max_delay: Duration,

    /// Automatic attempts before the channel is reported as degraded.
    /// Retrying continues afterwards at `max_delay`. Default: 5.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    /// `true` once `attempt` has used up the automatic attempts.
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Delay before reconnect attempt number `attempt` (0-based).
    ///
    /// Exponential with spread while attempts remain; a flat `max_delay`
    /// once they are exhausted.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.exhausted(attempt) {
            return self.max_delay;
        }
        calculate_backoff(attempt, self)
    }
}

/// `initial * 2^attempt`, spread by up to 25% either way, never above `max_delay`.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let max = config.max_delay.as_secs_f64();
    let exponent = i32::try_from(attempt.min(32)).unwrap_or(32);
    let doubled = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);

    // Spread derived from the attempt number so schedules are reproducible
    // while many viewers still land on different delays.
    let spread = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let secs = (doubled.min(max) * spread).clamp(0.0, max);

    Duration::from_secs_f64(secs)
}
