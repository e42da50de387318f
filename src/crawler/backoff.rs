use crate::config::RetryConfig;
use std::time::Duration;

/// Delay schedule for retrying transient fetch failures
///
/// The delay before retry `n` (1-based) is `base * 2^(n-1)`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base_ms: u64,
    max_ms: u64,
}

impl ExponentialBackoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.base_delay_ms, config.max_delay_ms)
    }

    /// Delay to wait before the given retry
    ///
    /// | retry | delay (base 500ms) |
    /// |-------|--------------------|
    /// | 1     | 500ms              |
    /// | 2     | 1s                 |
    /// | 3     | 2s                 |
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(20);
        let delay = self.base_ms.saturating_mul(2u64.saturating_pow(exponent));
        Duration::from_millis(delay.min(self.max_ms))
    }
}
