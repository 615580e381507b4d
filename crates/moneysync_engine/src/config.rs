//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the ledger service.
    pub base_url: String,
    /// Months of transaction history pulled per account.
    pub pull_window_months: u32,
    /// Upper bound on concurrent per-account pulls.
    pub max_concurrent_pulls: usize,
    /// Per-attempt request timeout.
    pub request_timeout: Duration,
    /// Retry configuration for individual requests.
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            pull_window_months: 3,
            max_concurrent_pulls: 4,
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the pull window length in months.
    pub fn with_pull_window_months(mut self, months: u32) -> Self {
        self.pull_window_months = months;
        self
    }

    /// Sets the per-account pull concurrency. Zero is treated as one.
    pub fn with_max_concurrent_pulls(mut self, max: usize) -> Self {
        self.max_concurrent_pulls = max.max(1);
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Configuration for request retries.
///
/// A request is retried when the server answers with a 5xx status or the
/// transport fails. The default is a fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub delay: Duration,
    /// Growth factor applied to the delay for later attempts.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Creates a configuration with `max_attempts` and a one second delay.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = self.delay.as_secs_f64()
            * self
                .backoff_multiplier
                .max(1.0)
                .powi(attempt.saturating_sub(1) as i32);

        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
