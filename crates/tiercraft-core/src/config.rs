use chrono::TimeDelta;

use crate::fixed::Quantity;
use crate::provision::DEFAULT_RETRY_LIMIT;

/// Tunable scheduler constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Units queued per dispatch.
    pub batch_size: Quantity,
    /// Resolve-and-transfer attempts allowed per ingredient.
    pub retry_limit: u32,
    /// Minimum time between two recounts.
    pub recount_interval: TimeDelta,
    /// Completed dispatches remembered for status. 0 = none.
    pub dispatch_history: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: Quantity::from_num(100),
            retry_limit: DEFAULT_RETRY_LIMIT,
            recount_interval: TimeDelta::minutes(1),
            dispatch_history: 32,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size <= Quantity::ZERO {
            return Err(ConfigError::NonPositiveBatch(self.batch_size));
        }
        if self.retry_limit == 0 {
            return Err(ConfigError::ZeroRetryLimit);
        }
        if self.recount_interval < TimeDelta::zero() {
            return Err(ConfigError::NegativeInterval(self.recount_interval));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("batch size must be positive, got {0}")]
    NonPositiveBatch(Quantity),
    #[error("retry limit must be at least 1")]
    ZeroRetryLimit,
    #[error("recount interval must not be negative, got {0}")]
    NegativeInterval(TimeDelta),
}
