//! Calls-per-minute pacing between batches

use std::time::Duration;

use ingestline_core::Delay;

use crate::error::ConfigError;

/// Enforces `60s / calls_per_minute` between resolved batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    calls_per_minute: u32,
}

impl Pacer {
    pub fn new(calls_per_minute: u32) -> Result<Self, ConfigError> {
        if calls_per_minute == 0 {
            return Err(ConfigError::RateLimit(calls_per_minute));
        }
        Ok(Self { calls_per_minute })
    }

    /// Length of one slot.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(60) / self.calls_per_minute
    }

    /// Block for one slot.
    pub fn wait_slot(&self, delay: &dyn Delay) {
        delay.delay(self.interval());
    }
}
