use crate::error::{SimError, SimResult};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Time units the clock advances per tick. Must be positive.
    pub tick_interval: i64,
    /// Timestamp of the clock before the first tick.
    pub start_timestamp: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_interval: 3600,
            start_timestamp: 0,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of time units per tick.
    pub fn with_tick_interval(mut self, interval: i64) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the timestamp the clock starts from.
    pub fn with_start_timestamp(mut self, timestamp: i64) -> Self {
        self.start_timestamp = timestamp;
        self
    }

    /// Reject configurations the clock cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        if self.tick_interval <= 0 {
            return Err(SimError::Config(format!(
                "tick_interval must be positive, got {}",
                self.tick_interval
            )));
        }
        Ok(())
    }
}
