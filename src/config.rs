//! Pool configuration options

use std::time::Duration;

use crate::errors::{PoolError, PoolResult};

/// Configuration for pool sizing and reclamation behavior
///
/// # Examples
///
/// ```
/// use repool::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::new()
///     .with_initial_size(4)
///     .with_max_size(32)
///     .with_sweep_interval(Duration::from_millis(50));
///
/// assert_eq!(config.initial_size, 4);
/// assert_eq!(config.max_size, 32);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Number of instances fabricated up front at construction
    pub initial_size: usize,

    /// Hard cap on instances alive at any moment (checked out + idle + parked)
    pub max_size: usize,

    /// How often the background sweeper checks for expired delayed releases.
    /// A delayed instance becomes available at most one interval past its
    /// nominal expiry.
    pub sweep_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 0,
            max_size: 100,
            sweep_interval: Duration::from_millis(100),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many instances are fabricated at construction
    pub fn with_initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Set the capacity cap
    ///
    /// # Examples
    ///
    /// ```
    /// use repool::PoolConfig;
    ///
    /// let config = PoolConfig::new().with_max_size(50);
    /// assert_eq!(config.max_size, 50);
    /// ```
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Set the sweeper polling interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Check the configuration for contradictions, returning
    /// [`PoolError::Config`] if any are found.
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_size == 0 {
            return Err(PoolError::Config(
                "max_size must be greater than 0".into(),
            ));
        }
        if self.initial_size > self.max_size {
            return Err(PoolError::Config(format!(
                "initial_size ({}) must not exceed max_size ({})",
                self.initial_size, self.max_size
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(PoolError::Config(
                "sweep_interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PoolConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = PoolConfig::new().with_max_size(0);
        assert!(matches!(config.validate(), Err(PoolError::Config(_))));
    }

    #[test]
    fn rejects_initial_above_max() {
        let config = PoolConfig::new().with_initial_size(10).with_max_size(5);
        assert!(matches!(config.validate(), Err(PoolError::Config(_))));
    }

    #[test]
    fn rejects_zero_interval() {
        let config = PoolConfig::new().with_sweep_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(PoolError::Config(_))));
    }
}
