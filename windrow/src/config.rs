//! Window configuration shared by both buffer variants and the keyed store.
//!
//! Configuration is validated fail-fast at construction: a buffer is never
//! created from an invalid parameter set. The same `WindowConfig` value is
//! handed to every per-key buffer a [`crate::store::Store`] creates, so
//! validation happens once up front rather than on the write path.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed configuration for a rolling buffer.
///
/// `max_buckets` is the physical capacity: the number of pre-allocated bucket
/// cells. `exposed_buckets` bounds how many of the most recent buckets are
/// visible to readers; the remaining `max_buckets - exposed_buckets` slots
/// give the writer slack before it overwrites a slot a reader might still be
/// walking. `period_millis` is the bucket duration.
///
/// # Example
///
/// ```rust
/// use windrow::WindowConfig;
///
/// // per-second buckets, last 60 visible, 4 slots of writer slack
/// let config = WindowConfig::new(64, 60, 1_000)?;
/// assert_eq!(config.period_of(2_500), 2);
/// # Ok::<(), windrow::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Physical capacity of the buffer in bucket cells.
    pub max_buckets: usize,

    /// Number of most-recent buckets visible to readers.
    ///
    /// Must satisfy `1 <= exposed_buckets <= max_buckets`.
    pub exposed_buckets: usize,

    /// Duration of one bucket period in milliseconds.
    pub period_millis: i64,
}

impl WindowConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `max_buckets` is zero, `exposed_buckets` is
    /// outside `1..=max_buckets`, or `period_millis` is not positive.
    pub fn new(
        max_buckets: usize,
        exposed_buckets: usize,
        period_millis: i64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_buckets,
            exposed_buckets,
            period_millis,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the parameter constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_buckets == 0 {
            return Err(ConfigError::ZeroMaxBuckets);
        }

        if self.exposed_buckets == 0 || self.exposed_buckets > self.max_buckets {
            return Err(ConfigError::ExposedBucketsOutOfRange {
                exposed: self.exposed_buckets,
                max: self.max_buckets,
            });
        }

        if self.period_millis <= 0 {
            return Err(ConfigError::NonPositivePeriod {
                period: self.period_millis,
            });
        }

        Ok(())
    }

    /// Maps a millisecond timestamp to its period index.
    ///
    /// Uses floored division, so negative timestamps round toward negative
    /// infinity. Two values belong to the same bucket iff their periods are
    /// equal.
    #[inline]
    #[must_use]
    pub fn period_of(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.period_millis)
    }

    /// Number of buckets actually visible to readers.
    ///
    /// Equals `exposed_buckets` for any validated configuration; kept as the
    /// single place the window size is derived from.
    #[inline]
    #[must_use]
    pub fn visible_buckets(&self) -> usize {
        self.exposed_buckets.min(self.max_buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_passes() {
        let config = WindowConfig::new(5, 3, 1_000).unwrap();
        assert_eq!(config.max_buckets, 5);
        assert_eq!(config.exposed_buckets, 3);
        assert_eq!(config.period_millis, 1_000);
        assert_eq!(config.visible_buckets(), 3);
    }

    #[test]
    fn exposed_may_equal_max() {
        assert!(WindowConfig::new(4, 4, 1_000).is_ok());
    }

    #[test]
    fn zero_max_buckets_rejected() {
        assert!(matches!(
            WindowConfig::new(0, 1, 1_000),
            Err(ConfigError::ZeroMaxBuckets)
        ));
    }

    #[test]
    fn exposed_out_of_range_rejected() {
        assert!(matches!(
            WindowConfig::new(5, 6, 1_000),
            Err(ConfigError::ExposedBucketsOutOfRange { exposed: 6, max: 5 })
        ));
        assert!(matches!(
            WindowConfig::new(5, 0, 1_000),
            Err(ConfigError::ExposedBucketsOutOfRange { exposed: 0, max: 5 })
        ));
    }

    #[test]
    fn non_positive_period_rejected() {
        assert!(matches!(
            WindowConfig::new(5, 3, 0),
            Err(ConfigError::NonPositivePeriod { period: 0 })
        ));
        assert!(matches!(
            WindowConfig::new(5, 3, -1_000),
            Err(ConfigError::NonPositivePeriod { period: -1_000 })
        ));
    }

    #[test]
    fn period_of_floors_toward_negative_infinity() {
        let config = WindowConfig::new(5, 3, 1_000).unwrap();
        assert_eq!(config.period_of(0), 0);
        assert_eq!(config.period_of(999), 0);
        assert_eq!(config.period_of(1_000), 1);
        assert_eq!(config.period_of(2_500), 2);
        assert_eq!(config.period_of(-1), -1);
        assert_eq!(config.period_of(-1_000), -1);
        assert_eq!(config.period_of(-1_001), -2);
    }
}
