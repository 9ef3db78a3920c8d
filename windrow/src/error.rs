//! Error types for the windrow rolling buffer engines.
//!
//! All errors are synchronous and surfaced directly to the caller of the
//! failing operation; nothing is retried internally. The direct-indexed
//! variant's staleness drop and slot-collision skip are documented normal
//! behaviors, not errors, and never appear here. Exhausting an iterator is
//! likewise not an error: iterators are fused and simply return `None`.

use thiserror::Error;

/// The main error type for all windrow operations.
#[derive(Error, Debug)]
pub enum WindrowError {
    /// Error validating buffer configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error during an update operation (write path).
    #[error("update error: {0}")]
    Update(#[from] UpdateError),
}

/// Errors raised when a buffer configuration violates its constraints.
///
/// Configuration is validated at construction; a buffer is never created
/// from an invalid parameter set.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_buckets` must be greater than zero.
    #[error("max_buckets must be > 0")]
    ZeroMaxBuckets,

    /// `exposed_buckets` must lie in `1..=max_buckets`.
    #[error("exposed_buckets must be in 1..=max_buckets: got {exposed} with max {max}")]
    ExposedBucketsOutOfRange {
        /// The rejected `exposed_buckets` value.
        exposed: usize,
        /// The configured `max_buckets`.
        max: usize,
    },

    /// `period_millis` must be greater than zero.
    #[error("period_millis must be > 0: got {period}")]
    NonPositivePeriod {
        /// The rejected period.
        period: i64,
    },
}

/// Errors raised on the write path of the circular buffer variant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    /// The value's timestamp is not strictly greater than the last accepted
    /// timestamp. The update is rejected and buffer state is untouched;
    /// whether to retry, drop, or log is the caller's decision.
    #[error("timestamp {timestamp} is not after last accepted timestamp {last}")]
    OutOfOrder {
        /// The rejected timestamp.
        timestamp: i64,
        /// The most recently accepted timestamp.
        last: i64,
    },
}

/// Type alias for `Result<T, WindrowError>`.
pub type Result<T> = std::result::Result<T, WindrowError>;
