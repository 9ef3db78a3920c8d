//! Capability traits connecting caller-supplied data to the buffer engines.
//!
//! The engine never interprets values or aggregation state itself. Callers
//! provide two things: a value type that exposes a millisecond timestamp
//! ([`TimeStamped`]) and a bucket type that knows how to fold same-period
//! values together ([`Bucket`]). Sum, count, histogram — the aggregation
//! semantics live entirely on the caller's side.
//!
//! # Interior mutability
//!
//! Bucket cells are pre-allocated once and then mutated in place for the
//! lifetime of the buffer; they are reached through `&self` so that writers
//! and readers can touch the same buffer concurrently without per-bucket
//! locking. A bucket implementation therefore carries its own interior
//! mutability:
//!
//! - `Cell`/`RefCell` fields give a single-threaded bucket; the owning buffer
//!   is then `!Sync` and the compiler keeps it on one thread.
//! - Atomic fields give a `Sync` bucket usable from the lock-free
//!   single-writer/multi-reader setup described in [`crate::ring`]. A reader
//!   may observe a bucket mid-aggregation; if per-bucket consistency matters,
//!   the bucket implementation must synchronize its own fields.

/// A value carrying a millisecond timestamp.
///
/// Timestamps must be `>= 1`: the engine reserves `0` as the "never written"
/// sentinel on bucket cells.
pub trait TimeStamped {
    /// The value's timestamp in milliseconds.
    fn timestamp(&self) -> i64;
}

/// A mutable per-period aggregation cell.
///
/// A bucket represents exactly one time period at a time. [`reset`] starts a
/// new period from its first value; [`aggregate`] folds further same-period
/// values into the existing state and must not change which period the bucket
/// represents.
///
/// # Contract
///
/// - `timestamp()` returns the timestamp of the value passed to the most
///   recent `reset`, or `0` if the bucket has never been written.
/// - `aggregate` leaves `timestamp()` unchanged.
///
/// The engines rely on these two properties for sentinel detection and for
/// the ordering guarantees behind windowed iteration.
///
/// [`reset`]: Bucket::reset
/// [`aggregate`]: Bucket::aggregate
pub trait Bucket {
    /// The value type this bucket aggregates.
    type Value: TimeStamped;

    /// The timestamp establishing the bucket's current period, `0` if never
    /// written.
    fn timestamp(&self) -> i64;

    /// Discards prior state and re-initializes from the first value of a new
    /// period.
    fn reset(&self, value: &Self::Value);

    /// Folds a same-period value into the existing state.
    fn aggregate(&self, value: &Self::Value);
}
