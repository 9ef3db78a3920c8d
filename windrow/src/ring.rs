//! Circular rolling buffer: the primary aggregation engine.
//!
//! A fixed array of bucket cells is pre-allocated once and mutated in place
//! forever; a write cursor advances one slot whenever a new period begins,
//! overwriting the oldest bucket when the ring is full. Readers see the
//! `exposed_buckets` most recent slots and locate their starting point with a
//! binary search over the logically ordered (but physically wrapped) window.
//!
//! # Design
//!
//! - Slot addressing: the cursor advances `(cursor + 1) % max_buckets` on
//!   each period boundary; eviction is the overwrite itself.
//! - The cursor is an atomically published integer, not a mutex: writers
//!   store it with `Release` after initializing the new bucket, readers load
//!   it once with `Acquire` at iterator construction and keep that snapshot
//!   for the whole iteration.
//! - The binary search maps logical offsets to physical slots with
//!   `(oldest + logical) % max_buckets`. Sentinel (never written) slots are
//!   treated as less than any real timestamp so they sort to the old end.
//!
//! # Thread safety
//!
//! Built for a single-writer, multi-reader workload per buffer. Bucket cells
//! are reached through `&self`; the buffer is `Sync` exactly when the bucket
//! type is (see [`crate::bucket`]). A reader may observe a bucket that a
//! concurrent writer is still aggregating into — there is no per-bucket
//! locking or versioning on the hot path.

use std::iter::FusedIterator;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::bucket::{Bucket, TimeStamped};
use crate::config::WindowConfig;
use crate::error::{ConfigError, UpdateError};

/// A fixed-capacity circular buffer of aggregation buckets.
///
/// Created once per key with a fixed [`WindowConfig`] and a factory that
/// produces the initial bucket cells. Cells are never reallocated afterwards:
/// `reset`/`aggregate` mutate them in place.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use windrow::{Bucket, RingBuffer, TimeStamped, WindowConfig};
///
/// struct Sample(i64, i64);
/// impl TimeStamped for Sample {
///     fn timestamp(&self) -> i64 {
///         self.0
///     }
/// }
///
/// #[derive(Default)]
/// struct Sum {
///     ts: Cell<i64>,
///     total: Cell<i64>,
/// }
/// impl Bucket for Sum {
///     type Value = Sample;
///     fn timestamp(&self) -> i64 {
///         self.ts.get()
///     }
///     fn reset(&self, v: &Sample) {
///         self.ts.set(v.0);
///         self.total.set(v.1);
///     }
///     fn aggregate(&self, v: &Sample) {
///         self.total.set(self.total.get() + v.1);
///     }
/// }
///
/// let config = WindowConfig::new(5, 3, 1_000)?;
/// let ring = RingBuffer::new(config, Sum::default)?;
/// ring.update(&Sample(1_000, 2))?;
/// ring.update(&Sample(1_500, 3))?;
/// let totals: Vec<i64> = ring.iter(0).map(|b| b.total.get()).collect();
/// assert_eq!(totals, vec![5]);
/// # Ok::<(), windrow::WindrowError>(())
/// ```
#[derive(Debug)]
pub struct RingBuffer<B> {
    /// Fixed buffer configuration.
    config: WindowConfig,
    /// Pre-allocated bucket cells, addressed modulo `max_buckets`.
    buckets: Box<[B]>,
    /// Index of the most recently touched slot.
    ///
    /// A publish point for readers, not a source of mutual exclusion.
    cursor: AtomicUsize,
}

impl<B: Bucket> RingBuffer<B> {
    /// Creates a buffer, calling `factory` once per slot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: WindowConfig, mut factory: impl FnMut() -> B) -> Result<Self, ConfigError> {
        config.validate()?;

        let buckets: Box<[B]> = (0..config.max_buckets).map(|_| factory()).collect();

        Ok(Self {
            config,
            buckets,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Applies a value to the buffer.
    ///
    /// Same period as the bucket at the cursor: `aggregate` in place. New
    /// period: advance the cursor one slot and `reset` the bucket there,
    /// silently discarding whatever that slot held — that overwrite is the
    /// eviction mechanism.
    ///
    /// The new cursor is published only after the bucket is reset, so a
    /// reader that observes the advanced cursor also observes an initialized
    /// period (subject to the bucket's own field synchronization).
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::OutOfOrder`] if the value's timestamp is not
    /// strictly greater than the last accepted timestamp; no state is
    /// mutated in that case.
    pub fn update(&self, value: &B::Value) -> Result<(), UpdateError> {
        let cursor = self.cursor.load(Ordering::Acquire);
        let value_ts = value.timestamp();
        let last_ts = self.buckets[cursor].timestamp();

        if value_ts <= last_ts {
            return Err(UpdateError::OutOfOrder {
                timestamp: value_ts,
                last: last_ts,
            });
        }

        let current_period = self.config.period_of(value_ts);
        let last_period = self.config.period_of(last_ts);

        if current_period == last_period {
            self.buckets[cursor].aggregate(value);
        } else {
            let next = (cursor + 1) % self.config.max_buckets;
            self.buckets[next].reset(value);
            self.cursor.store(next, Ordering::Release);
        }

        Ok(())
    }

    /// Returns a lazy iterator over visible buckets with
    /// `timestamp() >= start_timestamp`, oldest first.
    ///
    /// The cursor is snapshotted once here; the iteration sees a consistent
    /// window boundary even if writers keep advancing past it. The sequence
    /// is finite, single-pass, and fused; it is empty when the start lies
    /// beyond all data or the buffer has never been written.
    pub fn iter(&self, start_timestamp: i64) -> RingIterator<'_, B> {
        let (start, remaining) = self.visible_window(start_timestamp);

        RingIterator {
            buckets: &self.buckets,
            next: start,
            remaining,
        }
    }

    /// Locates the visible window: returns the physical index of the first
    /// qualifying slot and the number of slots to yield.
    ///
    /// Binary search over logical offsets `[0, visible)` for the first slot
    /// with a non-sentinel timestamp `>= start_timestamp`. Correct because
    /// timestamps are non-decreasing along the logical order: buckets are
    /// only ever written with strictly increasing periods.
    pub(crate) fn visible_window(&self, start_timestamp: i64) -> (usize, usize) {
        let newest = self.cursor.load(Ordering::Acquire);
        let max = self.config.max_buckets;
        let visible = self.config.visible_buckets();
        let oldest = (newest + max - (visible - 1)) % max;

        let mut low = 0;
        let mut high = visible;

        while low < high {
            let mid = (low + high) / 2;
            let ts = self.buckets[(oldest + mid) % max].timestamp();

            if ts == 0 || ts < start_timestamp {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        ((oldest + low) % max, visible - low)
    }

    /// Direct slot access for iterator guards.
    pub(crate) fn bucket(&self, index: usize) -> &B {
        &self.buckets[index]
    }

    /// Returns the buffer configuration.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Returns the physical capacity in bucket cells.
    pub fn capacity(&self) -> usize {
        self.config.max_buckets
    }

    /// Returns the timestamp of the newest accepted value's bucket, or
    /// `None` if the buffer has never been written.
    pub fn newest_timestamp(&self) -> Option<i64> {
        let cursor = self.cursor.load(Ordering::Acquire);
        let ts = self.buckets[cursor].timestamp();
        (ts != 0).then_some(ts)
    }

    /// Returns whether no value has ever been accepted.
    pub fn is_empty(&self) -> bool {
        self.newest_timestamp().is_none()
    }
}

/// Lazy forward iterator over the visible window of a [`RingBuffer`].
///
/// Yields bucket references oldest-first, stepping circularly from the start
/// slot through the write-cursor snapshot taken at construction.
#[derive(Debug)]
pub struct RingIterator<'a, B> {
    buckets: &'a [B],
    next: usize,
    remaining: usize,
}

impl<'a, B> Iterator for RingIterator<'a, B> {
    type Item = &'a B;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let bucket = &self.buckets[self.next];
        self.next = (self.next + 1) % self.buckets.len();
        self.remaining -= 1;
        Some(bucket)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<B> ExactSizeIterator for RingIterator<'_, B> {}

impl<B> FusedIterator for RingIterator<'_, B> {}
