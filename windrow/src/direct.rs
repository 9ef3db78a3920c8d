//! Direct-indexed rolling buffer: the alternative engine.
//!
//! Instead of an advancing cursor, each period owns a fixed slot computed as
//! `period mod max_buckets`. Updates are O(1) with no cursor state; the cost
//! is that two far-apart periods can collide on the same slot, in which case
//! the later period steals it. That is an explicit capacity/accuracy
//! trade-off, not a bug — size `max_buckets` for the expected burstiness.
//!
//! Unlike the circular variant, out-of-order values are tolerated as long as
//! they are not older than the staleness cutoff
//! (`last_timestamp - exposed_buckets * period_millis`); values beyond it are
//! silently dropped.
//!
//! The iterator walks periods sequentially from the requested start up to the
//! latest seen period, yielding a slot only when its stored period still
//! matches the position — periods whose slot was stolen by a colliding later
//! period are skipped without any gap signal.

use std::iter::FusedIterator;
use std::sync::atomic::{AtomicI64, Ordering};

use tracing::trace;

use crate::bucket::{Bucket, TimeStamped};
use crate::config::WindowConfig;
use crate::error::ConfigError;

/// A fixed-capacity rolling buffer addressed directly by period index.
///
/// Shares the bucket capability and in-place mutation model of
/// [`crate::ring::RingBuffer`], but tracks only the single latest timestamp
/// seen instead of a write cursor. A slot's occupant is valid at read time
/// iff its stored period matches the period implied by its array position.
#[derive(Debug)]
pub struct DirectBuffer<B> {
    /// Fixed buffer configuration.
    config: WindowConfig,
    /// Pre-allocated bucket cells, slot = `period mod max_buckets`.
    buckets: Box<[B]>,
    /// Latest timestamp ever applied, `0` before the first update.
    last_timestamp: AtomicI64,
}

impl<B: Bucket> DirectBuffer<B> {
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
            last_timestamp: AtomicI64::new(0),
        })
    }

    /// Applies a value to the buffer.
    ///
    /// Values older than the staleness cutoff are dropped without error;
    /// out-of-order values within the cutoff are applied normally. The target
    /// slot is `reset` when it is a sentinel or holds a different period,
    /// otherwise the value is aggregated in place.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // rem_euclid result is in 0..max_buckets
    pub fn update(&self, value: &B::Value) {
        let last = self.last_timestamp.load(Ordering::Acquire);
        let value_ts = value.timestamp();

        let cutoff = last - self.config.exposed_buckets as i64 * self.config.period_millis;
        if value_ts < cutoff {
            trace!(timestamp = value_ts, cutoff, "dropping stale value");
            return;
        }

        let period = self.config.period_of(value_ts);
        let index = period.rem_euclid(self.config.max_buckets as i64) as usize;
        let bucket = &self.buckets[index];

        let bucket_ts = bucket.timestamp();
        if bucket_ts == 0 || self.config.period_of(bucket_ts) != period {
            bucket.reset(value);
        } else {
            bucket.aggregate(value);
        }

        self.last_timestamp
            .store(last.max(value_ts), Ordering::Release);
    }

    /// Returns a lazy iterator over periods from `start_timestamp` up to the
    /// latest period seen, oldest first.
    ///
    /// At most `exposed_buckets` elements are yielded. Periods whose slot was
    /// overwritten by a colliding later period are silently skipped, exactly
    /// like periods that never received a value.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // rem_euclid result is in 0..max_buckets
    pub fn iter(&self, start_timestamp: i64) -> DirectIterator<'_, B> {
        let last_period = self
            .config
            .period_of(self.last_timestamp.load(Ordering::Acquire));

        let earliest_period = last_period - (self.config.exposed_buckets as i64 - 1);
        let start_period = earliest_period.max(self.config.period_of(start_timestamp));

        DirectIterator {
            buffer: self,
            index: start_period.rem_euclid(self.config.max_buckets as i64) as usize,
            next_period: start_period,
            last_period,
        }
    }

    /// Returns the buffer configuration.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Returns the latest timestamp ever applied, or `None` before the first
    /// update.
    pub fn last_timestamp(&self) -> Option<i64> {
        let ts = self.last_timestamp.load(Ordering::Acquire);
        (ts != 0).then_some(ts)
    }
}

/// Lazily advancing sequential iterator over a [`DirectBuffer`].
///
/// Walks candidate periods in order, validating each slot against the period
/// its position implies before yielding it.
#[derive(Debug)]
pub struct DirectIterator<'a, B> {
    buffer: &'a DirectBuffer<B>,
    index: usize,
    next_period: i64,
    last_period: i64,
}

impl<'a, B: Bucket> Iterator for DirectIterator<'a, B> {
    type Item = &'a B;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_period <= self.last_period {
            let candidate = &self.buffer.buckets[self.index];
            let period = self.next_period;

            self.index = (self.index + 1) % self.buffer.config.max_buckets;
            self.next_period += 1;

            let ts = candidate.timestamp();
            if ts != 0 && self.buffer.config.period_of(ts) == period {
                return Some(candidate);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let bound = usize::try_from(self.last_period - self.next_period + 1).unwrap_or(0);
        (0, Some(bound))
    }
}

impl<B: Bucket> FusedIterator for DirectIterator<'_, B> {}
