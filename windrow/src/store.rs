//! Keyed sharding layer multiplexing many independent rolling buffers.
//!
//! A [`Store`] maps an arbitrary key to a lazily created
//! [`RingBuffer`], constructed at most once per key even under concurrent
//! first writers. Buffers are never removed: a key's buffer lives as long as
//! the store.
//!
//! # Locking
//!
//! Only buffer *creation* takes the write lock. Steady-state updates go
//! through a shared read lock to resolve the buffer (cheap, never contended
//! by other readers) and then run lock-free against the buffer itself;
//! iteration snapshots the buffer's window the same way. Losers of a
//! create race observe the winner's instance through the map's entry check
//! under the write lock.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use windrow::{Bucket, Store, TimeStamped, WindowConfig};
//!
//! struct Hit(i64);
//! impl TimeStamped for Hit {
//!     fn timestamp(&self) -> i64 {
//!         self.0
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Count {
//!     ts: Cell<i64>,
//!     n: Cell<u64>,
//! }
//! impl Bucket for Count {
//!     type Value = Hit;
//!     fn timestamp(&self) -> i64 {
//!         self.ts.get()
//!     }
//!     fn reset(&self, v: &Hit) {
//!         self.ts.set(v.0);
//!         self.n.set(1);
//!     }
//!     fn aggregate(&self, _: &Hit) {
//!         self.n.set(self.n.get() + 1);
//!     }
//! }
//!
//! let store = Store::new(WindowConfig::new(64, 60, 1_000)?, Count::default)?;
//! store.put("client-a", &Hit(1_000))?;
//! store.put("client-a", &Hit(1_400))?;
//!
//! let counts: Vec<u64> = store.iter(&"client-a", 0).map(|b| b.n.get()).collect();
//! assert_eq!(counts, vec![2]);
//! assert!(store.iter(&"client-b", 0).next().is_none());
//! # Ok::<(), windrow::WindrowError>(())
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::bucket::Bucket;
use crate::config::WindowConfig;
use crate::error::Result;
use crate::ring::RingBuffer;

/// Keyed entry point over per-key circular rolling buffers.
///
/// Generic over the key type, the bucket type, and the bucket factory used to
/// populate each newly created buffer. All operations take `&self`; the store
/// is `Send + Sync` whenever the bucket type and factory are.
#[derive(Debug)]
pub struct Store<K, B, F> {
    /// Per-key buffers; created exactly once per key, never removed.
    buffers: RwLock<HashMap<K, Arc<RingBuffer<B>>>>,
    /// Produces fresh bucket cells for newly created buffers.
    factory: F,
    /// Configuration applied to every per-key buffer.
    config: WindowConfig,
}

impl<K, B, F> Store<K, B, F>
where
    K: Eq + Hash,
    B: Bucket,
    F: Fn() -> B,
{
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError`] if the configuration is invalid, so a
    /// bad parameter set fails here rather than on the first write.
    pub fn new(config: WindowConfig, factory: F) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            buffers: RwLock::new(HashMap::new()),
            factory,
            config,
        })
    }

    /// Applies a value to the buffer for `key`, creating the buffer on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns [`crate::UpdateError::OutOfOrder`] if the value's timestamp is
    /// not strictly greater than the key's last accepted timestamp.
    pub fn put(&self, key: K, value: &B::Value) -> Result<()> {
        let buffer = {
            let buffers = self.buffers.read();
            buffers.get(&key).cloned()
        };

        let buffer = match buffer {
            Some(buffer) => buffer,
            None => self.create_buffer(key)?,
        };

        buffer.update(value)?;
        Ok(())
    }

    /// Create-if-absent under the write lock; at most one buffer is
    /// constructed per key even when first writers race.
    fn create_buffer(&self, key: K) -> Result<Arc<RingBuffer<B>>> {
        let mut buffers = self.buffers.write();
        match buffers.entry(key) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let buffer = Arc::new(RingBuffer::new(self.config, &self.factory)?);
                debug!(
                    max_buckets = self.config.max_buckets,
                    period_millis = self.config.period_millis,
                    "created rolling buffer for new key"
                );
                Ok(entry.insert(buffer).clone())
            }
        }
    }

    /// Returns an iterator over the visible buckets for `key` with
    /// `timestamp() >= start_timestamp`, oldest first.
    ///
    /// Unknown keys produce an immediately exhausted iterator: no error, and
    /// no buffer is created. The window boundary is snapshotted here, so one
    /// iteration sees a consistent window even while writers advance.
    pub fn iter(&self, key: &K, start_timestamp: i64) -> StoreIterator<B> {
        match self.get(key) {
            Some(buffer) => {
                let (next, remaining) = buffer.visible_window(start_timestamp);
                StoreIterator {
                    buffer: Some(buffer),
                    next,
                    remaining,
                }
            }
            None => StoreIterator {
                buffer: None,
                next: 0,
                remaining: 0,
            },
        }
    }

    /// Returns the buffer for `key`, if one has been created.
    ///
    /// Useful for borrowed, allocation-free iteration via
    /// [`RingBuffer::iter`] when the caller can hold the `Arc` across the
    /// read.
    pub fn get(&self, key: &K) -> Option<Arc<RingBuffer<B>>> {
        self.buffers.read().get(key).cloned()
    }

    /// Returns the number of keys with a buffer.
    pub fn len(&self) -> usize {
        self.buffers.read().len()
    }

    /// Returns whether no key has written yet.
    pub fn is_empty(&self) -> bool {
        self.buffers.read().is_empty()
    }

    /// Returns the configuration applied to every per-key buffer.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }
}

/// Owned iterator over one key's visible window.
///
/// Holds the buffer's `Arc` so iteration is decoupled from the store's map
/// lock; items are [`BucketRef`] guards that deref to the bucket.
#[derive(Debug)]
pub struct StoreIterator<B> {
    buffer: Option<Arc<RingBuffer<B>>>,
    next: usize,
    remaining: usize,
}

impl<B: Bucket> Iterator for StoreIterator<B> {
    type Item = BucketRef<B>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let buffer = self.buffer.as_ref()?.clone();
        let index = self.next;
        self.next = (self.next + 1) % buffer.capacity();
        self.remaining -= 1;

        Some(BucketRef { buffer, index })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<B: Bucket> ExactSizeIterator for StoreIterator<B> {}

impl<B: Bucket> std::iter::FusedIterator for StoreIterator<B> {}

/// Shared handle to one bucket slot, keeping its buffer alive.
///
/// Dereferences to the bucket itself.
#[derive(Debug)]
pub struct BucketRef<B> {
    buffer: Arc<RingBuffer<B>>,
    index: usize,
}

impl<B: Bucket> Deref for BucketRef<B> {
    type Target = B;

    fn deref(&self) -> &Self::Target {
        self.buffer.bucket(self.index)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::bucket::TimeStamped;
    use crate::error::{UpdateError, WindrowError};

    struct TestValue {
        ts: i64,
        amount: i64,
    }

    impl TestValue {
        fn new(ts: i64, amount: i64) -> Self {
            Self { ts, amount }
        }
    }

    impl TimeStamped for TestValue {
        fn timestamp(&self) -> i64 {
            self.ts
        }
    }

    #[derive(Default)]
    struct SummingBucket {
        ts: Cell<i64>,
        sum: Cell<i64>,
    }

    impl Bucket for SummingBucket {
        type Value = TestValue;

        fn timestamp(&self) -> i64 {
            self.ts.get()
        }

        fn reset(&self, value: &TestValue) {
            self.ts.set(value.ts);
            self.sum.set(value.amount);
        }

        fn aggregate(&self, value: &TestValue) {
            self.sum.set(self.sum.get() + value.amount);
        }
    }

    fn test_store() -> Store<&'static str, SummingBucket, fn() -> SummingBucket> {
        let config = WindowConfig::new(5, 3, 1_000).unwrap();
        Store::new(config, SummingBucket::default as fn() -> SummingBucket).unwrap()
    }

    fn sums(
        store: &Store<&'static str, SummingBucket, fn() -> SummingBucket>,
        key: &'static str,
        start: i64,
    ) -> Vec<i64> {
        store.iter(&key, start).map(|b| b.sum.get()).collect()
    }

    #[test]
    fn creates_one_buffer_per_key() {
        let store = test_store();
        store.put("a", &TestValue::new(1_000, 5)).unwrap();
        store.put("b", &TestValue::new(2_000, 2)).unwrap();
        store.put("a", &TestValue::new(1_500, 1)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(sums(&store, "a", 0), vec![6]);
        assert_eq!(sums(&store, "b", 0), vec![2]);
    }

    #[test]
    fn unknown_key_yields_exhausted_iterator_without_creating() {
        let store = test_store();

        let mut iter = store.iter(&"missing", 0);
        assert_eq!(iter.len(), 0);
        assert!(iter.next().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn keys_are_independent_for_ordering() {
        let store = test_store();
        store.put("a", &TestValue::new(5_000, 1)).unwrap();
        // A lower timestamp on another key is fine.
        store.put("b", &TestValue::new(1_000, 1)).unwrap();

        let err = store.put("a", &TestValue::new(1_000, 1)).unwrap_err();
        assert!(matches!(
            err,
            WindrowError::Update(UpdateError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn iterator_filters_by_start_timestamp() {
        let store = test_store();
        for i in 0..5 {
            store.put("a", &TestValue::new((i + 1) * 1_000, i + 1)).unwrap();
        }

        assert_eq!(sums(&store, "a", 0), vec![3, 4, 5]);
        assert_eq!(sums(&store, "a", 4_000), vec![4, 5]);
        assert!(sums(&store, "a", 6_000).is_empty());
    }

    #[test]
    fn get_exposes_underlying_buffer() {
        let store = test_store();
        store.put("a", &TestValue::new(1_000, 5)).unwrap();

        let buffer = store.get(&"a").unwrap();
        let totals: Vec<i64> = buffer.iter(0).map(|b| b.sum.get()).collect();
        assert_eq!(totals, vec![5]);
        assert!(store.get(&"missing").is_none());
    }

    #[test]
    fn bucket_ref_outlives_map_access() {
        let store = test_store();
        store.put("a", &TestValue::new(1_000, 5)).unwrap();

        let held: Vec<_> = store.iter(&"a", 0).collect();
        // Later writes do not invalidate already collected refs.
        store.put("a", &TestValue::new(2_000, 7)).unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].timestamp(), 1_000);
    }

    #[test]
    fn invalid_config_fails_at_store_construction() {
        let config = WindowConfig {
            max_buckets: 2,
            exposed_buckets: 3,
            period_millis: 1_000,
        };
        let result: Result<Store<&str, SummingBucket, _>> =
            Store::new(config, SummingBucket::default);
        assert!(result.is_err());
    }
}
