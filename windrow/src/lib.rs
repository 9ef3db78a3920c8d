//! # windrow
//!
//! Fixed-memory rolling time-window aggregation buffers.
//!
//! windrow ingests a time-ordered stream of values per key, groups them into
//! fixed-duration periods ("buckets"), aggregates same-period values in
//! place, and exposes a bounded window of the most recent buckets to readers.
//! It is the structure behind rolling metrics — per-second or per-minute
//! counters for many independent keys — without unbounded memory growth.
//!
//! ## Key Properties
//!
//! - Zero-allocation write path: bucket cells are pre-allocated once and
//!   mutated in place, never reallocated
//! - Bounded, predictable memory — size is determined by configuration, not
//!   data volume
//! - Lock-free steady state: a published atomic cursor coordinates a single
//!   writer with concurrent readers per key; only per-key buffer creation
//!   takes a lock
//! - Caller-supplied aggregation: sum, count, histogram — any [`Bucket`]
//!   implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::Cell;
//! use windrow::{Bucket, Store, TimeStamped, WindowConfig};
//!
//! struct Request {
//!     at: i64,
//!     bytes: i64,
//! }
//!
//! impl TimeStamped for Request {
//!     fn timestamp(&self) -> i64 {
//!         self.at
//!     }
//! }
//!
//! #[derive(Default)]
//! struct ByteTotal {
//!     ts: Cell<i64>,
//!     total: Cell<i64>,
//! }
//!
//! impl Bucket for ByteTotal {
//!     type Value = Request;
//!     fn timestamp(&self) -> i64 {
//!         self.ts.get()
//!     }
//!     fn reset(&self, v: &Request) {
//!         self.ts.set(v.at);
//!         self.total.set(v.bytes);
//!     }
//!     fn aggregate(&self, v: &Request) {
//!         self.total.set(self.total.get() + v.bytes);
//!     }
//! }
//!
//! # fn main() -> Result<(), windrow::WindrowError> {
//! // per-second buckets, last 30 visible, 64 slots allocated
//! let config = WindowConfig::new(64, 30, 1_000)?;
//! let store = Store::new(config, ByteTotal::default)?;
//!
//! store.put("client-a", &Request { at: 1_000, bytes: 512 })?;
//! store.put("client-a", &Request { at: 1_250, bytes: 256 })?;
//!
//! for bucket in store.iter(&"client-a", 0) {
//!     println!("{}: {} bytes", bucket.timestamp(), bucket.total.get());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Store`] — keyed entry point; lazily creates one buffer per key
//! - [`RingBuffer`] — circular engine: advancing write cursor, binary-search
//!   windowed iteration (the primary variant)
//! - [`DirectBuffer`] — period-indexed engine: O(1) slot addressing, tolerant
//!   of bounded out-of-order input (the alternative variant)
//! - [`WindowConfig`] — validated, shared buffer configuration
//! - [`Bucket`] / [`TimeStamped`] — the capability seam for caller data
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`store`] — keyed sharding layer
//! - [`ring`] — circular rolling buffer
//! - [`direct`] — direct-indexed rolling buffer
//! - [`config`] — window configuration
//! - [`bucket`] — capability traits
//! - [`error`] — error types

pub mod bucket;
pub mod config;
pub mod direct;
pub mod error;
pub mod ring;
pub mod store;

// Re-export primary API types at crate root for convenience.
pub use bucket::{Bucket, TimeStamped};
pub use config::WindowConfig;
pub use direct::{DirectBuffer, DirectIterator};
pub use error::{ConfigError, Result, UpdateError, WindrowError};
pub use ring::{RingBuffer, RingIterator};
pub use store::{BucketRef, Store, StoreIterator};
