//! Per-client rolling request counters over a keyed store.
//!
//! Feeds a short synthetic request stream for two clients into per-second
//! buckets and prints the visible window of each client afterwards.
//!
//! Run with: `cargo run -p windrow --example rolling_counters`

use std::cell::Cell;

use windrow::{Bucket, Store, TimeStamped, WindowConfig};

/// One request: arrival time plus payload size.
struct Request {
    at: i64,
    bytes: i64,
}

impl TimeStamped for Request {
    fn timestamp(&self) -> i64 {
        self.at
    }
}

/// Per-second request count and byte total.
#[derive(Default)]
struct TrafficBucket {
    ts: Cell<i64>,
    requests: Cell<u64>,
    bytes: Cell<i64>,
}

impl Bucket for TrafficBucket {
    type Value = Request;

    fn timestamp(&self) -> i64 {
        self.ts.get()
    }

    fn reset(&self, value: &Request) {
        self.ts.set(value.at);
        self.requests.set(1);
        self.bytes.set(value.bytes);
    }

    fn aggregate(&self, value: &Request) {
        self.requests.set(self.requests.get() + 1);
        self.bytes.set(self.bytes.get() + value.bytes);
    }
}

fn main() -> Result<(), windrow::WindrowError> {
    // Per-second buckets, last 10 visible, 2 slots of writer slack.
    let config = WindowConfig::new(12, 10, 1_000)?;
    let store = Store::new(config, TrafficBucket::default)?;

    let stream = [
        ("alice", 1_000, 512),
        ("alice", 1_250, 128),
        ("bob", 1_400, 2_048),
        ("alice", 2_100, 64),
        ("bob", 2_600, 512),
        ("bob", 2_800, 256),
        ("alice", 4_000, 1_024),
    ];

    for (client, at, bytes) in stream {
        store.put(client, &Request { at, bytes })?;
    }

    for client in ["alice", "bob", "carol"] {
        println!("{client}:");
        let mut seen = false;
        for bucket in store.iter(&client, 0) {
            seen = true;
            println!(
                "  t={:>5}ms  {} requests, {} bytes",
                bucket.timestamp(),
                bucket.requests.get(),
                bucket.bytes.get()
            );
        }
        if !seen {
            println!("  (no traffic)");
        }
    }

    Ok(())
}
