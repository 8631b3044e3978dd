//! A concurrent, cost-bounded, TTL-expiring key→value cache.
//!
//! Every stored value carries a caller-assigned cost; the cache keeps the
//! summed cost of admitted items under a configured budget by evicting the
//! cheapest items first (ties broken by earliest expiry). Writes are
//! asynchronous: [`Cache::put`] and [`Cache::delete`] enqueue intents on a
//! bounded buffer that a single background worker drains, while
//! [`Cache::get`] reads a sharded map directly. A periodic sweep removes
//! expired entries.
//!
//! ```
//! use costbound::{Cache, Config};
//! use std::time::Duration;
//!
//! let config = Config { max_cost: 100, ..Config::default() };
//! let cache: Cache<String> = Cache::new(config).unwrap();
//!
//! assert!(cache.put("a", "alpha".to_string(), 10, Duration::from_secs(60)));
//! cache.wait();
//! assert_eq!(cache.get("a").as_deref(), Some(&"alpha".to_string()));
//! cache.close();
//! ```
//!
//! `put` returning `true` means *queued for admission*, not *resident*: the
//! eviction policy may still drop the item, immediately or later. Callers
//! that need read-your-writes call [`Cache::wait`] first.

mod builder;
mod cache;
mod error;
mod item;
mod metrics;
mod policy;
mod queue;
mod store;
mod task;

pub use builder::{CacheBuilder, Config};
pub use cache::Cache;
pub use error::BuildError;
pub use metrics::MetricsSnapshot;
