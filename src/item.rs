use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Instant;

/// A single cached entry as the eviction policy tracks it.
///
/// `key` is the 64-bit hash of the caller's string key; two caller keys that
/// hash to the same value are indistinguishable to the cache.
#[derive(Debug, Clone)]
pub(crate) struct Item<V> {
  pub(crate) key: u64,
  pub(crate) value: Arc<V>,
  pub(crate) cost: i64,
  pub(crate) expire_at: Instant,
}

/// One unit of work on the admission buffer.
pub(crate) enum Intent<V> {
  /// Admit a new item, or replace the one already tracked under its key.
  Put(Item<V>),
  /// Drop the key from the policy and the shard map.
  Remove(u64),
  /// Signal the paired receiver once everything queued ahead of this intent
  /// has been applied.
  Barrier(Sender<()>),
}
