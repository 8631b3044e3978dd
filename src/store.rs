use crossbeam_utils::CachePadded;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};
use std::sync::Arc;
use xxhash_rust::xxh64::xxh64;

/// Hashes a caller key into the cache's 64-bit key space.
///
/// XXH64 with a fixed seed: deterministic for the lifetime of the process
/// and uniform enough to spread keys evenly across shards.
#[inline]
pub(crate) fn hash_key(key: &str) -> u64 {
  xxh64(key.as_bytes(), 0)
}

/// Keys arriving at the shard maps are already 64-bit hashes, so hashing
/// them a second time buys nothing. This hasher hands the value through.
#[derive(Debug, Default)]
pub(crate) struct PassthroughHasher(u64);

impl Hasher for PassthroughHasher {
  fn finish(&self) -> u64 {
    self.0
  }

  fn write(&mut self, _bytes: &[u8]) {
    panic!("passthrough hashing only works with u64 keys");
  }

  fn write_u64(&mut self, n: u64) {
    self.0 = n;
  }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PassthroughState;

impl BuildHasher for PassthroughState {
  type Hasher = PassthroughHasher;

  fn build_hasher(&self) -> PassthroughHasher {
    PassthroughHasher::default()
  }
}

type Shard<V> = RwLock<HashMap<u64, Arc<V>, PassthroughState>>;

/// A map from key hash to value, partitioned into independently locked
/// shards so that operations on different keys rarely contend.
///
/// The shard map is not authoritative for membership — the eviction policy
/// is — but it is the sole surface `get` reads, and it tolerates the
/// transient desynchrony between a policy decision and its mirror write.
pub(crate) struct ShardedMap<V> {
  shards: Box<[CachePadded<Shard<V>>]>,
}

impl<V> ShardedMap<V> {
  pub(crate) fn new(num_shards: usize) -> Self {
    let shards = (0..num_shards)
      .map(|_| CachePadded::new(RwLock::new(HashMap::default())))
      .collect::<Vec<_>>()
      .into_boxed_slice();
    Self { shards }
  }

  #[inline]
  fn shard(&self, key: u64) -> &Shard<V> {
    &self.shards[(key % self.shards.len() as u64) as usize]
  }

  /// Returns the stored value, expired or not. Consumers decide what an
  /// expired value means to them.
  pub(crate) fn get(&self, key: u64) -> Option<Arc<V>> {
    self.shard(key).read().get(&key).cloned()
  }

  pub(crate) fn insert(&self, key: u64, value: Arc<V>) {
    self.shard(key).write().insert(key, value);
  }

  pub(crate) fn remove(&self, key: u64) -> Option<Arc<V>> {
    self.shard(key).write().remove(&key)
  }

  pub(crate) fn clear(&self) {
    for shard in self.shards.iter() {
      shard.write().clear();
    }
  }
}
