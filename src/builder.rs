use crate::cache::Cache;
use crate::error::BuildError;

use std::time::Duration;

/// Construction parameters for a [`Cache`].
///
/// The record can be built directly or through [`CacheBuilder`]. Every field
/// is validated at construction time; an invalid value fails the build with
/// a [`BuildError`] naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Upper bound on the summed cost of admitted items. Cost is an arbitrary
  /// caller-defined weight: bytes, an estimate of memory usage, or any other
  /// measure of how much an item is worth holding.
  pub max_cost: i64,

  /// Number of independently locked map shards. More shards mean less
  /// contention between operations on different keys; a power of two is
  /// recommended.
  pub num_shards: usize,

  /// Capacity of the admission buffer. While it is full, `put` fails fast
  /// and `delete` blocks. A larger buffer absorbs write bursts at the price
  /// of memory and staleness of `len`/`cost`.
  pub set_buffer_size: usize,

  /// Period of the background expiry sweep. Expired entries are observed at
  /// this granularity, not at their exact deadline.
  pub cleanup_interval: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      max_cost: 1 << 30,
      num_shards: 256,
      set_buffer_size: 32 * 1024,
      cleanup_interval: Duration::from_secs(10),
    }
  }
}

impl Config {
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.max_cost <= 0 {
      return Err(BuildError::NonPositiveMaxCost);
    }
    if self.num_shards == 0 {
      return Err(BuildError::ZeroShards);
    }
    if self.set_buffer_size == 0 {
      return Err(BuildError::ZeroBufferSize);
    }
    if self.cleanup_interval.is_zero() {
      return Err(BuildError::ZeroCleanupInterval);
    }
    Ok(())
  }
}

/// A fluent builder over [`Config`].
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
  conf: Config,
}

impl CacheBuilder {
  /// Creates a builder seeded with the default configuration.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the maximum total cost of admitted items.
  pub fn max_cost(mut self, max_cost: i64) -> Self {
    self.conf.max_cost = max_cost;
    self
  }

  /// Sets the number of concurrent map shards.
  pub fn num_shards(mut self, num_shards: usize) -> Self {
    self.conf.num_shards = num_shards;
    self
  }

  /// Sets the capacity of the admission buffer.
  pub fn set_buffer_size(mut self, capacity: usize) -> Self {
    self.conf.set_buffer_size = capacity;
    self
  }

  /// Sets the period of the expiry sweeper.
  pub fn cleanup_interval(mut self, interval: Duration) -> Self {
    self.conf.cleanup_interval = interval;
    self
  }

  /// Validates the configuration and builds a [`Cache`].
  pub fn build<V: Send + Sync + 'static>(self) -> Result<Cache<V>, BuildError> {
    Cache::new(self.conf)
  }
}
