use std::fmt;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  /// `max_cost` must be greater than zero; the budget is meaningless
  /// otherwise.
  NonPositiveMaxCost,
  /// `num_shards` must be greater than zero.
  ZeroShards,
  /// `set_buffer_size` must be greater than zero.
  ZeroBufferSize,
  /// `cleanup_interval` must be a non-zero duration.
  ZeroCleanupInterval,
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::NonPositiveMaxCost => write!(f, "max_cost must be greater than 0"),
      BuildError::ZeroShards => write!(f, "num_shards must be greater than 0"),
      BuildError::ZeroBufferSize => write!(f, "set_buffer_size must be greater than 0"),
      BuildError::ZeroCleanupInterval => {
        write!(f, "cleanup_interval must be greater than 0")
      }
    }
  }
}

impl std::error::Error for BuildError {}
