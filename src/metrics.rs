use crossbeam_utils::CachePadded;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Lock-free internal counters.
///
/// The worker publishes the cost and entry-count gauges after every step it
/// applies; everything else is bumped at the call site that observed the
/// event. Each field sits on its own cache line so hot counters do not
/// false-share.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  /// Puts that never reached the policy: bad arguments or a full buffer.
  pub(crate) puts_dropped: CachePadded<AtomicU64>,
  /// Puts the policy accepted (fresh admissions and replacements alike).
  pub(crate) keys_admitted: CachePadded<AtomicU64>,
  /// Puts the policy turned down: oversize, or too cheap to keep.
  pub(crate) keys_rejected: CachePadded<AtomicU64>,

  pub(crate) invalidations: CachePadded<AtomicU64>,
  pub(crate) evicted_by_capacity: CachePadded<AtomicU64>,
  pub(crate) evicted_by_ttl: CachePadded<AtomicU64>,

  pub(crate) current_cost: CachePadded<AtomicI64>,
  pub(crate) entry_count: CachePadded<AtomicU64>,
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Publishes the authoritative usage gauges taken from the policy.
  pub(crate) fn publish_usage(&self, cost: i64, entries: usize) {
    self.current_cost.store(cost, Ordering::Relaxed);
    self.entry_count.store(entries as u64, Ordering::Relaxed);
  }

  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if lookups == 0 {
        0.0
      } else {
        hits as f64 / lookups as f64
      },
      puts_dropped: self.puts_dropped.load(Ordering::Relaxed),
      keys_admitted: self.keys_admitted.load(Ordering::Relaxed),
      keys_rejected: self.keys_rejected.load(Ordering::Relaxed),
      invalidations: self.invalidations.load(Ordering::Relaxed),
      evicted_by_capacity: self.evicted_by_capacity.load(Ordering::Relaxed),
      evicted_by_ttl: self.evicted_by_ttl.load(Ordering::Relaxed),
      current_cost: self.current_cost.load(Ordering::Relaxed),
      entry_count: self.entry_count.load(Ordering::Relaxed),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's counters.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// Lookups that found a value.
  pub hits: u64,
  /// Lookups that found nothing.
  pub misses: u64,
  /// hits / (hits + misses), or 0 when there were no lookups.
  pub hit_ratio: f64,
  /// Puts dropped before reaching the policy (bad arguments, full buffer).
  pub puts_dropped: u64,
  /// Puts the admission policy accepted.
  pub keys_admitted: u64,
  /// Puts the admission policy turned down.
  pub keys_rejected: u64,
  /// Entries removed by an explicit delete.
  pub invalidations: u64,
  /// Entries evicted to stay under the cost budget.
  pub evicted_by_capacity: u64,
  /// Entries removed by the expiry sweeper.
  pub evicted_by_ttl: u64,
  /// Summed cost of admitted entries, as of the worker's last step.
  pub current_cost: i64,
  /// Number of admitted entries, as of the worker's last step.
  pub entry_count: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("puts_dropped", &self.puts_dropped)
      .field("keys_admitted", &self.keys_admitted)
      .field("keys_rejected", &self.keys_rejected)
      .field("invalidations", &self.invalidations)
      .field("evicted_by_capacity", &self.evicted_by_capacity)
      .field("evicted_by_ttl", &self.evicted_by_ttl)
      .field("current_cost", &self.current_cost)
      .field("entry_count", &self.entry_count)
      .finish()
  }
}
