use crate::item::Item;
use crate::queue::CostQueue;

use std::time::Instant;

/// The single-writer authority over admission, replacement, removal and
/// expiry.
///
/// The policy has no locking of its own: exactly one background worker
/// mutates it, and the lifecycle path only touches it after that worker has
/// been joined. `cur_cost` always equals the summed cost of queued items,
/// and never exceeds `max_cost` after a completed operation.
pub(crate) struct EvictionPolicy<V> {
  max_cost: i64,
  cur_cost: i64,
  queue: CostQueue<V>,
}

impl<V> EvictionPolicy<V> {
  pub(crate) fn new(max_cost: i64) -> Self {
    Self {
      max_cost,
      cur_cost: 0,
      queue: CostQueue::new(),
    }
  }

  /// Admits `item`, evicting cheapest-first while the budget is exceeded.
  ///
  /// Returns the evicted items and whether `item` survived admission. The
  /// freshly inserted item competes in the eviction round it triggers, so it
  /// may be in the evicted set itself; in that case the flag is `false`.
  /// Items costlier than the whole budget are rejected outright, replacement
  /// included, leaving any previous entry for the key untouched.
  pub(crate) fn insert(&mut self, item: Item<V>) -> (Vec<Item<V>>, bool) {
    if item.cost > self.max_cost {
      return (Vec::new(), false);
    }

    if self.queue.contains(item.key) {
      return self.replace(item);
    }

    let key = item.key;
    self.cur_cost += item.cost;
    self.queue.push(item);

    let mut evicted = Vec::new();
    if self.cur_cost > self.max_cost {
      evicted = self.evict_until_within_budget();
    }
    let admitted = self.queue.contains(key);
    (evicted, admitted)
  }

  /// In-place replacement: the queued slot keeps its identity, only value,
  /// cost and expiry change, and heap order is restored at that slot. A cost
  /// increase may force evictions, and the replaced item itself is fair game
  /// for them.
  fn replace(&mut self, item: Item<V>) -> (Vec<Item<V>>, bool) {
    let Item {
      key,
      value,
      cost,
      expire_at,
    } = item;
    let prev_cost = match self.queue.update(key, value, cost, expire_at) {
      Some(prev) => prev,
      None => return (Vec::new(), false),
    };

    self.cur_cost += cost - prev_cost;
    // Sitting exactly at the budget is feasible; eviction fires only when
    // strictly over.
    if self.cur_cost <= self.max_cost {
      return (Vec::new(), true);
    }

    let evicted = self.evict_until_within_budget();
    let admitted = self.queue.contains(key);
    (evicted, admitted)
  }

  fn evict_until_within_budget(&mut self) -> Vec<Item<V>> {
    let mut evicted = Vec::new();
    while self.cur_cost > self.max_cost {
      let Some(victim) = self.queue.pop() else {
        break;
      };
      self.cur_cost -= victim.cost;
      evicted.push(victim);
    }
    evicted
  }

  /// Removes the tracked item for `key`, if any.
  pub(crate) fn remove(&mut self, key: u64) -> Option<Item<V>> {
    let item = self.queue.remove(key)?;
    self.cur_cost -= item.cost;
    Some(item)
  }

  /// Removes every item whose expiry is at or before `now`.
  ///
  /// A full scan, which is fine at sweeper cadence; it never runs on the
  /// request path.
  pub(crate) fn evict_expired(&mut self, now: Instant) -> Vec<Item<V>> {
    let keys = self.queue.expired_keys(now);
    let mut evicted = Vec::with_capacity(keys.len());
    for key in keys {
      if let Some(item) = self.queue.remove(key) {
        self.cur_cost -= item.cost;
        evicted.push(item);
      }
    }
    evicted
  }

  pub(crate) fn clear(&mut self) {
    self.queue.clear();
    self.cur_cost = 0;
  }

  pub(crate) fn len(&self) -> usize {
    self.queue.len()
  }

  pub(crate) fn cost(&self) -> i64 {
    self.cur_cost
  }
}
