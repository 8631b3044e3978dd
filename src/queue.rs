use crate::item::Item;
use crate::store::PassthroughState;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// An indexed binary min-heap over cached items.
///
/// Ordering is `(cost, expire_at, key)` ascending: the cheapest item sits at
/// the root, ties go to the item expiring sooner, and the key makes the
/// order total so eviction is deterministic.
///
/// Items live in a contiguous vector; a side index maps each key to its
/// current slot so that removal and re-ordering at an arbitrary position
/// stay O(log n). Every swap keeps the index in lockstep, so the heap and
/// the index always describe the same set of keys.
pub(crate) struct CostQueue<V> {
  heap: Vec<Item<V>>,
  slots: HashMap<u64, usize, PassthroughState>,
}

impl<V> CostQueue<V> {
  pub(crate) fn new() -> Self {
    Self {
      heap: Vec::new(),
      slots: HashMap::default(),
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.heap.len()
  }

  pub(crate) fn contains(&self, key: u64) -> bool {
    self.slots.contains_key(&key)
  }

  /// Pushes an item whose key is not currently queued.
  pub(crate) fn push(&mut self, item: Item<V>) {
    let slot = self.heap.len();
    self.slots.insert(item.key, slot);
    self.heap.push(item);
    self.sift_up(slot);
  }

  /// Pops the cheapest item.
  pub(crate) fn pop(&mut self) -> Option<Item<V>> {
    if self.heap.is_empty() {
      return None;
    }
    Some(self.remove_at(0))
  }

  /// Removes the item for `key`, wherever it sits in the heap.
  pub(crate) fn remove(&mut self, key: u64) -> Option<Item<V>> {
    let slot = *self.slots.get(&key)?;
    Some(self.remove_at(slot))
  }

  /// Replaces the value, cost and expiry of the queued item for `key` in
  /// place, then restores heap order at its slot. Returns the previous cost.
  pub(crate) fn update(
    &mut self,
    key: u64,
    value: Arc<V>,
    cost: i64,
    expire_at: Instant,
  ) -> Option<i64> {
    let slot = *self.slots.get(&key)?;
    let item = &mut self.heap[slot];
    let prev_cost = item.cost;
    item.value = value;
    item.cost = cost;
    item.expire_at = expire_at;
    self.fix(slot);
    Some(prev_cost)
  }

  /// Keys of every queued item with `expire_at <= now`.
  pub(crate) fn expired_keys(&self, now: Instant) -> Vec<u64> {
    self
      .heap
      .iter()
      .filter(|item| item.expire_at <= now)
      .map(|item| item.key)
      .collect()
  }

  pub(crate) fn clear(&mut self) {
    self.heap.clear();
    self.slots.clear();
  }

  fn remove_at(&mut self, slot: usize) -> Item<V> {
    let item = self.heap.swap_remove(slot);
    self.slots.remove(&item.key);
    if slot < self.heap.len() {
      self.slots.insert(self.heap[slot].key, slot);
      self.fix(slot);
    }
    item
  }

  /// Re-establishes heap order for the item at `slot` after its rank
  /// changed. Sifts down first; only an item that did not move down can
  /// possibly need to move up.
  fn fix(&mut self, slot: usize) {
    if !self.sift_down(slot) {
      self.sift_up(slot);
    }
  }

  fn sift_up(&mut self, mut slot: usize) {
    while slot > 0 {
      let parent = (slot - 1) / 2;
      if !Self::ranks_before(&self.heap[slot], &self.heap[parent]) {
        break;
      }
      self.swap(slot, parent);
      slot = parent;
    }
  }

  fn sift_down(&mut self, mut slot: usize) -> bool {
    let start = slot;
    loop {
      let left = 2 * slot + 1;
      if left >= self.heap.len() {
        break;
      }
      let mut child = left;
      let right = left + 1;
      if right < self.heap.len() && Self::ranks_before(&self.heap[right], &self.heap[left]) {
        child = right;
      }
      if !Self::ranks_before(&self.heap[child], &self.heap[slot]) {
        break;
      }
      self.swap(slot, child);
      slot = child;
    }
    slot != start
  }

  fn swap(&mut self, a: usize, b: usize) {
    self.heap.swap(a, b);
    self.slots.insert(self.heap[a].key, a);
    self.slots.insert(self.heap[b].key, b);
  }

  fn ranks_before(a: &Item<V>, b: &Item<V>) -> bool {
    (a.cost, a.expire_at, a.key) < (b.cost, b.expire_at, b.key)
  }

  /// Checks the heap property and the heap↔index bijection.
  #[cfg(test)]
  pub(crate) fn assert_consistent(&self) {
    assert_eq!(self.heap.len(), self.slots.len(), "index size mismatch");
    for (slot, item) in self.heap.iter().enumerate() {
      assert_eq!(self.slots.get(&item.key), Some(&slot), "stale slot index");
      if slot > 0 {
        let parent = (slot - 1) / 2;
        assert!(
          !Self::ranks_before(&self.heap[slot], &self.heap[parent]),
          "heap property violated between slots {parent} and {slot}"
        );
      }
    }
  }
}
