use crate::builder::Config;
use crate::error::BuildError;
use crate::item::{Intent, Item};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policy::EvictionPolicy;
use crate::store::{self, ShardedMap};
use crate::task::worker::{Worker, WorkerContext};

use crossbeam_channel::{bounded, tick, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Expiry to fall back on when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// A concurrent, cost-bounded key→value cache with TTL expiry.
///
/// Reads go straight to a sharded map and contend only on a single shard's
/// read lock. Writes are funneled through a bounded admission buffer that a
/// dedicated background worker drains; the worker owns the eviction policy
/// and mirrors its decisions into the shard map. See the crate docs for the
/// consistency model.
///
/// Any number of threads may call any method concurrently between
/// construction and [`Cache::close`].
pub struct Cache<V: Send + Sync + 'static> {
  store: Arc<ShardedMap<V>>,
  policy: Arc<Mutex<EvictionPolicy<V>>>,
  metrics: Arc<Metrics>,
  intent_tx: Sender<Intent<V>>,
  /// The cache's own end of the admission buffer, used to flush it on
  /// `clear`/`close` and to seed restarted workers. Dropped on `close` so
  /// the channel disconnects: queued barriers collapse and blocked senders
  /// get an error instead of waiting on a worker that will never return.
  intent_rx: Mutex<Option<Receiver<Intent<V>>>>,
  ticker: Receiver<Instant>,
  worker: Mutex<Option<Worker>>,
  closed: AtomicBool,
}

impl<V: Send + Sync + 'static> Cache<V> {
  /// Builds a cache from `config` and starts its background worker.
  pub fn new(config: Config) -> Result<Self, BuildError> {
    config.validate()?;

    let (intent_tx, intent_rx) = bounded(config.set_buffer_size);
    let cache = Self {
      store: Arc::new(ShardedMap::new(config.num_shards)),
      policy: Arc::new(Mutex::new(EvictionPolicy::new(config.max_cost))),
      metrics: Arc::new(Metrics::new()),
      intent_tx,
      intent_rx: Mutex::new(Some(intent_rx.clone())),
      ticker: tick(config.cleanup_interval),
      worker: Mutex::new(None),
      closed: AtomicBool::new(false),
    };
    *cache.worker.lock() = Some(cache.spawn_worker(intent_rx));
    Ok(cache)
  }

  /// Queues `value` for admission under `key` and reports whether it was
  /// queued.
  ///
  /// `true` means *queued*, not *resident*: the policy may still evict the
  /// item, including immediately when its cost is too low to displace
  /// anything. `false` means the cache is closed, `cost` or `ttl` is
  /// non-positive, or the admission buffer is full. Never blocks.
  pub fn put(&self, key: &str, value: V, cost: i64, ttl: Duration) -> bool {
    if self.closed.load(Ordering::Acquire) {
      return false;
    }
    if cost <= 0 || ttl.is_zero() {
      self.metrics.puts_dropped.fetch_add(1, Ordering::Relaxed);
      return false;
    }

    let now = Instant::now();
    let expire_at = match now.checked_add(ttl) {
      Some(at) => at,
      None => now + FAR_FUTURE,
    };
    let item = Item {
      key: store::hash_key(key),
      value: Arc::new(value),
      cost,
      expire_at,
    };
    match self.intent_tx.try_send(Intent::Put(item)) {
      Ok(()) => true,
      Err(_) => {
        self.metrics.puts_dropped.fetch_add(1, Ordering::Relaxed);
        false
      }
    }
  }

  /// Looks `key` up in the shard map without touching the write path.
  ///
  /// A value past its expiry is still returned until the sweeper collects
  /// it; the consumer decides what an expired value means. Always a miss on
  /// a closed cache.
  pub fn get(&self, key: &str) -> Option<Arc<V>> {
    if self.closed.load(Ordering::Acquire) {
      return None;
    }
    match self.store.get(store::hash_key(key)) {
      Some(value) => {
        self.metrics.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
      }
      None => {
        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        None
      }
    }
  }

  /// Queues `key` for removal.
  ///
  /// Blocks while the admission buffer is full — deletion is the one write
  /// that applies back-pressure instead of failing fast, so a delete is
  /// never silently lost.
  pub fn delete(&self, key: &str) {
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    let _ = self.intent_tx.send(Intent::Remove(store::hash_key(key)));
  }

  /// Blocks until every intent this thread queued before the call has been
  /// applied.
  ///
  /// Afterwards, a `get` from this thread observes the outcome of its own
  /// earlier `put`s and `delete`s. Ordering across threads is whatever the
  /// buffer arrival order happened to be.
  pub fn wait(&self) {
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    let (done_tx, done_rx) = bounded(1);
    if self.intent_tx.send(Intent::Barrier(done_tx)).is_ok() {
      // Signalled by the worker, by a lifecycle flush, or by the barrier
      // being dropped with the channel on close. All of them release us.
      let _ = done_rx.recv();
    }
  }

  /// Empties the cache and restarts its worker.
  ///
  /// Pending intents are discarded; barriers among them are signalled so no
  /// caller stays blocked in [`Cache::wait`]. Callers are expected to
  /// quiesce their own traffic for the duration.
  pub fn clear(&self) {
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    let mut worker = self.worker.lock();
    // Losing the race against close means there is nothing left to restart.
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    if let Some(active) = worker.take() {
      active.stop();
    }
    self.reset_state();
    let intents = self.intent_rx.lock().clone();
    if let Some(intents) = intents {
      *worker = Some(self.spawn_worker(intents));
    }
    debug!("cache cleared");
  }

  /// Shuts the cache down.
  ///
  /// Idempotent. The worker is stopped for good, pending intents are
  /// discarded (barriers signalled), the admission buffer is disconnected,
  /// and every subsequent operation is a no-op: `put` returns `false`,
  /// `get` misses, the rest return immediately.
  pub fn close(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let mut worker = self.worker.lock();
    if let Some(active) = worker.take() {
      active.stop();
    }
    self.reset_state();
    *self.intent_rx.lock() = None;
    debug!("cache closed");
  }

  /// Number of admitted entries. Lags puts still sitting in the buffer.
  pub fn len(&self) -> usize {
    self.metrics.entry_count.load(Ordering::Relaxed) as usize
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Summed cost of admitted entries. Lags puts still sitting in the buffer.
  pub fn cost(&self) -> i64 {
    self.metrics.current_cost.load(Ordering::Relaxed)
  }

  /// A point-in-time snapshot of the cache's counters.
  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }

  /// Flushes everything still queued and resets the policy, the shard map
  /// and the usage gauges. Only called with the worker stopped and the
  /// lifecycle lock held.
  fn reset_state(&self) {
    if let Some(intents) = self.intent_rx.lock().as_ref() {
      while let Ok(intent) = intents.try_recv() {
        if let Intent::Barrier(done) = intent {
          let _ = done.send(());
        }
      }
    }
    self.policy.lock().clear();
    self.store.clear();
    self.metrics.publish_usage(0, 0);
  }

  fn spawn_worker(&self, intents: Receiver<Intent<V>>) -> Worker {
    Worker::spawn(WorkerContext {
      store: Arc::clone(&self.store),
      policy: Arc::clone(&self.policy),
      metrics: Arc::clone(&self.metrics),
      intents,
      ticker: self.ticker.clone(),
    })
  }
}

impl<V: Send + Sync + 'static> Drop for Cache<V> {
  fn drop(&mut self) {
    self.close();
  }
}

impl<V: Send + Sync + 'static> fmt::Debug for Cache<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("len", &self.len())
      .field("cost", &self.cost())
      .field("closed", &self.closed.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}
