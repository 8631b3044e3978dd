use crate::item::{Intent, Item};
use crate::metrics::Metrics;
use crate::policy::EvictionPolicy;
use crate::store::ShardedMap;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace};

/// Everything the background worker needs to apply intents.
pub(crate) struct WorkerContext<V> {
  pub(crate) store: Arc<ShardedMap<V>>,
  pub(crate) policy: Arc<Mutex<EvictionPolicy<V>>>,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) intents: Receiver<Intent<V>>,
  pub(crate) ticker: Receiver<Instant>,
}

/// The background task that serializes every mutation.
///
/// Admission, replacement, removal, expiry sweeps and barrier signalling all
/// flow through its loop, one intent per iteration, so the policy never sees
/// concurrent writers and the shard map only ever diverges from it by the
/// single step currently in flight.
pub(crate) struct Worker {
  handle: JoinHandle<()>,
  stop_tx: Sender<()>,
}

impl Worker {
  pub(crate) fn spawn<V>(ctx: WorkerContext<V>) -> Self
  where
    V: Send + Sync + 'static,
  {
    let (stop_tx, stop_rx) = bounded(0);
    let handle = thread::spawn(move || Self::run(ctx, stop_rx));
    debug!("cache worker started");
    Self { handle, stop_tx }
  }

  /// Hands the worker the stop signal and waits for it to exit. The
  /// rendezvous send guarantees any in-flight intent has been fully applied
  /// before this returns.
  pub(crate) fn stop(self) {
    let _ = self.stop_tx.send(());
    let _ = self.handle.join();
    debug!("cache worker stopped");
  }

  fn run<V: Send + Sync>(ctx: WorkerContext<V>, stop: Receiver<()>) {
    loop {
      select! {
        recv(ctx.intents) -> intent => match intent {
          Ok(Intent::Put(item)) => Self::apply_put(&ctx, item),
          Ok(Intent::Remove(key)) => Self::apply_remove(&ctx, key),
          Ok(Intent::Barrier(done)) => {
            let _ = done.send(());
          }
          Err(_) => return,
        },
        recv(ctx.ticker) -> tick => {
          if tick.is_ok() {
            Self::sweep_expired(&ctx);
          }
        }
        recv(stop) -> _ => return,
      }
    }
  }

  fn apply_put<V>(ctx: &WorkerContext<V>, item: Item<V>) {
    let key = item.key;
    let value = Arc::clone(&item.value);

    let (evicted, admitted) = {
      let mut policy = ctx.policy.lock();
      let outcome = policy.insert(item);
      ctx.metrics.publish_usage(policy.cost(), policy.len());
      outcome
    };

    if admitted {
      ctx.store.insert(key, value);
      ctx.metrics.keys_admitted.fetch_add(1, Ordering::Relaxed);
    } else {
      ctx.metrics.keys_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // A put that was admitted and immediately evicted must not tear down a
    // prior mapping under the same hash, so its own key is never
    // mirror-deleted here.
    for victim in &evicted {
      if victim.key != key {
        ctx.store.remove(victim.key);
      }
    }
    if !evicted.is_empty() {
      ctx
        .metrics
        .evicted_by_capacity
        .fetch_add(evicted.len() as u64, Ordering::Relaxed);
    }
  }

  fn apply_remove<V>(ctx: &WorkerContext<V>, key: u64) {
    let removed = {
      let mut policy = ctx.policy.lock();
      let removed = policy.remove(key);
      ctx.metrics.publish_usage(policy.cost(), policy.len());
      removed
    };
    if removed.is_some() {
      ctx.store.remove(key);
      ctx.metrics.invalidations.fetch_add(1, Ordering::Relaxed);
    }
  }

  fn sweep_expired<V>(ctx: &WorkerContext<V>) {
    let expired = {
      let mut policy = ctx.policy.lock();
      let expired = policy.evict_expired(Instant::now());
      ctx.metrics.publish_usage(policy.cost(), policy.len());
      expired
    };
    if expired.is_empty() {
      return;
    }
    for item in &expired {
      ctx.store.remove(item.key);
    }
    ctx
      .metrics
      .evicted_by_ttl
      .fetch_add(expired.len() as u64, Ordering::Relaxed);
    trace!(count = expired.len(), "expiry sweep removed entries");
  }
}
