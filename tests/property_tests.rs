use costbound::{Cache, CacheBuilder};
use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

const LONG_TTL: Duration = Duration::from_secs(3600);

fn new_cache(max_cost: i64) -> Cache<String> {
  CacheBuilder::new()
    .max_cost(max_cost)
    .num_shards(8)
    .set_buffer_size(4096)
    .cleanup_interval(Duration::from_secs(10))
    .build()
    .unwrap()
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  /// With distinct costs the eviction order is unambiguous, so the admitted
  /// set after a sequence of puts must be exactly what greedy cheapest-first
  /// eviction of the submitted multiset leaves behind.
  #[test]
  fn admission_matches_greedy_cheapest_first(
    costs in prop::sample::subsequence((1i64..=100).collect::<Vec<_>>(), 1..40).prop_shuffle()
  ) {
    let max_cost = 100;
    let cache = new_cache(max_cost);

    // Replay the same sequence against the cache and against a model that
    // evicts the cheapest entry while over budget.
    let mut model: HashMap<usize, i64> = HashMap::new();
    let mut model_cost = 0i64;
    for (idx, &cost) in costs.iter().enumerate() {
      let key = format!("key-{}", idx);
      let value = format!("value-{}", idx);
      prop_assert!(cache.put(&key, value, cost, LONG_TTL));
      model.insert(idx, cost);
      model_cost += cost;
      while model_cost > max_cost {
        let (&victim, &victim_cost) = model
          .iter()
          .min_by_key(|entry| *entry.1)
          .expect("over budget implies a non-empty model");
        model.remove(&victim);
        model_cost -= victim_cost;
      }
    }
    cache.wait();

    prop_assert_eq!(cache.cost(), model_cost);
    prop_assert_eq!(cache.len(), model.len());
    for (idx, _) in costs.iter().enumerate() {
      let got = cache.get(&format!("key-{idx}"));
      if model.contains_key(&idx) {
        prop_assert_eq!(got.as_deref(), Some(&format!("value-{idx}")));
      } else {
        prop_assert!(got.is_none(), "evicted key key-{} is still visible", idx);
      }
    }
    cache.close();
  }

  /// Without cost pressure or expiry, the cache is just a map: after `wait`,
  /// every key reads as its last surviving write.
  #[test]
  fn last_write_wins_without_pressure(
    ops in prop::collection::vec((0u8..16, 0u32..1000, any::<bool>()), 1..100)
  ) {
    let cache = new_cache(1 << 30);
    let mut model: HashMap<u8, String> = HashMap::new();

    for (key, stamp, is_put) in ops {
      let name = format!("key-{key}");
      if is_put {
        let value = format!("value-{key}-{stamp}");
        prop_assert!(cache.put(&name, value.clone(), 1, LONG_TTL));
        model.insert(key, value);
      } else {
        cache.delete(&name);
        model.remove(&key);
      }
    }
    cache.wait();

    for key in 0u8..16 {
      let got = cache.get(&format!("key-{key}"));
      prop_assert_eq!(got.as_deref(), model.get(&key));
    }
    prop_assert_eq!(cache.len(), model.len());
    cache.close();
  }

  /// Whatever the traffic, the published cost stays within [0, max_cost]
  /// once the buffer has drained.
  #[test]
  fn budget_holds_under_arbitrary_costs(
    ops in prop::collection::vec((0u8..24, 1i64..200, any::<bool>()), 1..120)
  ) {
    let max_cost = 100;
    let cache = new_cache(max_cost);

    for (key, cost, is_put) in ops {
      let name = format!("key-{key}");
      if is_put {
        cache.put(&name, format!("v{key}"), cost, LONG_TTL);
      } else {
        cache.delete(&name);
      }
    }
    cache.wait();

    prop_assert!(cache.cost() <= max_cost);
    prop_assert!(cache.cost() >= 0);
    cache.close();
  }

  /// A hit never fabricates data: any value read under a key was at some
  /// point put under that key.
  #[test]
  fn get_only_returns_written_values(
    ops in prop::collection::vec((0u8..16, 1i64..60, any::<bool>()), 1..100)
  ) {
    let max_cost = 100;
    let cache = new_cache(max_cost);

    for (key, cost, is_put) in ops {
      let name = format!("key-{key}");
      if is_put {
        cache.put(&name, format!("owned-by-{key}"), cost, LONG_TTL);
      } else {
        cache.delete(&name);
      }
      if let Some(value) = cache.get(&name) {
        prop_assert_eq!(value.as_str(), format!("owned-by-{key}"));
      }
    }
    cache.close();
  }
}
