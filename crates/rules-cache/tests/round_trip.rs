use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rules_cache::{CacheService, CacheServiceFactory, InMemoryCacheService};
use rules_common::CacheType;
use serde_json::{Value, json};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[A-Z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn get_after_set_returns_stored_value(key in "[a-z_:0-9-]{1,24}", value in json_value()) {
        let cache = InMemoryCacheService::new();
        cache.set(&key, value.clone()).unwrap();
        prop_assert_eq!(cache.get(&key).unwrap(), Some(value));
        prop_assert!(cache.has(&key).unwrap());
    }

    #[test]
    fn prefix_lookup_matches_starts_with(
        keys in prop::collection::btree_set("[a-c]{1,4}", 0..12),
        prefix in "[a-c]{0,2}",
    ) {
        let cache = InMemoryCacheService::new();
        for key in &keys {
            cache.set(key, json!(key)).unwrap();
        }
        let found = cache.get_by_prefix(&prefix).unwrap();
        let expected: Vec<&String> = keys.iter().filter(|k| k.starts_with(&prefix)).collect();
        prop_assert_eq!(found.keys().collect::<Vec<_>>(), expected);
    }
}

#[test]
fn writes_are_visible_through_every_factory_handle() {
    let factory = CacheServiceFactory::default();
    let writer = factory.get_service(CacheType::InMemory).unwrap();
    let reader = factory.get_cache_service().unwrap();

    writer
        .add_all(BTreeMap::from([
            ("model_details:sdtm1-5".to_string(), json!({"datasets": []})),
            ("standard_details:sdtmig3-4".to_string(), json!({"domains": ["AE"]})),
        ]))
        .unwrap();

    assert!(reader.has("model_details:sdtm1-5").unwrap());
    assert_eq!(reader.get_by_prefix("standard_details:").unwrap().len(), 1);
}

#[test]
fn concurrent_writers_do_not_lose_distinct_keys() {
    let cache: Arc<dyn CacheService> = Arc::new(InMemoryCacheService::new());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..50 {
                    cache.set(&format!("w{worker}:{i}"), json!(i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for worker in 0..8 {
        assert_eq!(cache.get_by_prefix(&format!("w{worker}:")).unwrap().len(), 50);
    }
}
