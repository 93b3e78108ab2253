use super::test_utils::*;
use test_case::test_case;

fn budget_server(elements: u64, policy: EvictionPolicy, segments: usize) -> MockServer {
    create_server(elements * element_size("key00", "value"), policy, segments)
}

#[test_case(1 ; "single_segment")]
#[test_case(16 ; "segmented")]
fn memory_use_should_stay_within_budget(segments: usize) {
    let server = budget_server(10, EvictionPolicy::LeastRecentlyUsed, segments);
    for idx in 0..50 {
        server
            .storage
            .set(record(&format!("key{:02}", idx), "value"))
            .unwrap();
        assert!(server.storage.current_bytes() <= server.storage.max_bytes());
    }
    assert_eq!(server.storage.current_items(), 10);
    let stats = server.storage.stats();
    assert_eq!(stats.evictions, 40);
    assert_eq!(stats.limit_maxbytes, server.storage.max_bytes());
}

#[test_case(1 ; "single_segment")]
#[test_case(16 ; "segmented")]
fn least_recently_used_item_should_be_evicted_first(segments: usize) {
    let server = budget_server(3, EvictionPolicy::LeastRecentlyUsed, segments);
    server.storage.set(record("key00", "value")).unwrap();
    server.storage.set(record("key01", "value")).unwrap();
    server.storage.set(record("key02", "value")).unwrap();
    server.storage.get(&Bytes::from("key00")).unwrap();

    server.storage.set(record("key03", "value")).unwrap();
    assert!(server.storage.get(&Bytes::from("key01")).is_err());
    assert!(server.storage.get(&Bytes::from("key00")).is_ok());
    assert!(server.storage.get(&Bytes::from("key02")).is_ok());
    assert!(server.storage.get(&Bytes::from("key03")).is_ok());
}

#[test_case(1 ; "single_segment")]
#[test_case(16 ; "segmented")]
fn no_eviction_policy_should_refuse_new_items(segments: usize) {
    let server = budget_server(2, EvictionPolicy::None, segments);
    server.storage.set(record("key00", "value")).unwrap();
    server.storage.set(record("key01", "value")).unwrap();
    let result = server.storage.add(record("key02", "value"));
    assert_eq!(result.unwrap_err(), CacheError::OutOfMemory);
    assert!(server.storage.get(&Bytes::from("key00")).is_ok());
    assert!(server.storage.get(&Bytes::from("key01")).is_ok());
    assert_eq!(server.storage.stats().evictions, 0);
    assert_eq!(server.storage.stats().set_not_stored, 1);

    server
        .storage
        .delete(Bytes::from("key00"), Meta::new(0, 0, 0))
        .unwrap();
    assert!(server.storage.add(record("key02", "value")).is_ok());
}

#[test_case(1 ; "single_segment")]
#[test_case(16 ; "segmented")]
fn set_should_fail_when_only_blocked_items_fill_budget(segments: usize) {
    let server = budget_server(2, EvictionPolicy::LeastRecentlyUsed, segments);
    server.storage.set(record("key00", "value")).unwrap();
    server.storage.set(record("key01", "value")).unwrap();
    for key in ["key00", "key01"] {
        server
            .storage
            .delete(Bytes::from(key), Meta::new(0, 0, 100))
            .unwrap();
    }

    let result = server.storage.set(record("key02", "value"));
    assert_eq!(result.unwrap_err(), CacheError::OutOfMemory);
    assert!(server.storage.get(&Bytes::from("key02")).is_err());
    assert!(server.storage.current_bytes() <= server.storage.max_bytes());
    assert_eq!(server.storage.current_items(), 2);
    let stats = server.storage.stats();
    assert_eq!(stats.evictions, 0);
    assert_eq!(stats.set_not_stored, 1);

    server.timer.add_seconds(100);
    assert!(server.storage.set(record("key02", "value")).is_ok());
    assert!(server.storage.get(&Bytes::from("key02")).is_ok());
}

#[test]
fn max_items_should_limit_item_count() {
    let server = MockServer::new(crate::memcache::builder::MemcacheStoreConfig::new(
        1024 * 1024,
        Some(5),
        EvictionPolicy::LeastRecentlyUsed,
        Some(4),
    ));
    for idx in 0..20 {
        server
            .storage
            .set(record(&format!("key{:02}", idx), "value"))
            .unwrap();
    }
    assert_eq!(server.storage.current_items(), 5);
    for idx in 15..20 {
        assert!(server
            .storage
            .get(&Bytes::from(format!("key{:02}", idx)))
            .is_ok());
    }
}

#[test_case(1 ; "single_segment")]
#[test_case(16 ; "segmented")]
fn random_workload_should_keep_counters_consistent(segments: usize) {
    use crate::mock::key_value::generate_random;

    let server = create_server(64 * 1024, EvictionPolicy::LeastRecentlyUsed, segments);
    let values = generate_random(2000, 5, 200);
    for key_value in values.iter() {
        let record = Record::new(key_value.key.clone(), key_value.value.clone(), 0, 0, 0);
        server.storage.set(record).unwrap();
        assert!(server.storage.current_bytes() <= server.storage.max_bytes());
    }
    let stored_bytes: u64 = values
        .iter()
        .filter_map(|key_value| server.storage.get(&key_value.key).ok())
        .map(|record| record.len() as u64)
        .sum::<u64>();
    assert!(stored_bytes <= server.storage.current_bytes());
    assert!(server.storage.current_items() > 0);
}
