use super::test_utils::*;
use test_case::test_case;

#[test_case(create_single_segment_server() ; "single_segment")]
#[test_case(create_segmented_server() ; "segmented")]
fn if_not_defined_cas_should_be_1(server: MockServer) {
    let result = server.storage.set(record("key", "test data"));
    match result {
        Ok(status) => assert_eq!(status.cas, 1),
        Err(_) => unreachable!(),
    }
    let found = server.storage.get(&Bytes::from("key"));
    match found {
        Ok(record) => {
            assert_eq!(record.header().get_cas(), 1);
            assert_eq!(record.value(), &from_string("test data"));
        }
        Err(_) => unreachable!(),
    }
}

#[test_case(create_single_segment_server() ; "single_segment")]
#[test_case(create_segmented_server() ; "segmented")]
fn set_should_overwrite_existing_value(server: MockServer) {
    let first = server.storage.set(record("key", "first")).unwrap();
    let second = server.storage.set(record("key", "second value")).unwrap();
    assert!(second.cas > first.cas);

    let found = server.storage.get(&Bytes::from("key")).unwrap();
    assert_eq!(found.value(), &from_string("second value"));
    assert_eq!(server.storage.current_items(), 1);
    assert_eq!(
        server.storage.current_bytes(),
        element_size("key", "second value")
    );
}

#[test_case(create_single_segment_server() ; "single_segment")]
#[test_case(create_segmented_server() ; "segmented")]
fn set_should_keep_flags(server: MockServer) {
    let record = Record::new(Bytes::from("key"), from_string("value"), 0, 0xCAFE, 0);
    server.storage.set(record).unwrap();
    let found = server.storage.get(&Bytes::from("key")).unwrap();
    assert_eq!(found.header().get_flags(), 0xCAFE);
}

#[test_case(create_single_segment_server() ; "single_segment")]
#[test_case(create_segmented_server() ; "segmented")]
fn set_should_ignore_cas_sent_by_client(server: MockServer) {
    let record = Record::new(Bytes::from("key"), from_string("value"), 12345, 0, 0);
    let status = server.storage.set(record).unwrap();
    assert_ne!(status.cas, 12345);
}

#[test_case(create_single_segment_server() ; "single_segment")]
#[test_case(create_segmented_server() ; "segmented")]
fn set_should_accept_empty_value(server: MockServer) {
    server.storage.set(record("key", "")).unwrap();
    let found = server.storage.get(&Bytes::from("key")).unwrap();
    assert!(found.value().is_empty());
    assert_eq!(server.storage.current_bytes(), element_size("key", ""));
}

#[test_case(create_single_segment_server() ; "single_segment")]
#[test_case(create_segmented_server() ; "segmented")]
fn set_should_accept_binary_value(server: MockServer) {
    let value = from_slice(&[0x00, 0xff, 0x0d, 0x0a, 0x80]);
    let record = Record::new(Bytes::from("binary"), value.clone(), 0, 0, 0);
    server.storage.set(record).unwrap();
    let found = server.storage.get(&Bytes::from("binary")).unwrap();
    assert_eq!(found.value(), &value);
}

#[test]
fn set_bigger_than_memory_limit_should_fail() {
    let server = create_server(
        element_size("key", "1234"),
        EvictionPolicy::LeastRecentlyUsed,
        1,
    );
    let result = server.storage.set(record("key", "12345"));
    assert_eq!(result.unwrap_err(), CacheError::ValueTooLarge);
    assert_eq!(server.storage.current_items(), 0);
    assert_eq!(server.storage.stats().set_not_stored, 1);
}
