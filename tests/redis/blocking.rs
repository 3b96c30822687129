use std::time::{Duration, Instant};

use redis_replica_server::resp::RespValue;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_blpop_direct_response() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command(
        TestUtils::rpush_command("grape", &["mango", "raspberry"]),
        &client_address,
    )
    .await
    .unwrap();

    env.exec_command_immediate_success_response(
        TestUtils::blpop_command("grape", "0"),
        &client_address,
        &TestUtils::expected_bulk_string_array(&["grape", "mango"]),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_blocks_until_push() {
    let env = TestEnv::new_primary_server();

    let client_task = TestUtils::spawn_command_task(
        &env,
        TestUtils::blpop_command("queue", "0"),
        &TestUtils::client_address(12345),
    );

    TestUtils::sleep_ms(100).await;
    assert!(!client_task.is_finished());

    let mut pusher = env.clone();
    pusher
        .exec_command_immediate_success_response(
            TestUtils::rpush_command("queue", &["item1"]),
            &TestUtils::client_address(12346),
            &TestUtils::expected_integer(1),
        )
        .await;

    let client_result = TestUtils::wait_for_completion(client_task, Duration::from_secs(2)).await;
    assert_eq!(
        client_result,
        Ok(TestUtils::expected_bulk_string_array(&["queue", "item1"]))
    );

    pusher
        .exec_command_immediate_success_response(
            TestUtils::llen_command("queue"),
            &TestUtils::client_address(12346),
            &TestUtils::expected_integer(0),
        )
        .await;
}

#[tokio::test]
async fn test_blpop_timeout() {
    let env = TestEnv::new_primary_server();
    let started = Instant::now();

    let client_task = TestUtils::spawn_command_task(
        &env,
        TestUtils::blpop_command("queue", "0.1"),
        &TestUtils::client_address(12345),
    );

    let client_result = TestUtils::wait_for_completion(client_task, Duration::from_secs(2)).await;

    assert_eq!(client_result, Ok(TestUtils::expected_null()));
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_blpop_serves_waiters_in_arrival_order() {
    let env = TestEnv::new_primary_server();

    let first = TestUtils::spawn_command_task(
        &env,
        TestUtils::blpop_command("queue", "2"),
        &TestUtils::client_address(12345),
    );
    TestUtils::sleep_ms(50).await;

    let second = TestUtils::spawn_command_task(
        &env,
        TestUtils::blpop_command("queue", "2"),
        &TestUtils::client_address(12346),
    );
    TestUtils::sleep_ms(50).await;

    let mut pusher = env.clone();
    pusher
        .exec_command_immediate_success_response(
            TestUtils::rpush_command("queue", &["one"]),
            &TestUtils::client_address(12347),
            &TestUtils::expected_integer(1),
        )
        .await;

    assert_eq!(
        TestUtils::wait_for_completion(first, Duration::from_secs(3)).await,
        Ok(TestUtils::expected_bulk_string_array(&["queue", "one"]))
    );

    TestUtils::sleep_ms(50).await;
    assert!(!second.is_finished());

    pusher
        .exec_command_immediate_success_response(
            TestUtils::rpush_command("queue", &["two"]),
            &TestUtils::client_address(12347),
            &TestUtils::expected_integer(1),
        )
        .await;

    assert_eq!(
        TestUtils::wait_for_completion(second, Duration::from_secs(3)).await,
        Ok(TestUtils::expected_bulk_string_array(&["queue", "two"]))
    );
}

#[tokio::test]
async fn test_blpop_multiple_values_wake_multiple_waiters() {
    let env = TestEnv::new_primary_server();

    let waiters: Vec<_> = (0..3)
        .map(|i| {
            TestUtils::spawn_command_task(
                &env,
                TestUtils::blpop_command("queue", "2"),
                &TestUtils::client_address(12350 + i),
            )
        })
        .collect();
    TestUtils::sleep_ms(100).await;

    let mut pusher = env.clone();
    pusher
        .exec_command(
            TestUtils::rpush_command("queue", &["a", "b", "c"]),
            &TestUtils::client_address(12347),
        )
        .await
        .unwrap();

    let mut values = Vec::new();

    for waiter in waiters {
        let response = TestUtils::wait_for_completion(waiter, Duration::from_secs(3))
            .await
            .unwrap();
        values.push(response);
    }

    values.sort();

    let mut expected: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|value| TestUtils::expected_bulk_string_array(&["queue", *value]))
        .collect();
    expected.sort();

    assert_eq!(values, expected);
}

#[tokio::test]
async fn test_xread_block_until_xadd() {
    let env = TestEnv::new_primary_server();

    let reader = TestUtils::spawn_command_task(
        &env,
        TestUtils::command(&["XREAD", "BLOCK", "0", "STREAMS", "orders", "$"]),
        &TestUtils::client_address(12345),
    );
    TestUtils::sleep_ms(100).await;
    assert!(!reader.is_finished());

    let mut writer = env.clone();
    writer
        .exec_command_immediate_success_response(
            TestUtils::xadd_command("orders", "1-1", &[("item", "mango")]),
            &TestUtils::client_address(12346),
            &TestUtils::expected_bulk_string("1-1"),
        )
        .await;

    let expected = RespValue::Array(vec![RespValue::Array(vec![
        RespValue::BulkString("orders".to_string()),
        RespValue::Array(vec![TestUtils::expected_stream_entry(
            "1-1",
            &["item", "mango"],
        )]),
    ])]);

    assert_eq!(
        TestUtils::wait_for_completion(reader, Duration::from_secs(2)).await,
        Ok(expected.encode())
    );
}

#[tokio::test]
async fn test_xread_block_timeout() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(12345);

    env.exec_command(
        TestUtils::xadd_command("orders", "1-1", &[("item", "mango")]),
        &client_address,
    )
    .await
    .unwrap();

    let started = Instant::now();

    env.exec_command_immediate_success_response(
        TestUtils::command(&["XREAD", "BLOCK", "100", "STREAMS", "orders", "1-1"]),
        &client_address,
        &TestUtils::expected_null(),
    )
    .await;

    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_xread_block_returns_existing_entries_immediately() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(12345);

    env.exec_command(
        TestUtils::xadd_command("orders", "1-1", &[("item", "mango")]),
        &client_address,
    )
    .await
    .unwrap();

    let expected = RespValue::Array(vec![RespValue::Array(vec![
        RespValue::BulkString("orders".to_string()),
        RespValue::Array(vec![TestUtils::expected_stream_entry(
            "1-1",
            &["item", "mango"],
        )]),
    ])]);

    env.exec_command_immediate_success_response(
        TestUtils::command(&["XREAD", "BLOCK", "1000", "STREAMS", "orders", "0-0"]),
        &client_address,
        &expected.encode(),
    )
    .await;
}
