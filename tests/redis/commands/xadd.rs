use redis_replica_server::{commands::CommandError, stream::StreamError};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_xadd_command_explicit_ids() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::xadd_command("orders", "1-1", &[("item", "mango")]),
        &client_address,
        &TestUtils::expected_bulk_string("1-1"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::xadd_command("orders", "1-*", &[("item", "grape")]),
        &client_address,
        &TestUtils::expected_bulk_string("1-2"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::xadd_command("orders", "5-*", &[("item", "kiwi")]),
        &client_address,
        &TestUtils::expected_bulk_string("5-0"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::xadd_command("fresh", "0-*", &[("a", "b")]),
        &client_address,
        &TestUtils::expected_bulk_string("0-1"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_xadd_command_auto_id() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    let result = env
        .exec_command(
            TestUtils::xadd_command("orders", "*", &[("item", "mango")]),
            &client_address,
        )
        .await;
    assert!(result.is_ok());

    env.exec_command_immediate_success_response(
        TestUtils::command(&["TYPE", "orders"]),
        &client_address,
        &TestUtils::expected_simple_string("stream"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_xadd_command_invalid_ids() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command(
        TestUtils::xadd_command("orders", "5-5", &[("item", "mango")]),
        &client_address,
    )
    .await
    .unwrap();

    let test_cases = vec![
        (
            TestUtils::xadd_command("orders", "5-5", &[("a", "b")]),
            CommandError::Stream(StreamError::IdNotIncreasing),
        ),
        (
            TestUtils::xadd_command("orders", "4-9", &[("a", "b")]),
            CommandError::Stream(StreamError::IdNotIncreasing),
        ),
        (
            TestUtils::xadd_command("other", "0-0", &[("a", "b")]),
            CommandError::Stream(StreamError::ZeroId),
        ),
        (
            TestUtils::xadd_command("orders", "five", &[("a", "b")]),
            CommandError::Stream(StreamError::InvalidId),
        ),
        (
            TestUtils::invalid_command(&["XADD", "orders", "6-0", "a"]),
            CommandError::InvalidXAddCommand,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_immediate_error_response(command, &client_address, expected_error)
            .await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::command(&["TYPE", "other"]),
        &client_address,
        &TestUtils::expected_simple_string("none"),
    )
    .await;

    assert_eq!(
        CommandError::Stream(StreamError::IdNotIncreasing).as_string(),
        "-ERR The ID specified in XADD is equal or smaller than the target stream top item\r\n"
    );
    assert_eq!(
        CommandError::Stream(StreamError::ZeroId).as_string(),
        "-ERR The ID specified in XADD must be greater than 0-0\r\n"
    );
}
