use redis_replica_server::{commands::CommandError, key_value_store::StoreError};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_rpush_command() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("grape", &["mango"]),
        &client_address,
        &TestUtils::expected_integer(1),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("grape", &["raspberry", "apple"]),
        &client_address,
        &TestUtils::expected_integer(3),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::lrange_command("grape", 0, -1),
        &client_address,
        &TestUtils::expected_bulk_string_array(&["mango", "raspberry", "apple"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_lpush_command() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::lpush_command("grape", &["a", "b", "c"]),
        &client_address,
        &TestUtils::expected_integer(3),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::lrange_command("grape", 0, -1),
        &client_address,
        &TestUtils::expected_bulk_string_array(&["c", "b", "a"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_push_commands_invalid() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command(TestUtils::set_command("grape", "mango"), &client_address)
        .await
        .unwrap();

    let test_cases = vec![
        (
            TestUtils::invalid_command(&["RPUSH", "grape"]),
            CommandError::InvalidRPushCommand,
        ),
        (
            TestUtils::invalid_command(&["LPUSH", "grape"]),
            CommandError::InvalidLPushCommand,
        ),
        (
            TestUtils::rpush_command("grape", &["a"]),
            CommandError::Store(StoreError::WrongType),
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_immediate_error_response(command, &client_address, expected_error)
            .await;
    }
}
