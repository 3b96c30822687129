use redis_replica_server::{commands::CommandError, key_value_store::StoreError};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_get_command() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::get_command("grape"),
        &client_address,
        &TestUtils::expected_null(),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::set_command("grape", "mango"),
        &client_address,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::get_command("grape"),
        &client_address,
        &TestUtils::expected_bulk_string("mango"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_get_command_wrong_type() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("fruits", &["mango"]),
        &client_address,
        &TestUtils::expected_integer(1),
    )
    .await;

    env.exec_command_immediate_error_response(
        TestUtils::get_command("fruits"),
        &client_address,
        CommandError::Store(StoreError::WrongType),
    )
    .await;

    env.exec_command_immediate_error_response(
        TestUtils::invalid_command(&["GET"]),
        &client_address,
        CommandError::InvalidGetCommand,
    )
    .await;
}
