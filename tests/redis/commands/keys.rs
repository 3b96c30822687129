use redis_replica_server::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_keys_command() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    for (key, value) in [("grape", "1"), ("guava", "2"), ("mango", "3")] {
        env.exec_command_immediate_success_response(
            TestUtils::set_command(key, value),
            &client_address,
            &TestUtils::expected_simple_string("OK"),
        )
        .await;
    }

    let test_cases = vec![
        ("*", vec!["grape", "guava", "mango"]),
        ("g*", vec!["grape", "guava"]),
        ("?ango", vec!["mango"]),
        ("kiwi", vec![]),
    ];

    for (pattern, expected) in test_cases {
        env.exec_command_immediate_success_response(
            TestUtils::command(&["KEYS", pattern]),
            &client_address,
            &TestUtils::expected_bulk_string_array(&expected),
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_keys_command_invalid() {
    let mut env = TestEnv::new_primary_server();

    env.exec_command_immediate_error_response(
        TestUtils::invalid_command(&["KEYS"]),
        &TestUtils::client_address(41844),
        CommandError::InvalidKeysCommand,
    )
    .await;
}
