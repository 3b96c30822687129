use redis_replica_server::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_lrange_command() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command(
        TestUtils::rpush_command("grape", &["a", "b", "c", "d", "e"]),
        &client_address,
    )
    .await
    .unwrap();

    let test_cases = vec![
        ((0, 1), vec!["a", "b"]),
        ((2, 10), vec!["c", "d", "e"]),
        ((-2, -1), vec!["d", "e"]),
        ((-10, 1), vec!["a", "b"]),
        ((3, 1), vec![]),
        ((5, 7), vec![]),
    ];

    for ((start, stop), expected) in test_cases {
        env.exec_command_immediate_success_response(
            TestUtils::lrange_command("grape", start, stop),
            &client_address,
            &TestUtils::expected_bulk_string_array(&expected),
        )
        .await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::lrange_command("missing", 0, -1),
        &client_address,
        &TestUtils::expected_bulk_string_array(&[]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_lrange_command_invalid() {
    let mut env = TestEnv::new_primary_server();

    let test_cases = vec![
        (
            TestUtils::invalid_command(&["LRANGE", "grape", "0"]),
            CommandError::InvalidLRangeCommand,
        ),
        (
            TestUtils::invalid_command(&["LRANGE", "grape", "zero", "1"]),
            CommandError::InvalidLRangeCommandArgument,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_immediate_error_response(
            command,
            &TestUtils::client_address(41844),
            expected_error,
        )
        .await;
    }
}
