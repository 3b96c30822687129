use redis_replica_server::commands::{CommandError, CommandResult};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_replconf_command() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::command(&["REPLCONF", "listening-port", "6380"]),
        &client_address,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;
    assert_eq!(env.connection(&client_address).listening_port, Some(6380));

    env.exec_command_immediate_success_response(
        TestUtils::command(&["REPLCONF", "capa", "psync2"]),
        &client_address,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let result = env
        .exec_command(
            TestUtils::command(&["REPLCONF", "ACK", "0"]),
            &client_address,
        )
        .await;
    assert_eq!(result, Ok(CommandResult::NoResponse));
}

#[tokio::test]
async fn test_handle_replconf_command_invalid() {
    let mut env = TestEnv::new_primary_server();

    let test_cases = vec![
        (
            TestUtils::invalid_command(&["REPLCONF", "capa"]),
            CommandError::InvalidReplconfCommand,
        ),
        (
            TestUtils::invalid_command(&["REPLCONF", "listening-port", "port"]),
            CommandError::InvalidReplconfOffset,
        ),
        (
            TestUtils::invalid_command(&["REPLCONF", "rdb-only", "1"]),
            CommandError::InvalidReplconfOption("rdb-only".to_string()),
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

#[tokio::test]
async fn test_handle_psync_command() {
    let mut env = TestEnv::new_primary_server();

    env.exec_command_immediate_error_response(
        TestUtils::command(&["PSYNC", "?", "-1"]),
        &TestUtils::client_address(41844),
        CommandError::PsyncWithoutListeningPort,
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::command(&["REPLCONF", "listening-port", "6380"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let result = env
        .exec_command(
            TestUtils::command(&["PSYNC", "?", "-1"]),
            &TestUtils::client_address(41844),
        )
        .await;
    assert_eq!(result, Ok(CommandResult::FullResync));

    env.exec_command_immediate_error_response(
        TestUtils::invalid_command(&["PSYNC", "?"]),
        &TestUtils::client_address(41844),
        CommandError::InvalidPsyncCommand,
    )
    .await;
}

#[tokio::test]
async fn test_handle_wait_command_without_replicas() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::command(&["WAIT", "0", "100"]),
        &client_address,
        &TestUtils::expected_integer(0),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::command(&["WAIT", "3", "100"]),
        &client_address,
        &TestUtils::expected_integer(0),
    )
    .await;

    env.exec_command_immediate_error_response(
        TestUtils::invalid_command(&["WAIT", "one", "100"]),
        &client_address,
        CommandError::InvalidWaitCommandArgument,
    )
    .await;
}

#[tokio::test]
async fn test_replica_role_commands() {
    let mut env = TestEnv::new_replica_server();
    let client_address = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::command(&["REPLCONF", "GETACK", "*"]),
        &client_address,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::command(&["PSYNC", "?", "-1"]),
        &client_address,
        &TestUtils::expected_null(),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::command(&["WAIT", "1", "0"]),
        &client_address,
        &TestUtils::expected_integer(0),
    )
    .await;
}

#[tokio::test]
async fn test_replica_rejects_client_writes() {
    let mut env = TestEnv::new_replica_server();
    let client_address = TestUtils::client_address(41844);

    for command in [
        TestUtils::set_command("grape", "mango"),
        TestUtils::incr_command("counter"),
        TestUtils::rpush_command("list", &["a"]),
        TestUtils::blpop_command("list", "0"),
        TestUtils::xadd_command("orders", "1-1", &[("a", "b")]),
    ] {
        env.exec_command_immediate_error_response(
            command,
            &client_address,
            CommandError::ReadOnlyReplica,
        )
        .await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::get_command("grape"),
        &client_address,
        &TestUtils::expected_null(),
    )
    .await;

    assert_eq!(
        CommandError::ReadOnlyReplica.as_string(),
        "-ERR READONLY You can't write against a read only replica.\r\n"
    );
}
