use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_unknown_command() {
    let mut env = TestEnv::new_primary_server();

    env.exec_command_immediate_success_response(
        TestUtils::command(&["FLUSHALL"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_null(),
    )
    .await;
}
