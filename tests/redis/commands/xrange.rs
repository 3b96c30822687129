use redis_replica_server::resp::RespValue;

use crate::test_utils::{TestEnv, TestUtils};

async fn setup(env: &mut TestEnv, client_address: &str) {
    for (id, value) in [("1-1", "a"), ("1-2", "b"), ("2-0", "c"), ("3-5", "d")] {
        env.exec_command(
            TestUtils::xadd_command("orders", id, &[("item", value)]),
            client_address,
        )
        .await
        .unwrap();
    }
}

fn expected_entries(entries: &[(&str, &str)]) -> String {
    RespValue::Array(
        entries
            .iter()
            .map(|(id, value)| TestUtils::expected_stream_entry(id, &["item", *value]))
            .collect(),
    )
    .encode()
}

#[tokio::test]
async fn test_handle_xrange_command() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);
    setup(&mut env, &client_address).await;

    let test_cases = vec![
        (("-", "+"), vec![("1-1", "a"), ("1-2", "b"), ("2-0", "c"), ("3-5", "d")]),
        (("1-2", "2-0"), vec![("1-2", "b"), ("2-0", "c")]),
        (("1", "1"), vec![("1-1", "a"), ("1-2", "b")]),
        (("2", "+"), vec![("2-0", "c"), ("3-5", "d")]),
        (("4", "+"), vec![]),
    ];

    for ((start, end), expected) in test_cases {
        env.exec_command_immediate_success_response(
            TestUtils::xrange_command("orders", start, end),
            &client_address,
            &expected_entries(&expected),
        )
        .await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::xrange_command("missing", "-", "+"),
        &client_address,
        &expected_entries(&[]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_xrange_command_with_count() {
    let mut env = TestEnv::new_primary_server();
    let client_address = TestUtils::client_address(41844);
    setup(&mut env, &client_address).await;

    env.exec_command_immediate_success_response(
        TestUtils::command(&["XRANGE", "orders", "-", "+", "COUNT", "2"]),
        &client_address,
        &expected_entries(&[("1-1", "a"), ("1-2", "b")]),
    )
    .await;
}
