use std::{collections::HashMap, sync::Arc, time::Duration};

use redis_replica_server::{
    commands::{CommandError, CommandHandler, CommandResult},
    connection::{ConnectionContext, ConnectionKind},
    input::RespReader,
    resp::RespValue,
    server::RedisServer,
};
use tokio::{
    io::{AsyncWriteExt, DuplexStream},
    net::{TcpListener, TcpStream, tcp::OwnedReadHalf, tcp::OwnedWriteHalf},
    task::JoinHandle,
    time::timeout,
};

/// Test utilities for simplifying command tests
pub struct TestUtils;

/// Test environment: a shared server plus one connection context per client address
pub struct TestEnv {
    pub server: Arc<RedisServer>,
    connections: HashMap<String, ConnectionContext>,
}

impl TestEnv {
    /// Create a new test environment with a primary server
    pub fn new_primary_server() -> Self {
        Self::from_args(&["redis-replica-server"])
    }

    /// Create a new test environment with a replica server. Nothing connects
    /// to the primary address.
    pub fn new_replica_server() -> Self {
        Self::from_args(&["redis-replica-server", "--replicaof", "127.0.0.1 6379"])
    }

    pub fn from_args(args: &[&str]) -> Self {
        Self {
            server: Arc::new(RedisServer::from_args(args.iter().copied()).unwrap()),
            connections: HashMap::new(),
        }
    }

    /// A second environment sharing the same server, with its own connections
    pub fn clone(&self) -> Self {
        Self {
            server: Arc::clone(&self.server),
            connections: HashMap::new(),
        }
    }

    pub fn connection(&mut self, client_address: &str) -> &mut ConnectionContext {
        self.connections
            .entry(client_address.to_string())
            .or_insert_with(|| ConnectionContext::new(client_address, ConnectionKind::Client))
    }

    /// Execute a command and return the result
    pub async fn exec_command(
        &mut self,
        command: RespValue,
        client_address: &str,
    ) -> Result<CommandResult, CommandError> {
        let command_handler = CommandHandler::new(command)?;
        let server = Arc::clone(&self.server);
        let connection = self.connection(client_address);

        command_handler.handle(&server, connection).await
    }

    /// Execute a command and assert it succeeds with expected result
    pub async fn exec_command_immediate_success_response(
        &mut self,
        command: RespValue,
        client_address: &str,
        expected_response: &str,
    ) {
        let result = self.exec_command(command, client_address).await;

        assert_eq!(
            result,
            Ok(CommandResult::Response(expected_response.to_string()))
        );
    }

    /// Execute a command and assert it fails
    pub async fn exec_command_immediate_error_response(
        &mut self,
        command: RespValue,
        client_address: &str,
        expected_error: CommandError,
    ) {
        let result = self.exec_command(command, client_address).await;

        assert_eq!(result, Err(expected_error));
    }
}

impl TestUtils {
    pub fn client_address(port: u16) -> String {
        format!("127.0.0.1:{}", port)
    }

    /// Create any command from its parts
    pub fn command(parts: &[&str]) -> RespValue {
        RespValue::command(parts)
    }

    pub fn invalid_command(parts: &[&str]) -> RespValue {
        RespValue::command(parts)
    }

    pub fn ping_command() -> RespValue {
        RespValue::command(&["PING"])
    }

    pub fn echo_command(message: &str) -> RespValue {
        RespValue::command(&["ECHO", message])
    }

    pub fn get_command(key: &str) -> RespValue {
        RespValue::command(&["GET", key])
    }

    pub fn set_command(key: &str, value: &str) -> RespValue {
        RespValue::command(&["SET", key, value])
    }

    pub fn set_command_with_expiration(key: &str, value: &str, expiration_ms: u64) -> RespValue {
        RespValue::command(&["SET", key, value, "PX", expiration_ms.to_string().as_str()])
    }

    pub fn incr_command(key: &str) -> RespValue {
        RespValue::command(&["INCR", key])
    }

    pub fn rpush_command(key: &str, values: &[&str]) -> RespValue {
        let mut parts = vec!["RPUSH", key];
        parts.extend_from_slice(values);

        RespValue::command(&parts)
    }

    pub fn lpush_command(key: &str, values: &[&str]) -> RespValue {
        let mut parts = vec!["LPUSH", key];
        parts.extend_from_slice(values);

        RespValue::command(&parts)
    }

    pub fn llen_command(key: &str) -> RespValue {
        RespValue::command(&["LLEN", key])
    }

    pub fn lrange_command(key: &str, start: i64, stop: i64) -> RespValue {
        RespValue::command(&[
            "LRANGE",
            key,
            start.to_string().as_str(),
            stop.to_string().as_str(),
        ])
    }

    pub fn lpop_command(key: &str) -> RespValue {
        RespValue::command(&["LPOP", key])
    }

    pub fn lpop_command_multiple_items(key: &str, count: u32) -> RespValue {
        RespValue::command(&["LPOP", key, count.to_string().as_str()])
    }

    pub fn blpop_command(key: &str, timeout_seconds: &str) -> RespValue {
        RespValue::command(&["BLPOP", key, timeout_seconds])
    }

    pub fn xadd_command(key: &str, id: &str, fields: &[(&str, &str)]) -> RespValue {
        let mut parts = vec!["XADD", key, id];

        for (field, value) in fields {
            parts.push(*field);
            parts.push(*value);
        }

        RespValue::command(&parts)
    }

    pub fn xrange_command(key: &str, start: &str, end: &str) -> RespValue {
        RespValue::command(&["XRANGE", key, start, end])
    }

    pub fn multi_command() -> RespValue {
        RespValue::command(&["MULTI"])
    }

    pub fn exec_command() -> RespValue {
        RespValue::command(&["EXEC"])
    }

    pub fn discard_command() -> RespValue {
        RespValue::command(&["DISCARD"])
    }

    pub fn expected_simple_string(s: &str) -> String {
        RespValue::SimpleString(s.to_string()).encode()
    }

    pub fn expected_bulk_string(s: &str) -> String {
        RespValue::BulkString(s.to_string()).encode()
    }

    pub fn expected_integer(n: i64) -> String {
        RespValue::Integer(n).encode()
    }

    pub fn expected_null() -> String {
        RespValue::Null.encode()
    }

    pub fn expected_bulk_string_array(values: &[&str]) -> String {
        RespValue::encode_array_from_strings(values.iter().map(|value| value.to_string()).collect())
    }

    pub fn expected_stream_entry(id: &str, fields: &[&str]) -> RespValue {
        RespValue::Array(vec![
            RespValue::BulkString(id.to_string()),
            RespValue::command(fields),
        ])
    }

    /// Spawn a command on its own connection, returning its encoded reply
    pub fn spawn_command_task(
        env: &TestEnv,
        command: RespValue,
        client_address: &str,
    ) -> JoinHandle<Result<String, CommandError>> {
        let mut env = env.clone();
        let client_address = client_address.to_string();

        tokio::spawn(async move {
            match env.exec_command(command, &client_address).await? {
                CommandResult::Response(response) => Ok(response),
                other => panic!("Expected response, got {:?}", other),
            }
        })
    }

    pub async fn wait_for_completion(
        task: JoinHandle<Result<String, CommandError>>,
        limit: Duration,
    ) -> Result<String, CommandError> {
        timeout(limit, task)
            .await
            .expect("task did not finish in time")
            .expect("task panicked")
    }

    pub async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// A TCP client speaking RESP to a running server
pub struct TestClient {
    reader: RespReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(address: &str) -> Self {
        let stream = TcpStream::connect(address).await.unwrap();
        let (reader, writer) = stream.into_split();

        Self {
            reader: RespReader::new(reader),
            writer,
        }
    }

    pub async fn send(&mut self, parts: &[&str]) {
        self.writer
            .write_all(RespValue::command(parts).encode().as_bytes())
            .await
            .unwrap();
    }

    pub async fn read(&mut self) -> RespValue {
        let (value, _) = timeout(Duration::from_secs(5), self.reader.read_frame())
            .await
            .expect("no reply in time")
            .unwrap();

        value
    }

    pub async fn request(&mut self, parts: &[&str]) -> RespValue {
        self.send(parts).await;
        self.read().await
    }
}

/// Starts a server on an ephemeral port and returns its address
pub async fn spawn_server(extra_args: &[&str]) -> (String, Arc<RedisServer>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let mut args = vec!["redis-replica-server", "--port", "0"];
    args.extend_from_slice(extra_args);

    let server = Arc::new(RedisServer::from_args(args).unwrap());
    let serving = Arc::clone(&server);

    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });

    (address, server)
}

/// An in-memory pipe standing in for a client socket
pub fn duplex_pair() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(64 * 1024)
}
