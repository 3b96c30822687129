use tracing::debug;

use crate::{
    commands::{
        blpop::{BlpopArguments, blpop},
        command_error::CommandError,
        config_get::{ConfigGetArguments, config_get},
        echo::{EchoArguments, echo},
        get::{GetArguments, get},
        incr::{IncrArguments, incr},
        info::{InfoArguments, info},
        keys::{KeysArguments, keys},
        llen::{LlenArguments, llen},
        lpop::{LpopArguments, lpop},
        lrange::{LrangeArguments, lrange},
        ping::{PingArguments, ping},
        replication::{PsyncArguments, ReplconfArguments, WaitArguments, psync, replconf, wait},
        rpush_and_lpush::{PushArrayOperations, lpush, rpush},
        set::{SetArguments, set},
        transactions::{DiscardArguments, ExecArguments, MultiArguments, discard, exec, multi},
        type_command::{TypeArguments, type_command},
        xadd::{XaddArguments, xadd},
        xrange::{XrangeArguments, xrange},
        xread::{XreadArguments, xread},
    },
    connection::{ConnectionContext, ConnectionKind},
    resp::RespValue,
    server::RedisServer,
};

/// Writes that are forwarded to replicas once applied.
const PROPAGATED_COMMANDS: [&str; 6] = ["SET", "INCR", "RPUSH", "LPUSH", "LPOP", "XADD"];

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    NoResponse,
    Response(String),
    /// `PSYNC` accepted: the connection must send the snapshot and become a replica.
    FullResync,
    /// `EXEC`: the queued commands, to be run in order.
    Batch(Vec<CommandHandler>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
    pub input: RespValue,
}

impl CommandHandler {
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommand);
        };

        let mut parts = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(s) => parts.push(s.clone()),
                _ => return Err(CommandError::InvalidCommandArgument),
            }
        }

        let Some(first) = parts.first() else {
            return Err(CommandError::InvalidCommand);
        };

        let name = first.to_uppercase();

        let (name, arguments) = if name == "CONFIG" {
            let Some(sub_command) = parts.get(1) else {
                return Err(CommandError::InvalidConfigGetCommand);
            };

            if sub_command.to_uppercase() != "GET" {
                return Err(CommandError::InvalidConfigSubcommand(sub_command.clone()));
            }

            ("CONFIG GET".to_string(), parts[2..].to_vec())
        } else {
            (name, parts[1..].to_vec())
        };

        Ok(Self {
            name,
            arguments,
            input,
        })
    }

    pub fn is_propagated(&self) -> bool {
        PROPAGATED_COMMANDS.contains(&self.name.as_str())
    }

    /// Commands a replica refuses from its own clients.
    pub fn is_write(&self) -> bool {
        self.is_propagated() || self.name == "BLPOP"
    }

    /// Checks arity and argument syntax without touching any state. Used to
    /// reject malformed commands before they are queued in a transaction.
    pub fn validate_command_arguments(&self) -> Option<CommandError> {
        let arguments = self.arguments.clone();

        match self.name.as_str() {
            "PING" => PingArguments::parse(arguments).err(),
            "ECHO" => EchoArguments::parse(arguments).err(),
            "GET" => GetArguments::parse(arguments).err(),
            "SET" => SetArguments::parse(arguments).err(),
            "INCR" => IncrArguments::parse(arguments).err(),
            "KEYS" => KeysArguments::parse(arguments).err(),
            "TYPE" => TypeArguments::parse(arguments).err(),
            "CONFIG GET" => ConfigGetArguments::parse(arguments).err(),
            "INFO" => InfoArguments::parse(arguments).err(),
            "RPUSH" => PushArrayOperations::parse(arguments, false).err(),
            "LPUSH" => PushArrayOperations::parse(arguments, true).err(),
            "LLEN" => LlenArguments::parse(arguments).err(),
            "LPOP" => LpopArguments::parse(arguments).err(),
            "BLPOP" => BlpopArguments::parse(arguments).err(),
            "LRANGE" => LrangeArguments::parse(arguments).err(),
            "XADD" => XaddArguments::parse(arguments).err(),
            "XRANGE" => XrangeArguments::parse(arguments).err(),
            "XREAD" => XreadArguments::parse(arguments).err(),
            "MULTI" => MultiArguments::parse(arguments).err(),
            "EXEC" => ExecArguments::parse(arguments).err(),
            "DISCARD" => DiscardArguments::parse(arguments).err(),
            "REPLCONF" => ReplconfArguments::parse(arguments).err(),
            "PSYNC" => PsyncArguments::parse(arguments).err(),
            "WAIT" => WaitArguments::parse(arguments).err(),
            _ => None,
        }
    }

    /// Entry point for one decoded command on a connection.
    ///
    /// While the connection is inside MULTI every command other than
    /// MULTI/EXEC/DISCARD is queued and answered with `QUEUED`. EXEC replays
    /// the queue through [`CommandHandler::execute`], the same path a command
    /// outside a transaction takes, and answers with one array of replies.
    pub async fn handle(
        &self,
        server: &RedisServer,
        connection: &mut ConnectionContext,
    ) -> Result<CommandResult, CommandError> {
        let is_transaction_command = matches!(self.name.as_str(), "MULTI" | "EXEC" | "DISCARD");

        if connection.transaction.is_queueing() && !is_transaction_command {
            if let Some(err) = self.validate_command_arguments() {
                return Err(err);
            }

            connection.transaction.queue(self.clone());
            debug!(client = %connection.address, command = %self.name, "queued");

            return Ok(CommandResult::Response(
                RespValue::SimpleString("QUEUED".to_string()).encode(),
            ));
        }

        match self.execute(server, connection).await? {
            CommandResult::Batch(commands) => {
                for command in commands {
                    let response = match command.execute(server, connection).await {
                        Ok(CommandResult::Response(response)) => response,
                        Ok(_) => RespValue::Null.encode(),
                        Err(e) => e.as_string(),
                    };

                    connection.transaction.collect_response(response);
                }

                Ok(CommandResult::Response(connection.transaction.finish()))
            }
            result => Ok(result),
        }
    }

    /// Runs the command now. Writes hold the role's write-order guard while
    /// they are applied and propagated. XADD is propagated with the id it
    /// stored; other writes go out as received.
    pub async fn execute(
        &self,
        server: &RedisServer,
        connection: &mut ConnectionContext,
    ) -> Result<CommandResult, CommandError> {
        if self.is_write()
            && server.role.as_replica().is_some()
            && connection.kind != ConnectionKind::Primary
        {
            return Err(CommandError::ReadOnlyReplica);
        }

        let _write_order = if self.is_propagated() {
            server.role.write_order_guard().await
        } else {
            None
        };

        let (result, replicated) = match self.name.as_str() {
            "XADD" => {
                let added = xadd(&server.store, self.arguments.clone()).await?;
                (added.response(), Some(added.replicated_command()))
            }
            _ => {
                let result = self.dispatch(server, connection).await?;
                (result, self.is_propagated().then(|| self.input.clone()))
            }
        };

        if let Some(command) = replicated {
            server.role.propagate(&command).await;
        }

        Ok(result)
    }

    async fn dispatch(
        &self,
        server: &RedisServer,
        connection: &mut ConnectionContext,
    ) -> Result<CommandResult, CommandError> {
        let store = &server.store;
        let arguments = self.arguments.clone();

        match self.name.as_str() {
            "PING" => ping(arguments),
            "ECHO" => echo(arguments),
            "GET" => get(store, arguments).await,
            "SET" => set(store, arguments).await,
            "INCR" => incr(store, arguments).await,
            "KEYS" => keys(store, arguments).await,
            "TYPE" => type_command(store, arguments).await,
            "CONFIG GET" => config_get(&server.config, arguments),
            "INFO" => info(&server.role, arguments).await,
            "RPUSH" => rpush(store, arguments).await,
            "LPUSH" => lpush(store, arguments).await,
            "LLEN" => llen(store, arguments).await,
            "LPOP" => lpop(store, arguments).await,
            "BLPOP" => blpop(server, &connection.address, arguments).await,
            "LRANGE" => lrange(store, arguments).await,
            "XRANGE" => xrange(store, arguments).await,
            "XREAD" => xread(store, &connection.address, arguments).await,
            "MULTI" => multi(&mut connection.transaction, arguments),
            "EXEC" => exec(&mut connection.transaction, arguments),
            "DISCARD" => discard(&mut connection.transaction, arguments),
            "REPLCONF" => replconf(&server.role, connection, arguments).await,
            "PSYNC" => psync(&server.role, connection, arguments),
            "WAIT" => wait(&server.role, arguments).await,
            _ => {
                debug!(command = %self.name, "unknown command");
                Ok(CommandResult::Response(RespValue::Null.encode()))
            }
        }
    }
}
