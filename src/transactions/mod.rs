//! Per-connection MULTI/EXEC/DISCARD state.

use thiserror::Error;

use crate::commands::CommandHandler;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum TransactionError {
    #[error("MULTI calls can not be nested")]
    NestedMulti,
    #[error("EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    #[default]
    Idle,
    Queueing,
}

#[derive(Debug, Default)]
pub struct Transaction {
    state: TransactionState,
    queued_commands: Vec<CommandHandler>,
    collected_responses: Vec<String>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_queueing(&self) -> bool {
        self.state == TransactionState::Queueing
    }

    pub fn queued_len(&self) -> usize {
        self.queued_commands.len()
    }

    /// `Idle --MULTI--> Queueing`
    pub fn begin(&mut self) -> Result<(), TransactionError> {
        if self.is_queueing() {
            return Err(TransactionError::NestedMulti);
        }

        self.state = TransactionState::Queueing;
        self.queued_commands.clear();
        self.collected_responses.clear();

        Ok(())
    }

    pub fn queue(&mut self, command: CommandHandler) {
        self.queued_commands.push(command);
    }

    /// `Queueing --EXEC--> Idle`, handing back the queued commands in order.
    pub fn take_queued(&mut self) -> Result<Vec<CommandHandler>, TransactionError> {
        if !self.is_queueing() {
            return Err(TransactionError::ExecWithoutMulti);
        }

        self.state = TransactionState::Idle;
        self.collected_responses.clear();

        Ok(std::mem::take(&mut self.queued_commands))
    }

    /// `Queueing --DISCARD--> Idle`
    pub fn discard(&mut self) -> Result<(), TransactionError> {
        if !self.is_queueing() {
            return Err(TransactionError::DiscardWithoutMulti);
        }

        self.state = TransactionState::Idle;
        self.queued_commands.clear();
        self.collected_responses.clear();

        Ok(())
    }

    /// Records one already-encoded reply of an executing transaction.
    pub fn collect_response(&mut self, response: String) {
        self.collected_responses.push(response);
    }

    /// Encodes every collected reply as one array and resets the collection.
    pub fn finish(&mut self) -> String {
        let responses = std::mem::take(&mut self.collected_responses);
        let mut encoded = format!("*{}\r\n", responses.len());

        for response in responses {
            encoded.push_str(&response);
        }

        encoded
    }
}
