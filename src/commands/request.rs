//! Parsed request model.
//!
//! The connection layer decodes a request into an argument vector of raw
//! byte strings; this module resolves the first argument into a
//! [`CommandKind`] and wraps the whole vector as an immutable
//! [`RequestCommand`]. A request is created once per command and consumed by
//! exactly one execution.

use crate::commands::CommandError;
use bytes::Bytes;

/// Identifier of a supported command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Set,
    Setnx,
    Setex,
    Psetex,
    Get,
    Incr,
    Decr,
    Incrby,
    Decrby,
    Hincrby,
    Zincrby,
    Sadd,
    Srem,
    Scard,
    Sismember,
    Smembers,
    Ping,
    Echo,
    Multi,
    Exec,
    Discard,
}

impl CommandKind {
    /// Resolves a raw command token, case-insensitively.
    pub fn parse(token: &[u8]) -> Option<CommandKind> {
        let name = std::str::from_utf8(token).ok()?;
        let kind = match name.to_ascii_uppercase().as_str() {
            "SET" => CommandKind::Set,
            "SETNX" => CommandKind::Setnx,
            "SETEX" => CommandKind::Setex,
            "PSETEX" => CommandKind::Psetex,
            "GET" => CommandKind::Get,
            "INCR" => CommandKind::Incr,
            "DECR" => CommandKind::Decr,
            "INCRBY" => CommandKind::Incrby,
            "DECRBY" => CommandKind::Decrby,
            "HINCRBY" => CommandKind::Hincrby,
            "ZINCRBY" => CommandKind::Zincrby,
            "SADD" => CommandKind::Sadd,
            "SREM" => CommandKind::Srem,
            "SCARD" => CommandKind::Scard,
            "SISMEMBER" => CommandKind::Sismember,
            "SMEMBERS" => CommandKind::Smembers,
            "PING" => CommandKind::Ping,
            "ECHO" => CommandKind::Echo,
            "MULTI" => CommandKind::Multi,
            "EXEC" => CommandKind::Exec,
            "DISCARD" => CommandKind::Discard,
            _ => return None,
        };
        Some(kind)
    }

    /// True for the transaction verbs the connection session intercepts.
    pub fn is_transaction_verb(&self) -> bool {
        matches!(
            self,
            CommandKind::Multi | CommandKind::Exec | CommandKind::Discard
        )
    }
}

/// One decoded request: the resolved command plus its full argument vector,
/// command token included at index 0. Immutable once built.
#[derive(Debug, Clone)]
pub struct RequestCommand {
    pub kind: CommandKind,
    pub args: Vec<Bytes>,
}

impl RequestCommand {
    /// Builds a request from a decoded argument vector, resolving the
    /// command token. Unknown commands fail before any arity or argument
    /// inspection.
    pub fn parse(args: Vec<Bytes>) -> Result<RequestCommand, CommandError> {
        let token = args
            .first()
            .ok_or_else(|| CommandError::UnknownCommand(String::new()))?;
        let kind = CommandKind::parse(token).ok_or_else(|| {
            CommandError::UnknownCommand(String::from_utf8_lossy(token).into_owned())
        })?;
        Ok(RequestCommand { kind, args })
    }

    /// Total argument count, command token included.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// The protocol key argument. Callers validate arity first; every keyed
    /// command places its key at index 1.
    pub fn key(&self) -> &Bytes {
        &self.args[1]
    }
}
