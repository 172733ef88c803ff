//! Command dispatch and shared translation rules.
//!
//! [`CommandHandler`] is the single entry point the connection layer calls:
//! one async `execute` per request, returning the finished wire reply. It
//! looks the command up in the registry, enforces the arity contract, and
//! hands the request to its family's executor together with the
//! descriptor data. All state a request needs is captured before the store
//! call is issued; nothing is shared mutably across in-flight executions.

use crate::commands::registry::{self, CommandFamily};
use crate::commands::request::{CommandKind, RequestCommand};
use crate::commands::{counters, sets, strings, CommandError};
use crate::protocol::RespValue;
use crate::store::{Key, StoreDriver, StoreValue};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// The namespace, set, and bin names under which protocol keys live in the
/// store. Fixed at startup; every key the gateway touches is addressed
/// through it.
#[derive(Debug, Clone)]
pub struct Keyspace {
    pub namespace: String,
    pub set: String,
    pub bin: String,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self {
            namespace: "test".to_string(),
            set: "redis".to_string(),
            bin: "data".to_string(),
        }
    }
}

impl Keyspace {
    pub fn new(
        namespace: impl Into<String>,
        set: impl Into<String>,
        bin: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            bin: bin.into(),
        }
    }

    /// Store key for a protocol key argument.
    pub fn key(&self, user_key: &Bytes) -> Key {
        Key::new(self.namespace.clone(), self.set.clone(), user_key.clone())
    }
}

/// Translates requests into store calls and outcomes into replies.
#[derive(Clone)]
pub struct CommandHandler {
    driver: Arc<dyn StoreDriver>,
    keyspace: Keyspace,
}

impl CommandHandler {
    pub fn new(driver: Arc<dyn StoreDriver>, keyspace: Keyspace) -> Self {
        Self { driver, keyspace }
    }

    /// Executes one request to completion and returns its reply.
    ///
    /// Every outcome, the expected negatives and store failures included,
    /// comes back as a reply value; this function never fails.
    pub async fn execute(&self, cmd: RequestCommand) -> RespValue {
        let reply = match self.dispatch(&cmd).await {
            Ok(reply) => reply,
            Err(err) => err.into_reply(),
        };
        debug!(command = registry::spec(cmd.kind).name, reply = %reply, "executed");
        reply
    }

    async fn dispatch(&self, cmd: &RequestCommand) -> Result<RespValue, CommandError> {
        let spec = registry::spec(cmd.kind);
        if !spec.arity.accepts(cmd.arg_count()) {
            return Err(CommandError::WrongArity {
                name: spec.name,
                given: cmd.arg_count(),
            });
        }

        let driver = self.driver.as_ref();
        match spec.family {
            CommandFamily::Write(write) => {
                strings::execute_write(driver, &self.keyspace, spec, &write, cmd).await
            }
            CommandFamily::Read => strings::execute_get(driver, &self.keyspace, cmd).await,
            CommandFamily::Counter(counter) => {
                counters::execute(driver, &self.keyspace, &counter, cmd).await
            }
            CommandFamily::Member(member) => {
                sets::execute(driver, &self.keyspace, &member, cmd).await
            }
            CommandFamily::Liveness => Ok(liveness_reply(cmd)),
            CommandFamily::Control => Ok(control_reply(cmd.kind)),
        }
    }
}

/// PING and ECHO share one rule: echo the argument if present, answer PONG
/// otherwise (ECHO's arity guarantees the argument).
fn liveness_reply(cmd: &RequestCommand) -> RespValue {
    match cmd.args.get(1) {
        Some(msg) => RespValue::bulk_string(msg.clone()),
        None => RespValue::pong(),
    }
}

/// Transaction verbs are intercepted by the connection session. One that
/// reaches the dispatch path is running with no transaction unit open.
fn control_reply(kind: CommandKind) -> RespValue {
    match kind {
        CommandKind::Exec => RespValue::error("ERR EXEC without MULTI"),
        CommandKind::Discard => RespValue::error("ERR DISCARD without MULTI"),
        _ => RespValue::error("ERR MULTI calls can not be nested"),
    }
}

/// Renders a store value in its natural wire shape: integers stay
/// integers, text and opaque bytes become bulk strings, aggregates become
/// arrays.
pub(crate) fn typed_reply(value: StoreValue) -> RespValue {
    match value {
        StoreValue::Int(n) => RespValue::integer(n),
        StoreValue::Str(s) => RespValue::bulk_string(Bytes::from(s)),
        StoreValue::Bytes(b) => RespValue::bulk_string(b),
        StoreValue::List(items) => {
            RespValue::array(items.into_iter().map(typed_reply).collect())
        }
        StoreValue::Map(pairs) => RespValue::array(
            pairs
                .into_iter()
                .flat_map(|(k, v)| [typed_reply(k), typed_reply(v)])
                .collect(),
        ),
    }
}
