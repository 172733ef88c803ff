//! Per-Connection Read Loop and Session State
//!
//! Each accepted socket gets one read loop (this module) and one flush
//! loop ([`super::reply`]). The read loop parses frames, decides the
//! reply order by reserving slots, and spawns an executor task per
//! command. Slow store calls therefore never stall parsing, while the
//! flush loop keeps the wire in submission order.
//!
//! Transaction state lives here as well: MULTI opens a queue on the
//! session, later commands accumulate after a queue-time arity check,
//! and EXEC runs the block back to back on a single reply slot. The
//! session only intercepts the valid transitions; invalid ones (EXEC
//! with no open block, nested MULTI) fall through to the command
//! handler, which owns those error replies.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::task::JoinError;
use tracing::{debug, info, trace, warn};

use super::reply::{flush_loop, ReplyQueue};
use super::ConnectionError;
use crate::commands::registry;
use crate::commands::{CommandError, CommandHandler, CommandKind, RequestCommand};
use crate::protocol::{RequestParser, RespValue};

/// Initial capacity of the per-connection read buffer.
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Counters for a single client connection.
///
/// Snapshotted into the disconnect log line, so per-client work is
/// visible without raising the log level for every command.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub commands_dispatched: AtomicU64,
    pub replies_flushed: AtomicU64,
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_dispatched(&self) {
        self.commands_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reply_flushed(&self, bytes: usize) {
        self.replies_flushed.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Commands queued inside an open MULTI block.
#[derive(Default)]
struct Transaction {
    queued: Vec<RequestCommand>,
    aborted: bool,
}

/// Per-connection dispatch state: the shared command handler, the reply
/// queue, and any open transaction.
struct Session {
    handler: CommandHandler,
    queue: ReplyQueue,
    txn: Option<Transaction>,
}

impl Session {
    fn new(handler: CommandHandler, queue: ReplyQueue) -> Self {
        Self {
            handler,
            queue,
            txn: None,
        }
    }

    /// Routes one decoded frame.
    ///
    /// Runs synchronously on the read loop so that slot reservation (and
    /// with it the reply order) matches the order frames arrived in.
    fn dispatch(&mut self, frame: Vec<Bytes>) -> Result<(), ConnectionError> {
        let cmd = match RequestCommand::parse(frame) {
            Ok(cmd) => cmd,
            Err(err) => {
                // An unrecognized command poisons an open transaction.
                if let Some(txn) = self.txn.as_mut() {
                    txn.aborted = true;
                }
                return self.queue.push_ready(err.into_reply());
            }
        };

        if cmd.kind.is_transaction_verb() {
            return self.control(cmd);
        }

        if let Some(txn) = self.txn.as_mut() {
            // Arity problems surface at queue time and abort the block.
            let spec = registry::spec(cmd.kind);
            if !spec.arity.accepts(cmd.arg_count()) {
                txn.aborted = true;
                let err = CommandError::WrongArity {
                    name: spec.name,
                    given: cmd.arg_count(),
                };
                return self.queue.push_ready(err.into_reply());
            }

            txn.queued.push(cmd);
            return self.queue.push_ready(RespValue::queued());
        }

        self.spawn(cmd)
    }

    /// Handles MULTI, EXEC and DISCARD against the transaction state.
    fn control(&mut self, cmd: RequestCommand) -> Result<(), ConnectionError> {
        let spec = registry::spec(cmd.kind);
        if !spec.arity.accepts(cmd.arg_count()) {
            let err = CommandError::WrongArity {
                name: spec.name,
                given: cmd.arg_count(),
            };
            return self.queue.push_ready(err.into_reply());
        }

        match cmd.kind {
            CommandKind::Multi if self.txn.is_none() => {
                self.txn = Some(Transaction::default());
                self.queue.push_ready(RespValue::ok())
            }
            CommandKind::Exec => match self.txn.take() {
                Some(txn) if txn.aborted => self.queue.push_ready(RespValue::error(
                    "EXECABORT Transaction discarded because of previous errors.",
                )),
                Some(txn) => self.run_block(txn),
                None => self.spawn(cmd),
            },
            CommandKind::Discard => match self.txn.take() {
                Some(_) => self.queue.push_ready(RespValue::ok()),
                None => self.spawn(cmd),
            },
            // Nested MULTI; the handler owns the error reply.
            _ => self.spawn(cmd),
        }
    }

    /// Reserves the next reply slot and runs the command on its own task.
    fn spawn(&self, cmd: RequestCommand) -> Result<(), ConnectionError> {
        let slot = self.queue.reserve()?;
        let handler = self.handler.clone();
        tokio::spawn(async move {
            slot.resolve(handler.execute(cmd).await);
        });
        Ok(())
    }

    /// Runs a queued block back to back on one task and resolves a single
    /// slot with the collected replies.
    fn run_block(&self, txn: Transaction) -> Result<(), ConnectionError> {
        let slot = self.queue.reserve()?;
        let handler = self.handler.clone();
        tokio::spawn(async move {
            let mut replies = Vec::with_capacity(txn.queued.len());
            for cmd in txn.queued {
                replies.push(handler.execute(cmd).await);
            }
            slot.resolve(RespValue::array(replies));
        });
        Ok(())
    }
}

/// Reads frames from the socket and feeds them to the session until the
/// client disconnects or a protocol error ends the stream.
async fn read_loop(
    mut reader: OwnedReadHalf,
    addr: SocketAddr,
    mut session: Session,
    stats: Arc<ConnectionStats>,
) -> Result<(), ConnectionError> {
    let parser = RequestParser::new();
    let mut buffer = BytesMut::with_capacity(INITIAL_BUFFER_SIZE);

    loop {
        loop {
            let (args, consumed) = match parser.parse(&buffer) {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    // Tell the client what was wrong, then drop the stream.
                    warn!(client = %addr, error = %err, "Protocol error");
                    let report = RespValue::error(format!("ERR Protocol error: {err}"));
                    let _ = session.queue.push_ready(report);
                    return Err(ConnectionError::ParseError(err));
                }
            };

            buffer.advance(consumed);
            trace!(client = %addr, consumed, remaining = buffer.len(), "Parsed frame");

            // Blank inline lines decode to zero arguments; skip them.
            if args.is_empty() {
                continue;
            }

            stats.command_dispatched();
            session.dispatch(args)?;
        }

        // Need more data before the next frame can complete.
        if buffer.capacity() - buffer.len() < 1024 {
            buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = reader.read_buf(&mut buffer).await?;
        if n == 0 {
            if !buffer.is_empty() {
                debug!(
                    client = %addr,
                    buffered = buffer.len(),
                    "Client left a partial frame behind"
                );
            }
            return Ok(());
        }

        stats.bytes_read(n);
        trace!(client = %addr, bytes = n, "Read data");
    }
}

fn flatten(joined: Result<Result<(), ConnectionError>, JoinError>) -> Result<(), ConnectionError> {
    match joined {
        Ok(result) => result,
        Err(_) => Err(ConnectionError::WriterTask),
    }
}

/// Drives one client connection to completion.
///
/// Splits the socket, spawns the flush loop, and runs the read loop on
/// the current task. When the read side finishes first the flusher is
/// allowed to drain what is still in flight; when the flusher dies first
/// the read loop is cancelled with it.
pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, handler: CommandHandler) {
    let stats = Arc::new(ConnectionStats::new());
    let (reader, writer) = stream.into_split();
    let (queue, slots) = ReplyQueue::new();

    let mut flusher = tokio::spawn(flush_loop(slots, writer, Arc::clone(&stats)));
    let session = Session::new(handler, queue);

    info!(client = %addr, "Client connected");

    let result = tokio::select! {
        read = read_loop(reader, addr, session, Arc::clone(&stats)) => {
            // The session, and with it the queue, is gone; the flusher
            // drains the outstanding slots and exits on its own.
            let flushed = flatten((&mut flusher).await);
            read.and(flushed)
        }
        flushed = &mut flusher => flatten(flushed),
    };

    match &result {
        Ok(()) => debug!(client = %addr, "Stream ended"),
        Err(ConnectionError::IoError(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => {
            debug!(client = %addr, "Connection reset by client")
        }
        Err(e) => warn!(client = %addr, error = %e, "Connection error"),
    }

    info!(
        client = %addr,
        commands = stats.commands_dispatched.load(Ordering::Relaxed),
        replies = stats.replies_flushed.load(Ordering::Relaxed),
        bytes_in = stats.bytes_read.load(Ordering::Relaxed),
        bytes_out = stats.bytes_written.load(Ordering::Relaxed),
        "Client disconnected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::commands::Keyspace;
    use crate::store::{
        Bin, Key, MemoryStore, Operation, Record, StoreDriver, StoreError, WritePolicy,
    };

    async fn start_server(driver: Arc<dyn StoreDriver>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler = CommandHandler::new(driver, Keyspace::default());

        tokio::spawn(async move {
            while let Ok((stream, client_addr)) = listener.accept().await {
                tokio::spawn(handle_connection(stream, client_addr, handler.clone()));
            }
        });

        addr
    }

    async fn connect(addr: SocketAddr) -> TcpStream {
        TcpStream::connect(addr).await.unwrap()
    }

    /// RESP multibulk encoding of one command.
    fn encode(parts: &[&[u8]]) -> Vec<u8> {
        let mut out = format!("*{}\r\n", parts.len()).into_bytes();
        for part in parts {
            out.extend_from_slice(format!("${}\r\n", part.len()).as_bytes());
            out.extend_from_slice(part);
            out.extend_from_slice(b"\r\n");
        }
        out
    }

    /// Reads exactly the expected bytes off the wire.
    async fn expect(client: &mut TcpStream, expected: &[u8]) {
        let mut buf = vec![0u8; expected.len()];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(
            buf,
            expected,
            "got: {}",
            String::from_utf8_lossy(&buf)
        );
    }

    /// Slows the write path down so a later command can finish first.
    struct DelayedDriver {
        inner: MemoryStore,
    }

    #[async_trait]
    impl StoreDriver for DelayedDriver {
        async fn put(&self, policy: &WritePolicy, key: &Key, bin: Bin) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_millis(80)).await;
            self.inner.put(policy, key, bin).await
        }

        async fn get(&self, key: &Key) -> Result<Option<Record>, StoreError> {
            self.inner.get(key).await
        }

        async fn operate(
            &self,
            policy: &WritePolicy,
            key: &Key,
            op: Operation,
        ) -> Result<Option<Record>, StoreError> {
            self.inner.operate(policy, key, op).await
        }
    }

    /// Kills the executor task mid-command to strand its reply slot.
    struct PanickyDriver;

    #[async_trait]
    impl StoreDriver for PanickyDriver {
        async fn put(&self, _: &WritePolicy, _: &Key, _: Bin) -> Result<(), StoreError> {
            panic!("write refused");
        }

        async fn get(&self, _: &Key) -> Result<Option<Record>, StoreError> {
            Ok(None)
        }

        async fn operate(
            &self,
            _: &WritePolicy,
            _: &Key,
            _: Operation,
        ) -> Result<Option<Record>, StoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        expect(&mut client, b"+PONG\r\n").await;
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client
            .write_all(&encode(&[b"SET", b"name", b"relay"]))
            .await
            .unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client.write_all(&encode(&[b"GET", b"name"])).await.unwrap();
        expect(&mut client, b"$5\r\nrelay\r\n").await;
    }

    #[tokio::test]
    async fn test_inline_command() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(b"ECHO hello\r\n").await.unwrap();
        expect(&mut client, b"$5\r\nhello\r\n").await;
    }

    #[tokio::test]
    async fn test_set_nx_conflict_returns_null() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client
            .write_all(&encode(&[b"SET", b"lock", b"a"]))
            .await
            .unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client
            .write_all(&encode(&[b"SET", b"lock", b"b", b"NX"]))
            .await
            .unwrap();
        expect(&mut client, b"$-1\r\n").await;
    }

    #[tokio::test]
    async fn test_setex_zero_rejected() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client
            .write_all(&encode(&[b"SETEX", b"k", b"0", b"v"]))
            .await
            .unwrap();
        expect(&mut client, b"-ERR invalid expire time in 'setex'\r\n").await;
    }

    #[tokio::test]
    async fn test_pipelined_replies_keep_submission_order() {
        let addr = start_server(Arc::new(DelayedDriver {
            inner: MemoryStore::new(),
        }))
        .await;
        let mut client = connect(addr).await;

        // SETNX goes through the slowed write path, HINCRBY through the
        // fast operate path; the wire order must not change.
        let mut batch = encode(&[b"SETNX", b"slow", b"v"]);
        batch.extend_from_slice(&encode(&[b"HINCRBY", b"h", b"f", b"5"]));
        client.write_all(&batch).await.unwrap();

        expect(&mut client, b":1\r\n:5\r\n").await;
    }

    #[tokio::test]
    async fn test_multi_exec_runs_queued_commands() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(&encode(&[b"MULTI"])).await.unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client
            .write_all(&encode(&[b"SET", b"k", b"v"]))
            .await
            .unwrap();
        expect(&mut client, b"+QUEUED\r\n").await;

        client
            .write_all(&encode(&[b"INCR", b"count"]))
            .await
            .unwrap();
        expect(&mut client, b"+QUEUED\r\n").await;

        client.write_all(&encode(&[b"EXEC"])).await.unwrap();
        expect(&mut client, b"*2\r\n+OK\r\n:1\r\n").await;

        // The writes are visible after the block commits.
        client.write_all(&encode(&[b"GET", b"k"])).await.unwrap();
        expect(&mut client, b"$1\r\nv\r\n").await;
    }

    #[tokio::test]
    async fn test_exec_and_discard_without_multi() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(&encode(&[b"EXEC"])).await.unwrap();
        expect(&mut client, b"-ERR EXEC without MULTI\r\n").await;

        client.write_all(&encode(&[b"DISCARD"])).await.unwrap();
        expect(&mut client, b"-ERR DISCARD without MULTI\r\n").await;
    }

    #[tokio::test]
    async fn test_nested_multi_rejected() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(&encode(&[b"MULTI"])).await.unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client.write_all(&encode(&[b"MULTI"])).await.unwrap();
        expect(&mut client, b"-ERR MULTI calls can not be nested\r\n").await;

        client.write_all(&encode(&[b"DISCARD"])).await.unwrap();
        expect(&mut client, b"+OK\r\n").await;
    }

    #[tokio::test]
    async fn test_unknown_command_aborts_transaction() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(&encode(&[b"MULTI"])).await.unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client
            .write_all(&encode(&[b"SET", b"k", b"v"]))
            .await
            .unwrap();
        expect(&mut client, b"+QUEUED\r\n").await;

        client.write_all(&encode(&[b"BOGUS"])).await.unwrap();
        expect(&mut client, b"-ERR unknown command 'BOGUS'\r\n").await;

        client.write_all(&encode(&[b"EXEC"])).await.unwrap();
        expect(
            &mut client,
            b"-EXECABORT Transaction discarded because of previous errors.\r\n",
        )
        .await;

        // The queued SET never ran.
        client.write_all(&encode(&[b"GET", b"k"])).await.unwrap();
        expect(&mut client, b"$-1\r\n").await;
    }

    #[tokio::test]
    async fn test_queue_time_arity_error_aborts_transaction() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(&encode(&[b"MULTI"])).await.unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client.write_all(&encode(&[b"GET"])).await.unwrap();
        expect(
            &mut client,
            b"-ERR wrong number of arguments for 'get' command (given 1)\r\n",
        )
        .await;

        client.write_all(&encode(&[b"EXEC"])).await.unwrap();
        expect(
            &mut client,
            b"-EXECABORT Transaction discarded because of previous errors.\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_discard_drops_queued_commands() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(&encode(&[b"MULTI"])).await.unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client
            .write_all(&encode(&[b"SET", b"k", b"v"]))
            .await
            .unwrap();
        expect(&mut client, b"+QUEUED\r\n").await;

        client.write_all(&encode(&[b"DISCARD"])).await.unwrap();
        expect(&mut client, b"+OK\r\n").await;

        client.write_all(&encode(&[b"GET", b"k"])).await.unwrap();
        expect(&mut client, b"$-1\r\n").await;
    }

    #[tokio::test]
    async fn test_protocol_error_reported_before_close() {
        let addr = start_server(Arc::new(MemoryStore::new())).await;
        let mut client = connect(addr).await;

        client.write_all(b"*-5\r\n").await.unwrap();

        let mut data = Vec::new();
        client.read_to_end(&mut data).await.unwrap();
        assert_eq!(
            data,
            b"-ERR Protocol error: invalid multibulk length: -5\r\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_dropped_reply_closes_connection() {
        let addr = start_server(Arc::new(PanickyDriver)).await;
        let mut client = connect(addr).await;

        client
            .write_all(&encode(&[b"SET", b"k", b"v"]))
            .await
            .unwrap();

        // The executor died without resolving its slot; the server gives
        // up on the stream rather than reply out of order.
        let n = client.read(&mut [0u8; 16]).await.unwrap();
        assert_eq!(n, 0);
    }
}
