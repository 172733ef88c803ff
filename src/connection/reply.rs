//! Ordered Reply Delivery
//!
//! Pipelined clients may have many commands in flight at once, and the
//! store can finish them in any order. RESP still requires replies in
//! submission order. The read loop reserves one [`ReplySlot`] per parsed
//! command, executor tasks resolve their slot whenever they finish, and
//! the flush loop awaits slots strictly in reservation order before
//! writing each encoded reply to the socket.
//!
//! ```text
//! read loop ──reserve()──> [slot 1] [slot 2] [slot 3]   (mpsc, FIFO)
//!                             ▲        ▲        ▲
//! executors ──resolve()───────┴────────┴────────┘       (oneshot, any order)
//!
//! flush loop: await slot 1, write; await slot 2, write; ...
//! ```

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use super::handler::ConnectionStats;
use super::ConnectionError;
use crate::protocol::RespValue;

/// Receiving end of the reply queue, drained by [`flush_loop`].
pub type SlotReceiver = mpsc::UnboundedReceiver<oneshot::Receiver<RespValue>>;

/// A reserved position in one connection's reply stream.
///
/// Resolving hands the reply to the flush loop; the slot itself says
/// nothing about when the bytes reach the socket.
pub struct ReplySlot {
    tx: oneshot::Sender<RespValue>,
}

impl ReplySlot {
    /// Completes the slot with a reply.
    ///
    /// If the connection is already gone the flush loop has dropped its
    /// receiver, and late completion is a no-op.
    pub fn resolve(self, reply: RespValue) {
        let _ = self.tx.send(reply);
    }
}

/// Submission-ordered queue of pending replies for one connection.
pub struct ReplyQueue {
    slots: mpsc::UnboundedSender<oneshot::Receiver<RespValue>>,
}

impl ReplyQueue {
    /// Creates a queue plus the receiver the flush loop drains.
    pub fn new() -> (Self, SlotReceiver) {
        let (slots, receiver) = mpsc::unbounded_channel();
        (Self { slots }, receiver)
    }

    /// Reserves the next position in the reply stream.
    pub fn reserve(&self) -> Result<ReplySlot, ConnectionError> {
        let (tx, rx) = oneshot::channel();
        self.slots
            .send(rx)
            .map_err(|_| ConnectionError::WriterGone)?;
        Ok(ReplySlot { tx })
    }

    /// Reserves a slot and resolves it in one step.
    ///
    /// Used for replies the read loop produces itself, such as `+QUEUED`
    /// during a transaction or protocol error reports.
    pub fn push_ready(&self, reply: RespValue) -> Result<(), ConnectionError> {
        self.reserve().map(|slot| slot.resolve(reply))
    }
}

/// Drains reply slots in reservation order and writes them to the socket.
///
/// Returns `Ok` once the queue side is dropped and every outstanding slot
/// has been flushed. A slot whose sender vanished without resolving means
/// a command task died; the stream can no longer stay aligned with
/// submissions, so the loop bails out and the connection closes.
pub async fn flush_loop(
    mut slots: SlotReceiver,
    mut writer: OwnedWriteHalf,
    stats: Arc<ConnectionStats>,
) -> Result<(), ConnectionError> {
    let mut buf = Vec::with_capacity(1024);

    while let Some(slot) = slots.recv().await {
        let reply = slot.await.map_err(|_| ConnectionError::ReplyDropped)?;

        buf.clear();
        reply.serialize_into(&mut buf);
        writer.write_all(&buf).await?;

        stats.reply_flushed(buf.len());
        trace!(bytes = buf.len(), "Flushed reply");
    }

    Ok(())
}
