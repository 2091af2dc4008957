// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use tokio::sync::oneshot;
use web_time::{SystemTime, UNIX_EPOCH};

use tangram_tl::Value;

use crate::errors::{ReplyError, RequestError};

/// Constructors that are not [content-related]: containers, envelopes,
/// acknowledgements and the session service messages. Everything else
/// increments the persistent sequence number when sent.
///
/// [content-related]: https://core.telegram.org/mtproto/description#content-related-message
pub const NOT_CONTENT_RELATED: [&str; 28] = [
    "rpc_result",
    "rpc_error",
    "rpc_drop_answer",
    "rpc_answer_unknown",
    "rpc_answer_dropped_running",
    "rpc_answer_dropped",
    "get_future_salts",
    "future_salt",
    "future_salts",
    "ping",
    "pong",
    "ping_delay_disconnect",
    "destroy_session",
    "destroy_session_ok",
    "destroy_session_none",
    "new_session_created",
    "msg_container",
    "msg_copy",
    "gzip_packed",
    "http_wait",
    "msgs_ack",
    "bad_msg_notification",
    "bad_server_salt",
    "msgs_state_req",
    "msgs_state_info",
    "msgs_all_info",
    "msg_detailed_info",
    "msg_new_detailed_info",
];

/// The message was put on the wire at least once.
pub const STATE_SENT: u8 = 1;
/// The server acknowledged receipt.
pub const STATE_ACKED: u8 = 2;
/// The server answered (which acknowledges implicitly).
pub const STATE_REPLIED: u8 = STATE_ACKED | 4;

/// The result a waiter receives once the message is replied to.
pub type RequestResult = Result<Value, RequestError>;

/// An outgoing MTProto message and its lifecycle state.
///
/// ```text
/// PENDING --try_send--> PENDING  (send signal ready, tries + 1)
/// PENDING --sent------> SENT     (fulfils the send signal, once)
/// SENT    --ack-------> ACKED
/// SENT    --reply-----> REPLIED  (ack implicit)
/// ACKED   --reply-----> REPLIED  (fulfils the result sink, once)
/// any     --reset_sent-> sent stamp cleared, caller resends
/// ```
///
/// The message is owned by the session layer's pending table; waiters
/// hold only the receiver half of the result sink.
pub struct OutgoingMessage {
    body: Option<Value>,
    serialized: Option<Vec<u8>>,

    constructor: String,
    ty: String,
    method: bool,
    unencrypted: bool,

    state: u8,
    msg_id: i64,
    tries: u32,
    sent: u64,

    pub user_related: bool,
    pub file_related: bool,
    pub bot_api: bool,
    pub refresh_references: bool,
    pub queue_id: Option<i64>,
    pub flood_wait_limit: Option<i32>,
    content_related: bool,

    send_tx: Option<oneshot::Sender<()>>,
    send_rx: Option<oneshot::Receiver<()>>,
    result_tx: Option<oneshot::Sender<RequestResult>>,
    result_rx: Option<oneshot::Receiver<RequestResult>>,
}

impl OutgoingMessage {
    /// Creates a message in the PENDING state.
    ///
    /// A result sink is allocated only for methods: constructors
    /// (service messages) have no waiter.
    pub fn new(
        constructor: impl Into<String>,
        ty: impl Into<String>,
        method: bool,
        body: Value,
    ) -> Self {
        let constructor = constructor.into();
        let content_related = !NOT_CONTENT_RELATED.contains(&constructor.as_str());
        let (result_tx, result_rx) = if method {
            let (tx, rx) = oneshot::channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        Self {
            body: Some(body),
            serialized: None,
            constructor,
            ty: ty.into(),
            method,
            unencrypted: false,
            state: 0,
            msg_id: 0,
            tries: 0,
            sent: 0,
            user_related: false,
            file_related: false,
            bot_api: false,
            refresh_references: false,
            queue_id: None,
            flood_wait_limit: None,
            content_related,
            send_tx: None,
            send_rx: None,
            result_tx,
            result_rx,
        }
    }

    /// Marks the message as a plain (unencrypted) one.
    pub fn unencrypted(mut self) -> Self {
        self.unencrypted = true;
        self
    }

    pub fn constructor(&self) -> &str {
        &self.constructor
    }

    /// The declared result type of the query, e.g. `Vector<User>`.
    pub fn result_type(&self) -> &str {
        &self.ty
    }

    pub fn is_method(&self) -> bool {
        self.method
    }

    pub fn is_unencrypted(&self) -> bool {
        self.unencrypted
    }

    pub fn is_content_related(&self) -> bool {
        self.content_related
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn serialized(&self) -> Option<&[u8]> {
        self.serialized.as_deref()
    }

    /// Caches the wire bytes of the body.
    pub fn set_serialized(&mut self, bytes: Vec<u8>) {
        self.serialized = Some(bytes);
    }

    pub fn msg_id(&self) -> i64 {
        self.msg_id
    }

    /// Stamps the wire message identifier the session layer assigned.
    pub fn set_msg_id(&mut self, msg_id: i64) {
        self.msg_id = msg_id;
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Unix time of the last send, or 0 if never sent.
    pub fn sent_at(&self) -> u64 {
        self.sent
    }

    pub fn was_sent(&self) -> bool {
        self.state & STATE_SENT != 0
    }

    pub fn is_acked(&self) -> bool {
        self.state & STATE_ACKED != 0
    }

    pub fn is_replied(&self) -> bool {
        self.state & (STATE_REPLIED & !STATE_ACKED) != 0
    }

    /// Prepares a send attempt: allocates the send signal if there is
    /// none yet and counts the try.
    pub fn try_send(&mut self) {
        if self.send_tx.is_none() && self.send_rx.is_none() && !self.was_sent() {
            let (tx, rx) = oneshot::channel();
            self.send_tx = Some(tx);
            self.send_rx = Some(rx);
        }
        self.tries += 1;
    }

    /// The receiver half of the send signal, for the caller that wants
    /// to know the message hit the wire. Available after `try_send`.
    pub fn take_send_signal(&mut self) -> Option<oneshot::Receiver<()>> {
        self.send_rx.take()
    }

    /// The receiver half of the result sink. Present exactly once, and
    /// only for methods.
    pub fn take_result(&mut self) -> Option<oneshot::Receiver<RequestResult>> {
        self.result_rx.take()
    }

    /// Records that the message was put on the wire, fulfilling the
    /// send signal exactly once.
    pub fn sent(&mut self) {
        self.state |= STATE_SENT;
        self.sent = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time is before epoch")
            .as_secs();
        if let Some(tx) = self.send_tx.take() {
            // The caller may have dropped its receiver; that is fine.
            let _ = tx.send(());
        }
    }

    /// Records a `msgs_ack` for this message.
    pub fn ack(&mut self) {
        self.state |= STATE_ACKED;
    }

    /// Clears the send stamp so the session layer resends.
    pub fn reset_sent(&mut self) {
        self.sent = 0;
    }

    /// Delivers the result (or error) to the waiter.
    ///
    /// Terminal: the body and its serialization are dropped, and the
    /// result sink fires exactly once. Delivery is deferred: the
    /// waiter's future wakes on the next scheduling turn, never
    /// re-entrantly inside the decoder. A second reply fails.
    pub fn reply(&mut self, result: RequestResult) -> Result<(), ReplyError> {
        if self.is_replied() {
            return Err(ReplyError::DoubleReply);
        }
        self.state |= STATE_REPLIED;
        self.body = None;
        self.serialized = None;
        if let Some(tx) = self.result_tx.take() {
            let _ = tx.send(result);
        }
        Ok(())
    }

    /// Whether the pending table may forget this message: it was
    /// replied to, or nobody is waiting on it.
    pub fn can_garbage_collect(&self) -> bool {
        self.is_replied() || !self.method
    }
}
