// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::collections::HashMap;

use tangram_tl::PendingQueries;

use crate::errors::ReplyError;
use crate::outgoing::{OutgoingMessage, RequestResult};

/// The session layer's table of in-flight messages, keyed by their
/// wire identifier.
///
/// The table is what the deserializer consults (through
/// [`PendingQueries`]) while decoding an `rpc_result`, to recover the
/// expected result type of the original request.
#[derive(Default)]
pub struct OutgoingQueries {
    pending: HashMap<i64, OutgoingMessage>,
}

impl OutgoingQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a message under the identifier the session assigned it.
    pub fn insert(&mut self, msg_id: i64, mut message: OutgoingMessage) {
        message.set_msg_id(msg_id);
        self.pending.insert(msg_id, message);
    }

    pub fn get(&self, msg_id: i64) -> Option<&OutgoingMessage> {
        self.pending.get(&msg_id)
    }

    pub fn get_mut(&mut self, msg_id: i64) -> Option<&mut OutgoingMessage> {
        self.pending.get_mut(&msg_id)
    }

    pub fn remove(&mut self, msg_id: i64) -> Option<OutgoingMessage> {
        self.pending.remove(&msg_id)
    }

    /// Delivers a reply to the tracked message and drops it from the
    /// table. Unknown identifiers are ignored: the server routinely
    /// re-sends answers the table no longer knows about.
    pub fn reply(&mut self, msg_id: i64, result: RequestResult) -> Result<(), ReplyError> {
        let Some(mut message) = self.pending.remove(&msg_id) else {
            log::info!("got reply for unknown message {:x}", msg_id);
            return Ok(());
        };
        message.reply(result)
    }

    /// Acknowledges the tracked message, if it is still tracked.
    pub fn ack(&mut self, msg_id: i64) {
        if let Some(message) = self.pending.get_mut(&msg_id) {
            message.ack();
        }
    }

    /// Drops every message nobody will ever look at again.
    pub fn collect_garbage(&mut self) {
        self.pending
            .retain(|_, message| !message.can_garbage_collect());
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &OutgoingMessage)> {
        self.pending.iter().map(|(&msg_id, message)| (msg_id, message))
    }
}

impl PendingQueries for OutgoingQueries {
    fn constructor(&self, msg_id: i64) -> Option<String> {
        self.pending
            .get(&msg_id)
            .map(|message| message.constructor().to_owned())
    }

    fn result_type(&self, msg_id: i64) -> Option<String> {
        self.pending
            .get(&msg_id)
            .map(|message| message.result_type().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangram_tl::{Record, Value};

    fn query(constructor: &str, ty: &str) -> OutgoingMessage {
        OutgoingMessage::new(constructor, ty, true, Value::Record(Record::new(constructor)))
    }

    #[test]
    fn check_lookup_for_deserializer() {
        let mut table = OutgoingQueries::new();
        table.insert(7, query("users.getUsers", "Vector<User>"));

        let queries: &dyn PendingQueries = &table;
        assert_eq!(queries.constructor(7).as_deref(), Some("users.getUsers"));
        assert_eq!(queries.result_type(7).as_deref(), Some("Vector<User>"));
        assert_eq!(queries.constructor(8), None);
        assert_eq!(table.get(7).unwrap().msg_id(), 7);
    }

    #[tokio::test]
    async fn check_reply_routing() {
        let mut table = OutgoingQueries::new();
        let mut message = query("ping", "Pong");
        let result = message.take_result().unwrap();
        table.insert(3, message);

        table.reply(3, Ok(Value::Bool(true))).unwrap();
        assert!(table.is_empty());
        assert_eq!(result.await.unwrap(), Ok(Value::Bool(true)));

        // Late duplicates are tolerated.
        table.reply(3, Ok(Value::Bool(true))).unwrap();
    }

    #[test]
    fn check_garbage_collection() {
        let mut table = OutgoingQueries::new();
        table.insert(
            1,
            OutgoingMessage::new("msgs_ack", "MsgsAck", false, Value::Null),
        );
        table.insert(2, query("ping", "Pong"));

        table.collect_garbage();
        assert!(table.get(1).is_none());
        assert!(table.get(2).is_some());
        assert_eq!(table.len(), 1);
    }
}
