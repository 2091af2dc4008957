// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors that can occur while driving outgoing messages.

use std::fmt;

use tangram_tl::Value;

/// This error occurs when a Remote Procedure Call was unsuccessful.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestError {
    /// Telegram answered the query with an `rpc_error`.
    Rpc(Value),

    /// The query was cancelled before an answer arrived.
    Cancelled,

    /// The connection carrying the query went away, and nobody will
    /// answer it anymore.
    Dropped,
}

impl std::error::Error for RequestError {}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc(error) => write!(f, "request error: {:?}", error),
            Self::Cancelled => write!(f, "request cancelled"),
            Self::Dropped => write!(f, "request dropped"),
        }
    }
}

/// The error type for lifecycle transitions of an outgoing message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReplyError {
    /// The message was already replied to; its result sink fired and
    /// cannot fire again.
    DoubleReply,
}

impl std::error::Error for ReplyError {}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleReply => write!(f, "message already replied to"),
        }
    }
}
