// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A schema-driven codec for the [Type Language] wire format.
//!
//! Rather than generating concrete types ahead of time, this library
//! loads `.tl` (or pre-parsed JSON) schemas at runtime and drives
//! (de)serialization of dynamic [`Value`]s from the loaded registry:
//!
//! ```
//! use tangram_tl::schema::{load_source, Origin, Registry, SchemaSource};
//! use tangram_tl::schema::Param;
//! use tangram_tl::{Record, Tl, Value};
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let mut registry = Registry::new();
//! load_source(
//!     &mut registry,
//!     &SchemaSource::Tl("inputPeerSelf#7da07ec9 = InputPeer;".into()),
//!     Origin::Api,
//! ).unwrap();
//! let tl = Tl::from_registry(registry);
//!
//! let bytes = tl
//!     .serialize(&Param::of_type("InputPeer"), &Record::new("inputPeerSelf").into(), -1)
//!     .await
//!     .unwrap();
//! assert_eq!(bytes, [0xc9, 0x7e, 0xa0, 0x7d]);
//! # }).unwrap();
//! ```
//!
//! Hooks ([`hooks::Callbacks`]) fire at precise points of the process,
//! and auto-default synthesis for a few well-known parameters may call
//! back into host-provided [`Synthesizers`]. Both are cooperative
//! suspension points: the serializer is async, and the deserializer
//! returns the futures hooks produced for the caller to await.
//!
//! [Type Language]: https://core.telegram.org/mtproto/TL

pub mod cursor;
mod deserializer;
pub mod errors;
pub mod gzip;
pub mod hooks;
pub mod jpeg;
pub mod primitives;
pub mod schema;
mod serializer;
pub mod value;

use std::sync::Arc;

use futures_util::future::BoxFuture;

pub use cursor::Cursor;
pub use deserializer::Deserialized;
use errors::Error;
use hooks::Callbacks;
use schema::{Registry, SchemaBundle};
pub use value::{Record, Value};

/// `vector#1cb5c415 {t:Type} # [ t ] = Vector t;`
#[allow(clippy::unreadable_literal)]
pub const VECTOR_ID: u32 = 0x1cb5c415;

/// `boolTrue#997275b5 = Bool;`
#[allow(clippy::unreadable_literal)]
pub const BOOL_TRUE_ID: u32 = 0x997275b5;

/// `boolFalse#bc799737 = Bool;`
#[allow(clippy::unreadable_literal)]
pub const BOOL_FALSE_ID: u32 = 0xbc799737;

/// `gzip_packed#3072cfa1 packed_data:string = Object;`
#[allow(clippy::unreadable_literal)]
pub const GZIP_PACKED_ID: u32 = 0x3072cfa1;

/// A collaborator that synthesizes the value of a missing parameter.
/// Receives the method name, the parameter name and the arguments
/// gathered so far.
pub type Synthesizer =
    Arc<dyn Fn(&str, &str, &Record) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;

/// The host collaborators the serializer delegates to when
/// synthesizing defaults it cannot produce by itself. Set once at
/// construction.
#[derive(Clone, Default)]
pub struct Synthesizers {
    /// Synthesizes an `InputFile` argument (file upload).
    pub input_file: Option<Synthesizer>,

    /// Synthesizes the `data` argument of secret-chat methods
    /// (message encryption).
    pub secret_data: Option<Synthesizer>,

    /// Synthesizes an `InputEncryptedChat` argument (chat info
    /// lookup).
    pub encrypted_chat: Option<Synthesizer>,
}

/// The session layer's table of in-flight queries, consulted while
/// decoding an `rpc_result` to recover the expected result type.
pub trait PendingQueries {
    /// The method name of the outgoing query with the given message
    /// identifier, if it is known.
    fn constructor(&self, msg_id: i64) -> Option<String>;

    /// The declared result type of that query, e.g. `Vector<User>`.
    fn result_type(&self, msg_id: i64) -> Option<String>;
}

/// The codec: schema registries, callbacks and collaborators.
///
/// The registries are effectively read-only after construction; the
/// callback registry is only ever replaced wholesale through
/// [`Tl::update_callbacks`].
pub struct Tl {
    registry: Registry,
    td_registry: Registry,
    callbacks: Callbacks,
    synthesizers: Synthesizers,
}

impl Tl {
    /// Loads a schema bundle and builds the codec over it.
    pub fn from_bundle(bundle: &dyn SchemaBundle) -> Result<Self, Error> {
        let (registry, td_registry) = schema::load_bundle(bundle)?;
        Ok(Self {
            registry,
            td_registry,
            callbacks: Callbacks::new(),
            synthesizers: Synthesizers::default(),
        })
    }

    /// Builds the codec over an already-loaded registry, with an empty
    /// td registry.
    pub fn from_registry(registry: Registry) -> Self {
        Self {
            registry,
            td_registry: Registry::new(),
            callbacks: Callbacks::new(),
            synthesizers: Synthesizers::default(),
        }
    }

    /// The shared registry (api, mtproto and secret origins).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The parallel registry for the td origin.
    pub fn td_registry(&self) -> &Registry {
        &self.td_registry
    }

    /// Replaces every hook category at once.
    pub fn update_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    /// Installs the host collaborators for auto-default synthesis.
    pub fn set_synthesizers(&mut self, synthesizers: Synthesizers) {
        self.synthesizers = synthesizers;
    }

    pub(crate) fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub(crate) fn synthesizers(&self) -> &Synthesizers {
        &self.synthesizers
    }
}
