// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Named hooks the codec fires at precise points.
//!
//! Hooks run synchronously; a hook that needs to do deferred work
//! returns a future, which the codec accumulates and hands back to
//! the caller to await once the main parse or emit completes.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::errors::Error;
use crate::value::Value;

/// Deferred work returned by a hook.
pub type HookFuture = BoxFuture<'static, Result<(), Error>>;

/// Fired around decoding a constructor; may mutate the value in place
/// and may return a future for deferred work.
pub type DecodeHook = Arc<dyn Fn(&mut Value) -> Option<HookFuture> + Send + Sync>;

/// Fired when an `rpc_result` for a known method is dispatched, before
/// its result is read. Receives the originating message identifier.
pub type DispatchHook = Arc<dyn Fn(i64) -> Option<HookFuture> + Send + Sync>;

/// Fired once an `rpc_result` for a known method is fully decoded.
/// Receives the originating message identifier and the decoded result.
pub type MethodHook = Arc<dyn Fn(i64, &mut Value) -> Option<HookFuture> + Send + Sync>;

/// Replaces a value right before it is serialized. May await.
pub type SerializeHook =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;

/// Coerces a value that does not carry the type the serializer
/// expects. Receives the expected type name and the value. May await.
pub type MismatchHook =
    Arc<dyn Fn(&str, Value) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;

/// The callback registry: hooks indexed by predicate or method name.
///
/// `type_mismatch` and `constructor_serialize` hold a single hook per
/// name (the last writer wins); the remaining categories accumulate,
/// and fire newest-first. The registry is replaced wholesale through
/// [`crate::Tl::update_callbacks`], never mutated piecemeal.
#[derive(Clone, Default)]
pub struct Callbacks {
    constructor_before: HashMap<String, Vec<DecodeHook>>,
    constructor: HashMap<String, Vec<DecodeHook>>,
    constructor_serialize: HashMap<String, SerializeHook>,
    method_before: HashMap<String, Vec<DispatchHook>>,
    method: HashMap<String, Vec<MethodHook>>,
    type_mismatch: HashMap<String, MismatchHook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook fired after reading a constructor id and
    /// before reading its fields.
    pub fn on_constructor_before(&mut self, predicate: impl Into<String>, hook: DecodeHook) {
        self.constructor_before
            .entry(predicate.into())
            .or_default()
            .push(hook);
    }

    /// Registers a hook fired after a constructor is fully decoded.
    pub fn on_constructor(&mut self, predicate: impl Into<String>, hook: DecodeHook) {
        self.constructor.entry(predicate.into()).or_default().push(hook);
    }

    /// Registers the serialization replacement for a predicate.
    pub fn on_constructor_serialize(&mut self, predicate: impl Into<String>, hook: SerializeHook) {
        self.constructor_serialize.insert(predicate.into(), hook);
    }

    /// Registers a hook fired when an `rpc_result` for the given
    /// method is dispatched.
    pub fn on_method_before(&mut self, method: impl Into<String>, hook: DispatchHook) {
        self.method_before.entry(method.into()).or_default().push(hook);
    }

    /// Registers a hook fired once an `rpc_result` for the given
    /// method is decoded.
    pub fn on_method(&mut self, method: impl Into<String>, hook: MethodHook) {
        self.method.entry(method.into()).or_default().push(hook);
    }

    /// Registers the coercion for values that miss the expected type.
    pub fn on_type_mismatch(&mut self, ty: impl Into<String>, hook: MismatchHook) {
        self.type_mismatch.insert(ty.into(), hook);
    }

    pub(crate) fn constructor_before(&self, predicate: &str) -> impl Iterator<Item = &DecodeHook> {
        self.constructor_before
            .get(predicate)
            .into_iter()
            .flat_map(|hooks| hooks.iter().rev())
    }

    pub(crate) fn constructor(&self, predicate: &str) -> impl Iterator<Item = &DecodeHook> {
        self.constructor
            .get(predicate)
            .into_iter()
            .flat_map(|hooks| hooks.iter().rev())
    }

    pub(crate) fn constructor_serialize(&self, predicate: &str) -> Option<&SerializeHook> {
        self.constructor_serialize.get(predicate)
    }

    pub(crate) fn method_before(&self, method: &str) -> impl Iterator<Item = &DispatchHook> {
        self.method_before
            .get(method)
            .into_iter()
            .flat_map(|hooks| hooks.iter().rev())
    }

    pub(crate) fn method(&self, method: &str) -> impl Iterator<Item = &MethodHook> {
        self.method
            .get(method)
            .into_iter()
            .flat_map(|hooks| hooks.iter().rev())
    }

    pub(crate) fn type_mismatch(&self, ty: &str) -> Option<&MismatchHook> {
        self.type_mismatch.get(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fire_newest_first() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = Callbacks::new();
        for tag in ["old", "new"] {
            let order = Arc::clone(&order);
            callbacks.on_constructor(
                "config",
                Arc::new(move |_value| {
                    order.lock().unwrap().push(tag);
                    None
                }),
            );
        }

        let mut value = Value::Null;
        for hook in callbacks.constructor("config") {
            hook(&mut value);
        }
        assert_eq!(*order.lock().unwrap(), ["new", "old"]);
    }

    #[test]
    fn last_writer_wins() {
        let mut callbacks = Callbacks::new();
        callbacks.on_type_mismatch(
            "InputPeer",
            Arc::new(|_, value| Box::pin(async move { Ok(value) })),
        );
        callbacks.on_type_mismatch(
            "InputPeer",
            Arc::new(|_, _| Box::pin(async move { Err(Error::NotNumeric) })),
        );
        assert!(callbacks.type_mismatch("InputPeer").is_some());
        assert!(callbacks.type_mismatch("InputUser").is_none());
        // Only the second hook survives.
        let hook = callbacks.type_mismatch("InputPeer").unwrap().clone();
        let result = futures_util::FutureExt::now_or_never(hook("InputPeer", Value::Null));
        assert_eq!(result, Some(Err(Error::NotNumeric)));
    }
}
