// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The schema-driven deserializer.
//!
//! Parsing is synchronous and propagates immediately on a malformed
//! stream. Hooks fire synchronously as values complete; any deferred
//! work they produce is accumulated and returned for the caller to
//! await after the main parse.

use crate::cursor::Cursor;
use crate::errors::Error;
use crate::hooks::HookFuture;
use crate::primitives::{read_blob, read_bytes, read_f64, read_i32, read_i64, read_u32};
use crate::schema::{Entry, Param};
use crate::value::{Record, Value};
use crate::{gzip, jpeg, PendingQueries, Tl};
use crate::{BOOL_FALSE_ID, BOOL_TRUE_ID, GZIP_PACKED_ID, VECTOR_ID};

/// `long` fields that transport opaque identifiers rather than
/// numbers; they are kept as their raw 8 wire bytes.
const RAW_LONG_FIELDS: [&str; 11] = [
    "msg_id",
    "req_msg_id",
    "answer_msg_id",
    "bad_msg_id",
    "first_msg_id",
    "server_salt",
    "new_server_salt",
    "salt",
    "ping_id",
    "exchange_id",
    "key_fingerprint",
];

/// Fields declared `bytes` whose payload is known to be text.
const FORCED_STRING_FIELDS: [&str; 4] = ["peer_tag", "file_token", "cdn_key", "cdn_iv"];

/// The outcome of a deserialization: the decoded value plus whatever
/// deferred work the hooks produced, for the caller to await.
pub struct Deserialized {
    pub value: Value,
    pub hooks: Vec<HookFuture>,
}

impl Tl {
    /// Deserializes a value of the expected type from the cursor.
    ///
    /// `queries` is consulted while decoding `rpc_result` to recover
    /// the expected result type of the original request.
    pub fn deserialize(
        &self,
        cursor: &mut Cursor,
        ctx: &Param,
        queries: Option<&dyn PendingQueries>,
    ) -> Result<Deserialized, Error> {
        let mut reader = Reader {
            tl: self,
            queries,
            hooks: Vec::new(),
            quiet: false,
            inflate_budget: 64 * cursor.remaining() + 1024,
        };
        let value = reader.read(cursor, ctx)?;
        Ok(Deserialized {
            value,
            hooks: reader.hooks,
        })
    }

    /// Convenience wrapper over [`Tl::deserialize`] for a byte slice.
    pub fn deserialize_slice(
        &self,
        buf: &[u8],
        ctx: &Param,
        queries: Option<&dyn PendingQueries>,
    ) -> Result<Deserialized, Error> {
        self.deserialize(&mut Cursor::from_slice(buf), ctx, queries)
    }

    /// Parses a value of the expected type without surfacing it, and
    /// returns how many bytes it occupies. No hooks fire.
    pub fn measure(&self, buf: &[u8], ctx: &Param) -> Result<usize, Error> {
        let mut cursor = Cursor::from_slice(buf);
        let mut reader = Reader {
            tl: self,
            queries: None,
            hooks: Vec::new(),
            quiet: true,
            inflate_budget: 64 * buf.len() + 1024,
        };
        reader.read(&mut cursor, ctx)?;
        Ok(cursor.pos())
    }
}

struct Reader<'a> {
    tl: &'a Tl,
    queries: Option<&'a dyn PendingQueries>,
    hooks: Vec<HookFuture>,
    quiet: bool,

    /// Total bytes `gzip_packed` envelopes may inflate to, derived
    /// from the input length. Nested envelopes spend the same budget,
    /// which bounds pathological streams.
    inflate_budget: usize,
}

impl Reader<'_> {
    fn read(&mut self, cursor: &mut Cursor, ctx: &Param) -> Result<Value, Error> {
        match ctx.ty.as_str() {
            "int" | "#" => Ok(Value::Int(read_i32(cursor)?)),
            "long" => {
                if RAW_LONG_FIELDS.contains(&ctx.name.as_str()) {
                    Ok(Value::Bytes(read_blob(cursor, 8)?))
                } else {
                    Ok(Value::Long(read_i64(cursor)?))
                }
            }
            "double" => Ok(Value::Double(read_f64(cursor)?)),
            "int128" => Ok(Value::Bytes(read_blob(cursor, 16)?)),
            "int256" => Ok(Value::Bytes(read_blob(cursor, 32)?)),
            "int512" => Ok(Value::Bytes(read_blob(cursor, 64)?)),
            "string" => Ok(Value::String(
                String::from_utf8_lossy(&read_bytes(cursor)?).into_owned(),
            )),
            "bytes" => {
                let data = read_bytes(cursor)?;
                if FORCED_STRING_FIELDS.contains(&ctx.name.as_str()) {
                    Ok(Value::String(String::from_utf8_lossy(&data).into_owned()))
                } else {
                    Ok(Value::Bytes(data))
                }
            }
            "true" => Ok(Value::Bool(true)),
            "Bool" => match read_u32(cursor)? {
                BOOL_TRUE_ID => Ok(Value::Bool(true)),
                BOOL_FALSE_ID => Ok(Value::Bool(false)),
                id => Err(Error::UnknownConstructor { id }),
            },
            "Vector t" => {
                let id = read_u32(cursor)?;
                match id {
                    // The envelope stands in for the whole boxed value,
                    // so the expected type still applies inside. With
                    // discovery instead, bare elements (ints, longs)
                    // would be undecodable.
                    GZIP_PACKED_ID => self.read_unpacked(cursor, ctx),
                    VECTOR_ID => self.read_vector_items(cursor, ctx),
                    id => Err(Error::InvalidVectorConstructor { id }),
                }
            }
            "vector t" => self.read_vector_items(cursor, ctx),
            _ => self.read_composite(cursor, ctx),
        }
    }

    /// Decompresses a `gzip_packed` payload (the envelope id has been
    /// consumed) and re-enters on the inflated bytes.
    fn read_unpacked(&mut self, cursor: &mut Cursor, ctx: &Param) -> Result<Value, Error> {
        let packed = read_bytes(cursor)?;
        let data = gzip::decompress(&packed)?;
        self.inflate_budget = self
            .inflate_budget
            .checked_sub(data.len())
            .ok_or(Error::DecompressionFailed)?;
        let mut inner = Cursor::from_slice(&data);
        self.read(&mut inner, ctx)
    }

    fn read_vector_items(&mut self, cursor: &mut Cursor, ctx: &Param) -> Result<Value, Error> {
        let len = read_u32(cursor)? as usize;
        // Every element costs at least one wire byte; a length beyond
        // the remaining buffer cannot be honest.
        if len > cursor.remaining() {
            return Err(Error::UnexpectedEof);
        }
        let element = ctx.element();
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.read(cursor, &element)?);
        }
        Ok(Value::Vector(items))
    }

    fn read_composite(&mut self, cursor: &mut Cursor, ctx: &Param) -> Result<Value, Error> {
        let tl = self.tl;
        let target = ctx.ty.as_str();

        // `%Type`: bare encoding of the type's representative.
        if let Some(bare) = target.strip_prefix('%') {
            let entry = tl
                .registry()
                .constructor_by_type(bare)
                .ok_or_else(|| Error::BadPredicate { name: bare.into() })?;
            return self.read_record(cursor, entry, entry.name.clone());
        }

        // A target naming a predicate outright is also bare.
        if !target.is_empty() && target != "Object" {
            if let Some(entry) = tl.registry().constructor_by_predicate(target, -1) {
                return self.read_record(cursor, entry, entry.name.clone());
            }
        }

        // Anything else is boxed, or discovered from the wire id.
        let id = read_u32(cursor)?;
        match id {
            GZIP_PACKED_ID => self.read_unpacked(cursor, ctx),
            BOOL_TRUE_ID => Ok(Value::Bool(true)),
            BOOL_FALSE_ID => Ok(Value::Bool(false)),
            VECTOR_ID => self.read_vector_items(cursor, ctx),
            id => {
                if let Some(entry) = tl.registry().constructor_by_id(id) {
                    self.read_record(cursor, entry, entry.name.clone())
                } else if let Some(entry) = tl.registry().method_by_id(id) {
                    // Likely a replayed outgoing query; keep it apart
                    // from genuine constructors.
                    self.read_record(cursor, entry, format!("method_{}", entry.name))
                } else {
                    Err(Error::UnknownConstructor { id })
                }
            }
        }
    }

    fn read_record(
        &mut self,
        cursor: &mut Cursor,
        entry: &Entry,
        predicate: String,
    ) -> Result<Value, Error> {
        let tl = self.tl;
        let mut value = Value::Record(Record::new(predicate.clone()));
        if !self.quiet {
            for hook in tl.callbacks().constructor_before(&predicate) {
                if let Some(future) = hook(&mut value) {
                    self.hooks.push(future);
                }
            }
        }
        let mut record = match value {
            Value::Record(record) => record,
            // A hook replaced the value wholesale; trust it.
            other => return Ok(other),
        };

        let mut req_msg_id = None;
        for param in &entry.params {
            if param.ty == "#" {
                record.set(param.name.clone(), Value::Int(read_i32(cursor)?));
                continue;
            }
            if let Some(flag) = &param.flag {
                let bits = record.get(&flag.field).and_then(Value::as_i32).unwrap_or(0) as u32;
                if bits & flag.mask == 0 {
                    if matches!(param.ty.as_str(), "true" | "Bool") {
                        record.set(param.name.clone(), Value::Bool(false));
                    }
                    continue;
                }
            }

            let field = if predicate == "rpc_result" && param.name == "result" {
                self.read_reply(cursor, req_msg_id)?
            } else {
                self.read(cursor, param)?
            };

            if predicate == "rpc_result" && param.name == "req_msg_id" {
                req_msg_id = field.as_i64();
            }

            if param.name == "random_bytes" {
                // Transcoding proxies have been caught truncating
                // these; a short value voids the security guarantee.
                let len = field.as_bytes().map(<[u8]>::len).unwrap_or(0);
                if len < 15 {
                    return Err(Error::InsecureRandom { len });
                }
                continue;
            }

            record.set(param.name.clone(), field);
        }

        let mut value = post_process(record)?;

        if !self.quiet {
            for hook in tl.callbacks().constructor(&predicate) {
                if let Some(future) = hook(&mut value) {
                    self.hooks.push(future);
                }
            }
        }

        if let Value::Record(record) = &mut value {
            record.remove("flags");
            record.remove("flags2");
        }
        Ok(value)
    }

    /// Reads the `result` field of an `rpc_result`, recovering the
    /// expected type from the session's pending-query table.
    fn read_reply(
        &mut self,
        cursor: &mut Cursor,
        req_msg_id: Option<i64>,
    ) -> Result<Value, Error> {
        let tl = self.tl;
        let constructor = req_msg_id
            .and_then(|msg_id| self.queries.and_then(|queries| queries.constructor(msg_id)));

        let Some(constructor) = constructor else {
            // No known originating query: let the payload describe
            // itself.
            return self.read(cursor, &Param::of_type(""));
        };
        // Safe to unwrap: `constructor` implies `req_msg_id`.
        let msg_id = req_msg_id.unwrap();

        if !self.quiet {
            for hook in tl.callbacks().method_before(&constructor) {
                if let Some(future) = hook(msg_id) {
                    self.hooks.push(future);
                }
            }
        }

        let ctx = self
            .queries
            .and_then(|queries| queries.result_type(msg_id))
            .map(|ty| Param::of_type(&ty))
            .unwrap_or_else(|| Param::of_type(""));
        let mut result = self.read(cursor, &ctx)?;

        if !self.quiet {
            for hook in tl.callbacks().method(&constructor) {
                if let Some(future) = hook(msg_id, &mut result) {
                    self.hooks.push(future);
                }
            }
        }
        Ok(result)
    }
}

/// Reshapes well-known composites into their idiomatic form.
fn post_process(record: Record) -> Result<Value, Error> {
    use serde_json::Value as Json;

    let mut record = record;
    match record.predicate() {
        "dataJSON" => {
            let text = record.get("data").and_then(Value::as_str).unwrap_or("null");
            Ok(Value::Json(serde_json::from_str(text)?))
        }
        "jsonNull" => Ok(Value::Json(Json::Null)),
        "jsonBool" => Ok(Value::Json(Json::Bool(matches!(
            record.get("value"),
            Some(Value::Bool(true))
        )))),
        "jsonNumber" => Ok(Value::Json(match record.get("value") {
            Some(Value::Double(x)) => serde_json::Number::from_f64(*x)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            _ => Json::Null,
        })),
        "jsonString" => Ok(Value::Json(Json::String(
            record
                .get("value")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        ))),
        "jsonArray" => {
            let items = match record.get("value") {
                Some(Value::Vector(items)) => items
                    .iter()
                    .map(|item| match item {
                        Value::Json(json) => json.clone(),
                        _ => Json::Null,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            Ok(Value::Json(Json::Array(items)))
        }
        "jsonObject" => {
            let mut map = serde_json::Map::new();
            if let Some(Value::Vector(items)) = record.get("value") {
                for item in items {
                    let Some(pair) = item.as_record() else { continue };
                    let Some(key) = pair.get("key").and_then(Value::as_str) else {
                        continue;
                    };
                    let json = match pair.get("value") {
                        Some(Value::Json(json)) => json.clone(),
                        _ => Json::Null,
                    };
                    map.insert(key.to_owned(), json);
                }
            }
            Ok(Value::Json(Json::Object(map)))
        }
        "photoStrippedSize" => {
            let inflated = record
                .get("bytes")
                .and_then(Value::as_bytes)
                .filter(|data| jpeg::is_stripped(data))
                .map(jpeg::inflate_stripped);
            if let Some(inflated) = inflated {
                record.set("inflated", Value::Bytes(inflated));
            }
            Ok(Value::Record(record))
        }
        "message" => {
            wrap_keyboard_buttons(&mut record);
            Ok(Value::Record(record))
        }
        _ => Ok(Value::Record(record)),
    }
}

/// Wraps every keyboard button of a message's reply markup in a
/// `button` record, giving hosts one uniform shape to act on.
fn wrap_keyboard_buttons(message: &mut Record) {
    let Some(rows) = message
        .get_mut("reply_markup")
        .and_then(Value::as_record_mut)
        .and_then(|markup| markup.get_mut("rows"))
    else {
        return;
    };
    let Value::Vector(rows) = rows else { return };
    for row in rows {
        let Some(buttons) = row
            .as_record_mut()
            .and_then(|row| row.get_mut("buttons"))
        else {
            continue;
        };
        let Value::Vector(buttons) = buttons else {
            continue;
        };
        for button in buttons {
            let inner = std::mem::replace(button, Value::Null);
            *button = Value::Record(Record::new("button").with("button", inner));
        }
    }
}
