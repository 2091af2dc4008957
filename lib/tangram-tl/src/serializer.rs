// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The schema-driven serializer.
//!
//! Serialization is async because two of its steps are cooperative
//! suspension points: value-replacement hooks and auto-default
//! synthesis may both await external work. Everything else runs to
//! completion without yielding.

use base64::Engine as _;
use futures_util::future::BoxFuture;
use getrandom::getrandom;

use crate::errors::Error;
use crate::primitives::{write_bytes, write_i32, write_u32};
use crate::schema::{Entry, Kind, Param};
use crate::value::{Record, Value};
use crate::{Tl, BOOL_FALSE_ID, BOOL_TRUE_ID, VECTOR_ID};

impl Tl {
    /// Serializes a value under the given type context.
    ///
    /// The `layer` selects among versions of the same predicate; `-1`
    /// means the newest.
    pub fn serialize<'a>(
        &'a self,
        ctx: &'a Param,
        value: &'a Value,
        layer: i32,
    ) -> BoxFuture<'a, Result<Vec<u8>, Error>> {
        Box::pin(async move {
            let mut out = Vec::new();
            match ctx.ty.as_str() {
                "int" | "#" => write_i32(&mut out, int_arg(value)?),
                "long" => out.extend_from_slice(&long_arg(value)?),
                "double" => out.extend_from_slice(&double_arg(value)?.to_le_bytes()),
                "int128" => out.extend(blob_arg(value, 16, 128)?),
                "int256" => out.extend(blob_arg(value, 32, 256)?),
                "int512" => out.extend(blob_arg(value, 64, 512)?),
                "string" | "bytes" => write_bytes(&mut out, text_arg(value)?),
                "Bool" => write_u32(
                    &mut out,
                    if value.truthy() {
                        BOOL_TRUE_ID
                    } else {
                        BOOL_FALSE_ID
                    },
                ),
                "true" => {}
                ty if ty.starts_with('!') => match value {
                    // The query was serialized by the caller already.
                    Value::Raw(data) | Value::Bytes(data) => out.extend_from_slice(data),
                    _ => return Err(Error::NotString),
                },
                "Object" => match value {
                    Value::Raw(data) | Value::Bytes(data) => out.extend_from_slice(data),
                    _ => out = self.serialize_composite(ctx, value, layer).await?,
                },
                "Vector t" | "vector t" => {
                    let items = value.as_vector().ok_or_else(|| Error::ArrayRequired {
                        name: ctx.name.clone(),
                    })?;
                    if ctx.ty.starts_with('V') {
                        write_u32(&mut out, VECTOR_ID);
                    }
                    write_u32(&mut out, items.len() as u32);
                    let element = ctx.element();
                    for item in items {
                        out.extend(self.serialize(&element, item, layer).await?);
                    }
                }
                _ => out = self.serialize_composite(ctx, value, layer).await?,
            }
            Ok(out)
        })
    }

    fn serialize_composite<'a>(
        &'a self,
        ctx: &'a Param,
        value: &'a Value,
        layer: i32,
    ) -> BoxFuture<'a, Result<Vec<u8>, Error>> {
        Box::pin(async move {
            let (target, force_bare) = match ctx.ty.strip_prefix('%') {
                Some(stripped) => (stripped, true),
                None => (ctx.ty.as_str(), false),
            };

            // `DataJSON` accepts arbitrary values, wrapped on the fly.
            if target == "DataJSON"
                && value.as_record().map(Record::predicate) != Some("dataJSON")
            {
                let encoded = serde_json::to_string(&value_to_json(value)?)?;
                let wrapped = Value::Record(Record::new("dataJSON").with("data", encoded));
                let future = self.serialize_composite(ctx, &wrapped, layer);
                return future.await;
            }

            let mut record = match value.as_record() {
                Some(record) => record.clone(),
                None => {
                    // Not a composite at all: only a registered
                    // coercion hook can rescue this.
                    let coerced = self.coerce(target, value).await?;
                    let future = self.serialize_composite(ctx, &coerced, layer);
                    return future.await;
                }
            };

            // Untagged records take the target type's constructor when
            // it is unambiguous.
            if record.predicate().is_empty() {
                match self.registry().unique_constructor_by_type(target) {
                    Some(entry) => {
                        let name = entry.name.clone();
                        record.set_predicate(name);
                    }
                    None => {
                        return Err(Error::BadPredicate {
                            name: target.into(),
                        })
                    }
                }
            }

            // Mention entities are read as `messageEntityMentionName`
            // but can only be sent as the `input` flavour.
            if record.predicate() == "messageEntityMentionName" {
                record.set_predicate("inputMessageEntityMentionName");
            }

            let entry = self.lookup(record.predicate(), layer)?;

            // The value carries a predicate of some other type: give a
            // registered coercion hook a chance before failing.
            if entry.kind == Kind::Constructor
                && !target.is_empty()
                && target != "Object"
                && entry.ty != target
                && self.callbacks().type_mismatch(target).is_some()
            {
                let coerced = self.coerce(target, value).await?;
                if coerced.as_record().map(Record::predicate) != Some(record.predicate()) {
                    let future = self.serialize_composite(ctx, &coerced, layer);
                    return future.await;
                }
            }

            // The serialization replacement may rewrite the value (and
            // even its predicate) right before emission.
            if let Some(hook) = self.callbacks().constructor_serialize(record.predicate()) {
                match hook(Value::Record(record)).await? {
                    Value::Record(replaced) => record = replaced,
                    _ => {
                        return Err(Error::BadPredicate {
                            name: ctx.ty.clone(),
                        })
                    }
                }
            }
            let entry = self.lookup(record.predicate(), layer)?;

            // Bare iff forced by `%`, or the target names the
            // predicate itself.
            let bare = force_bare || record.predicate() == target;
            let mut out = Vec::new();
            if !bare {
                write_u32(&mut out, entry.id);
            }
            out.extend(self.serialize_params(entry, record, layer).await?);
            Ok(out)
        })
    }

    fn lookup(&self, predicate: &str, layer: i32) -> Result<&Entry, Error> {
        self.registry()
            .constructor_by_predicate(predicate, layer)
            .or_else(|| self.registry().method_by_name(predicate, layer))
            .ok_or_else(|| Error::BadPredicate {
                name: predicate.into(),
            })
    }

    async fn coerce(&self, target: &str, value: &Value) -> Result<Value, Error> {
        match self.callbacks().type_mismatch(target) {
            Some(hook) => hook(target, value.clone()).await,
            None => Err(Error::BadPredicate {
                name: target.into(),
            }),
        }
    }

    /// Serializes the parameters of an entry in declared order.
    ///
    /// Two passes: the flag computation must run over every parameter
    /// first, because a parameter late in the declaration may set a
    /// bit in a bitfield emitted before it.
    fn serialize_params<'a>(
        &'a self,
        entry: &'a Entry,
        args: Record,
        layer: i32,
    ) -> BoxFuture<'a, Result<Vec<u8>, Error>> {
        Box::pin(async move {
            let mut args = args;

            for param in &entry.params {
                let Some(flag) = &param.flag else { continue };
                let present = match args.get(&param.name) {
                    None | Some(Value::Null) => false,
                    Some(Value::Bool(false)) if param.ty == "true" => false,
                    Some(_) => true,
                };
                let bits = args.get(&flag.field).and_then(Value::as_i32).unwrap_or(0) as u32;
                let bits = if present {
                    bits | flag.mask
                } else {
                    bits & !flag.mask
                };
                args.set(flag.field.clone(), Value::Int(bits as i32));
                if !present && param.ty == "Bool" {
                    args.remove(&param.name);
                }
            }

            let mut out = Vec::new();
            for param in &entry.params {
                if param.ty == "#" {
                    let bits = args.get(&param.name).and_then(Value::as_i32).unwrap_or(0);
                    write_i32(&mut out, bits);
                    continue;
                }
                if let Some(flag) = &param.flag {
                    let bits = args.get(&flag.field).and_then(Value::as_i32).unwrap_or(0) as u32;
                    if bits & flag.mask == 0 {
                        continue;
                    }
                }
                match args.get(&param.name) {
                    Some(value) if !value.is_null() => {
                        let piece = self.serialize(param, value, layer).await?;
                        out.extend(piece);
                    }
                    _ => {
                        let piece = self.synthesize_missing(entry, param, &args, layer).await?;
                        out.extend(piece);
                    }
                }
            }
            Ok(out)
        })
    }

    /// Produces the wire bytes for a parameter the caller did not
    /// supply, following the defaulting conventions.
    fn synthesize_missing<'a>(
        &'a self,
        entry: &'a Entry,
        param: &'a Param,
        args: &'a Record,
        layer: i32,
    ) -> BoxFuture<'a, Result<Vec<u8>, Error>> {
        Box::pin(async move {
            let mut out = Vec::new();
            match (param.name.as_str(), param.ty.as_str()) {
                ("random_bytes", _) => {
                    let mut pick = [0u8; 1];
                    getrandom(&mut pick).expect("failed to generate secure random data");
                    let mut data = vec![0u8; 15 + 4 * (pick[0] % 3) as usize];
                    getrandom(&mut data).expect("failed to generate secure random data");
                    write_bytes(&mut out, &data);
                }
                ("random_id", "long") => out.extend(random_bytes(8)),
                ("random_id", "int") => out.extend(random_bytes(4)),
                ("random_id", "Vector t" | "vector t") => {
                    // One random id per message: match the length of
                    // the sibling `id` argument.
                    let count = args
                        .get("id")
                        .and_then(Value::as_vector)
                        .ok_or_else(|| Error::ArrayRequired { name: "id".into() })?
                        .len();
                    if param.ty.starts_with('V') {
                        write_u32(&mut out, VECTOR_ID);
                    }
                    write_u32(&mut out, count as u32);
                    for _ in 0..count {
                        out.extend(random_bytes(8));
                    }
                }
                ("hash", "long") => out.extend_from_slice(&[0u8; 8]),
                ("hash", "int") => out.extend_from_slice(&[0u8; 4]),
                ("flags", "int") => out.extend_from_slice(&[0u8; 4]),
                _ => {
                    if let Some(synthesizer) = self.pick_synthesizer(param) {
                        let value = synthesizer(&entry.name, &param.name, args).await?;
                        return self.serialize(param, &value, layer).await;
                    }
                    match param.ty.as_str() {
                        "true" => {}
                        // An empty value of the right width.
                        "string" | "bytes" | "int" => out.extend_from_slice(&[0u8; 4]),
                        "Vector t" => {
                            write_u32(&mut out, VECTOR_ID);
                            write_u32(&mut out, 0);
                        }
                        "vector t" => write_u32(&mut out, 0),
                        "DataJSON" | "%DataJSON" => {
                            let null = Value::Record(Record::new("dataJSON").with("data", "null"));
                            return self.serialize(param, &null, layer).await;
                        }
                        ty => {
                            let base = ty.trim_start_matches('%');
                            for candidate in [
                                format!("{}Empty", decapitalize(base)),
                                format!("input{}Empty", base),
                            ] {
                                if self
                                    .registry()
                                    .constructor_by_predicate(&candidate, layer)
                                    .is_some()
                                {
                                    let empty = Value::Record(Record::new(candidate));
                                    let future = self.serialize(param, &empty, layer);
                                    return future.await;
                                }
                            }
                            return Err(Error::MissingParam {
                                name: param.name.clone(),
                            });
                        }
                    }
                }
            }
            Ok(out)
        })
    }

    fn pick_synthesizer(&self, param: &Param) -> Option<crate::Synthesizer> {
        let synthesizers = self.synthesizers();
        match param.ty.as_str() {
            "InputFile" => synthesizers.input_file.clone(),
            "InputEncryptedChat" => synthesizers.encrypted_chat.clone(),
            _ if param.name == "data" => synthesizers.secret_data.clone(),
            _ => None,
        }
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    getrandom(&mut data).expect("failed to generate secure random data");
    data
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn int_arg(value: &Value) -> Result<i32, Error> {
    match value {
        Value::Int(x) => Ok(*x),
        Value::Long(x) => i32::try_from(*x).map_err(|_| Error::NotNumeric),
        Value::String(s) => s.parse().map_err(|_| Error::NotNumeric),
        _ => Err(Error::NotNumeric),
    }
}

/// Coerces the accepted alternate forms of a `long` into its 8 wire
/// bytes: a host integer, a raw 8-byte string, a 9-byte string with a
/// leading `'a'` tag, a `[low, high]` pair, or a decimal string.
fn long_arg(value: &Value) -> Result<[u8; 8], Error> {
    match value {
        Value::Long(x) => Ok(x.to_le_bytes()),
        Value::Int(x) => Ok((*x as i64).to_le_bytes()),
        Value::Bytes(data) => {
            let raw: &[u8] = match data.as_slice() {
                raw if raw.len() == 8 => raw,
                [b'a', raw @ ..] if raw.len() == 8 => raw,
                _ => return Err(Error::NotNumeric),
            };
            // Safe to unwrap: both arms guarantee 8 bytes.
            Ok(raw.try_into().unwrap())
        }
        Value::Vector(items) => match items.as_slice() {
            [low, high] => {
                let low = low.as_i32().ok_or(Error::NotNumeric)? as u32 as u64;
                let high = high.as_i32().ok_or(Error::NotNumeric)? as u32 as u64;
                Ok((((high << 32) | low) as i64).to_le_bytes())
            }
            _ => Err(Error::NotNumeric),
        },
        Value::String(s) => Ok(s.parse::<i64>().map_err(|_| Error::NotNumeric)?.to_le_bytes()),
        _ => Err(Error::NotNumeric),
    }
}

fn double_arg(value: &Value) -> Result<f64, Error> {
    match value {
        Value::Double(x) => Ok(*x),
        Value::Int(x) => Ok(*x as f64),
        Value::Long(x) => Ok(*x as f64),
        Value::String(s) => s.parse().map_err(|_| Error::NotNumeric),
        _ => Err(Error::NotNumeric),
    }
}

/// An opaque fixed-width blob. Values of the wrong length get one
/// chance as base64 text before failing.
fn blob_arg(value: &Value, len: usize, bits: u32) -> Result<Vec<u8>, Error> {
    let data = value.as_bytes().ok_or(Error::BadLength { bits, got: 0 })?;
    if data.len() == len {
        return Ok(data.to_vec());
    }
    if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(data) {
        if decoded.len() == len {
            return Ok(decoded);
        }
    }
    Err(Error::BadLength {
        bits,
        got: data.len(),
    })
}

fn text_arg(value: &Value) -> Result<&[u8], Error> {
    match value {
        Value::String(s) => Ok(s.as_bytes()),
        Value::Bytes(data) => Ok(data),
        _ => Err(Error::NotString),
    }
}

fn value_to_json(value: &Value) -> Result<serde_json::Value, Error> {
    use serde_json::Value as Json;
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(x) => Json::Bool(*x),
        Value::Int(x) => Json::Number((*x).into()),
        Value::Long(x) => Json::Number((*x).into()),
        Value::Double(x) => serde_json::Number::from_f64(*x)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(data) => Json::String(String::from_utf8_lossy(data).into_owned()),
        Value::Vector(items) => Json::Array(
            items
                .iter()
                .map(value_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Record(record) => {
            let mut map = serde_json::Map::new();
            map.insert("_".into(), Json::String(record.predicate().into()));
            for (name, field) in record.fields() {
                map.insert(name.into(), value_to_json(field)?);
            }
            Json::Object(map)
        }
        Value::Json(json) => json.clone(),
        Value::Raw(_) => {
            return Err(Error::Json {
                reason: "raw wire bytes have no json form".into(),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{load_source, Origin, Registry, SchemaSource};

    fn fixture() -> Tl {
        let mut registry = Registry::new();
        load_source(
            &mut registry,
            &SchemaSource::Tl(
                "
                boolFalse#bc799737 = Bool;
                boolTrue#997275b5 = Bool;
                inputPeerEmpty#7f3b18ea = InputPeer;
                inputPeerUser#dde8a54c user_id:long access_hash:long = InputPeer;
                inputUserSelf#f7c1b13f = InputUser;
                pong#347773c5 msg_id:long ping_id:long = Pong;
                dataJSON#7d748d04 data:string = DataJSON;
                dialogFilter#7438f7e8 flags:# contacts:flags.0?true broadcasts:flags.5?true title:string = DialogFilter;
                ---functions---
                ping#7abe77ec ping_id:long = Pong;
                messages.getPeerSettings#efd9a6a2 peer:InputPeer = messages.PeerSettings;
                messages.forwardMessages#d9fee60e flags:# from_peer:InputPeer id:Vector<int> random_id:Vector<long> to_peer:InputPeer = Updates;
                "
                .into(),
            ),
            Origin::Api,
        )
        .unwrap();
        Tl::from_registry(registry)
    }

    async fn serialize(tl: &Tl, ty: &str, value: &Value) -> Result<Vec<u8>, Error> {
        tl.serialize(&Param::of_type(ty), value, -1).await
    }

    #[tokio::test]
    async fn check_primitives() {
        let tl = fixture();
        assert_eq!(
            serialize(&tl, "int", &Value::Int(1)).await.unwrap(),
            [0x01, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            serialize(&tl, "string", &"abc".into()).await.unwrap(),
            [0x03, 0x61, 0x62, 0x63]
        );

        let padded = serialize(&tl, "bytes", &Value::Bytes(vec![0xaa; 14]))
            .await
            .unwrap();
        assert_eq!(padded.len(), 16);
        assert_eq!(padded[0], 0x0e);
        assert_eq!(&padded[1..15], [0xaa; 14]);
        assert_eq!(padded[15], 0x00);
    }

    #[tokio::test]
    async fn check_long_forms() {
        let tl = fixture();
        let expected = [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01];
        for value in [
            Value::Long(0x0102030405060708),
            Value::Bytes(expected.to_vec()),
            Value::Bytes(
                [b'a', 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01].to_vec(),
            ),
            Value::Vector(vec![
                Value::Int(0x05060708),
                Value::Int(0x01020304),
            ]),
            Value::String("72623859790382856".into()),
        ] {
            assert_eq!(
                serialize(&tl, "long", &value).await.unwrap(),
                expected,
                "long form {:?}",
                value
            );
        }
        assert_eq!(
            serialize(&tl, "long", &Value::Bytes(vec![1, 2, 3])).await,
            Err(Error::NotNumeric)
        );
    }

    #[tokio::test]
    async fn check_blob_base64_fallback() {
        let tl = fixture();
        let blob = serialize(&tl, "int128", &Value::Bytes(vec![0x11; 16]))
            .await
            .unwrap();
        assert_eq!(blob, vec![0x11; 16]);

        let encoded = base64::engine::general_purpose::STANDARD.encode([0x22u8; 16]);
        let blob = serialize(&tl, "int128", &Value::String(encoded))
            .await
            .unwrap();
        assert_eq!(blob, vec![0x22; 16]);

        assert_eq!(
            serialize(&tl, "int128", &Value::Bytes(vec![0; 3])).await,
            Err(Error::BadLength { bits: 128, got: 3 })
        );
    }

    #[tokio::test]
    async fn check_bool_and_true() {
        let tl = fixture();
        assert_eq!(
            serialize(&tl, "Bool", &Value::Bool(true)).await.unwrap(),
            BOOL_TRUE_ID.to_le_bytes()
        );
        assert_eq!(
            serialize(&tl, "Bool", &Value::Bool(false)).await.unwrap(),
            BOOL_FALSE_ID.to_le_bytes()
        );
        assert!(serialize(&tl, "true", &Value::Bool(true))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn check_boxed_vector() {
        let tl = fixture();
        let value = Value::Vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            serialize(&tl, "Vector<int>", &value).await.unwrap(),
            [
                0x15, 0xc4, 0xb5, 0x1c, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02,
                0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
            ]
        );
        // Bare vectors drop the constructor prefix.
        assert_eq!(
            serialize(&tl, "vector<int>", &value).await.unwrap(),
            [
                0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03,
                0x00, 0x00, 0x00,
            ]
        );
        assert_eq!(
            serialize(&tl, "Vector<int>", &Value::Int(1)).await,
            Err(Error::ArrayRequired { name: "".into() })
        );
    }

    #[tokio::test]
    async fn check_boxed_composite_prefix() {
        let tl = fixture();
        let peer = Value::Record(
            Record::new("inputPeerUser")
                .with("user_id", 12345i64)
                .with("access_hash", Value::Bytes(vec![8, 7, 6, 5, 4, 3, 2, 1])),
        );
        let bytes = serialize(&tl, "InputPeer", &peer).await.unwrap();
        assert_eq!(&bytes[..4], 0xdde8a54cu32.to_le_bytes());
        assert_eq!(bytes.len(), 4 + 8 + 8);
        assert_eq!(&bytes[4..12], 12345i64.to_le_bytes());
        assert_eq!(&bytes[12..], [8, 7, 6, 5, 4, 3, 2, 1]);

        // Bare discipline: `%Pong` drops the prefix.
        let pong = Value::Record(
            Record::new("pong")
                .with("msg_id", 1i64)
                .with("ping_id", 2i64),
        );
        let boxed = serialize(&tl, "Pong", &pong).await.unwrap();
        let bare = serialize(&tl, "%Pong", &pong).await.unwrap();
        assert_eq!(boxed.len(), bare.len() + 4);
        assert_eq!(&boxed[4..], &bare[..]);
    }

    #[tokio::test]
    async fn check_flag_computation() {
        let tl = fixture();
        // `contacts` (bit 0) set, `broadcasts` (bit 5) missing.
        let filter = Value::Record(
            Record::new("dialogFilter")
                .with("contacts", true)
                .with("title", "work"),
        );
        let bytes = serialize(&tl, "DialogFilter", &filter).await.unwrap();
        let flags = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(flags, 0b1);

        // `true`-typed parameters set bits but emit no bytes: id,
        // flags, then the title string.
        assert_eq!(bytes.len(), 4 + 4 + 8);

        let filter = Value::Record(
            Record::new("dialogFilter")
                .with("contacts", true)
                .with("broadcasts", true)
                .with("title", "work"),
        );
        let bytes = serialize(&tl, "DialogFilter", &filter).await.unwrap();
        let flags = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(flags, 0b100001);

        // An explicit `false` leaves the bit clear.
        let filter = Value::Record(
            Record::new("dialogFilter")
                .with("contacts", false)
                .with("title", "work"),
        );
        let bytes = serialize(&tl, "DialogFilter", &filter).await.unwrap();
        let flags = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(flags, 0);
    }

    #[tokio::test]
    async fn check_method_serialization() {
        let tl = fixture();
        let call = Value::Record(Record::new("ping").with("ping_id", 99i64));
        let bytes = serialize(&tl, "", &call).await.unwrap();
        assert_eq!(&bytes[..4], 0x7abe77ecu32.to_le_bytes());
        assert_eq!(&bytes[4..], 99i64.to_le_bytes());
    }

    #[tokio::test]
    async fn check_empty_constructor_default() {
        let tl = fixture();
        // A missing `InputPeer` argument falls back to
        // `inputPeerEmpty`.
        let call = Value::Record(Record::new("messages.getPeerSettings"));
        let bytes = serialize(&tl, "", &call).await.unwrap();
        assert_eq!(&bytes[..4], 0xefd9a6a2u32.to_le_bytes());
        assert_eq!(&bytes[4..], 0x7f3b18eau32.to_le_bytes());

        // A missing `long` has no conventional empty form.
        let peer = Value::Record(Record::new("inputPeerUser"));
        assert_eq!(
            serialize(&tl, "InputPeer", &peer).await,
            Err(Error::MissingParam {
                name: "user_id".into()
            })
        );
    }

    #[tokio::test]
    async fn check_auto_tagging() {
        let tl = fixture();
        // `InputUser` has exactly one constructor in the fixture.
        let bytes = serialize(&tl, "InputUser", &Value::Record(Record::untagged()))
            .await
            .unwrap();
        assert_eq!(bytes, 0xf7c1b13fu32.to_le_bytes());
        // `InputPeer` has two: ambiguous.
        assert!(matches!(
            serialize(&tl, "InputPeer", &Value::Record(Record::untagged())).await,
            Err(Error::BadPredicate { .. })
        ));
    }

    #[tokio::test]
    async fn check_data_json_wrapping() {
        let tl = fixture();
        let bytes = serialize(&tl, "DataJSON", &Value::Json(serde_json::json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(&bytes[..4], 0x7d748d04u32.to_le_bytes());
        // The payload is the json text as a framed string.
        assert_eq!(bytes[4], 7);
        assert_eq!(&bytes[5..12], br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn check_random_id_default() {
        let tl = fixture();
        let empty_peer = || Value::Record(Record::new("inputPeerEmpty"));
        let call = Value::Record(
            Record::new("messages.forwardMessages")
                .with("from_peer", empty_peer())
                .with("id", vec![Value::Int(5), Value::Int(6)])
                .with("to_peer", empty_peer()),
        );
        let bytes = serialize(&tl, "", &call).await.unwrap();
        // method id (4) + flags (4) + from_peer (4) + id vector
        // (4 + 4 + 2x4) + synthesized random_id vector (4 + 4 + 2x8)
        // + to_peer (4): one random long per forwarded message.
        assert_eq!(bytes.len(), 4 + 4 + 4 + 16 + 24 + 4);
    }

    #[tokio::test]
    async fn check_serialize_replacement_hook() {
        use crate::hooks::Callbacks;
        use std::sync::Arc;

        let mut tl = fixture();
        let mut callbacks = Callbacks::new();
        callbacks.on_constructor_serialize(
            "ping",
            Arc::new(|value| {
                Box::pin(async move {
                    let mut record = match value {
                        Value::Record(record) => record,
                        _ => unreachable!(),
                    };
                    record.set("ping_id", 42i64);
                    Ok(Value::Record(record))
                })
            }),
        );
        tl.update_callbacks(callbacks);

        let call = Value::Record(Record::new("ping").with("ping_id", 1i64));
        let bytes = serialize(&tl, "", &call).await.unwrap();
        assert_eq!(&bytes[4..], 42i64.to_le_bytes());
    }

    #[tokio::test]
    async fn check_type_mismatch_hook() {
        use crate::hooks::Callbacks;
        use std::sync::Arc;

        let mut tl = fixture();
        let mut callbacks = Callbacks::new();
        callbacks.on_type_mismatch(
            "InputUser",
            Arc::new(|_, _| {
                Box::pin(async move { Ok(Value::Record(Record::new("inputUserSelf"))) })
            }),
        );
        tl.update_callbacks(callbacks);

        // A bare integer is not an `InputUser`, but the hook coerces.
        let bytes = serialize(&tl, "InputUser", &Value::Long(7)).await.unwrap();
        assert_eq!(bytes, 0xf7c1b13fu32.to_le_bytes());

        // Without a hook the same value fails.
        tl.update_callbacks(Callbacks::new());
        assert!(matches!(
            serialize(&tl, "InputUser", &Value::Long(7)).await,
            Err(Error::BadPredicate { .. })
        ));
    }
}
