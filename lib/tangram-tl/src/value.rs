// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The dynamic value model the codec operates on.
//!
//! Schema-driven (de)serialization cannot use concrete structs, since
//! the set of constructors is only known once a schema is loaded.
//! Instead, composite values are [`Record`]s: a predicate name plus an
//! ordered field map, accessed by field name.

use std::fmt;

/// A dynamic TL value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The absence of a value. Flag-gated parameters that carry `None`
    /// are treated the same as missing ones.
    Null,

    /// A `Bool`, or the presence bit of a `true`-typed parameter.
    Bool(bool),

    /// A 32-bit integer (`int` or `#`).
    Int(i32),

    /// A 64-bit integer (`long`).
    Long(i64),

    /// An IEEE-754 `double`.
    Double(f64),

    /// A UTF-8 `string`.
    String(String),

    /// A byte-string, also used for the opaque `int128`/`int256`/
    /// `int512` blobs and for `long` fields kept raw.
    Bytes(Vec<u8>),

    /// A `Vector` or `vector` of values.
    Vector(Vec<Value>),

    /// A composite value tagged with its predicate.
    Record(Record),

    /// A parsed JSON tree, produced for `dataJSON` and `JSONValue`.
    Json(serde_json::Value),

    /// Already-serialized wire bytes, emitted verbatim (`!X` queries
    /// and `Object` passthrough).
    Raw(Vec<u8>),
}

impl Value {
    /// Whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value sets the presence bit of a `true`-typed
    /// parameter: anything but `Null` and `false`.
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(x) => Some(*x),
            Value::Long(x) => i32::try_from(*x).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(x) => Some(*x as i64),
            Value::Long(x) => Some(*x),
            Value::Bytes(b) if b.len() == 8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(b);
                Some(i64::from_le_bytes(buf))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) | Value::Raw(b) => Some(b),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}
impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Int(x)
    }
}
impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Long(x)
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}
impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::String(x.into())
    }
}
impl From<String> for Value {
    fn from(x: String) -> Self {
        Value::String(x)
    }
}
impl From<Vec<u8>> for Value {
    fn from(x: Vec<u8>) -> Self {
        Value::Bytes(x)
    }
}
impl From<Vec<Value>> for Value {
    fn from(x: Vec<Value>) -> Self {
        Value::Vector(x)
    }
}
impl From<Record> for Value {
    fn from(x: Record) -> Self {
        Value::Record(x)
    }
}
impl From<serde_json::Value> for Value {
    fn from(x: serde_json::Value) -> Self {
        Value::Json(x)
    }
}

/// A composite value: a predicate name plus an ordered field map.
///
/// Fields keep their insertion order, which for decoded values is the
/// declaration order of the schema. Lookup is linear; constructors
/// have few fields and this keeps the representation dense.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    predicate: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record with the given predicate.
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a record with no predicate. The serializer will tag it
    /// with the target type's constructor if there is exactly one.
    pub fn untagged() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    ///
    /// # Examples
    ///
    /// ```
    /// use tangram_tl::Record;
    ///
    /// let peer = Record::new("inputPeerUser")
    ///     .with("user_id", 12345i64)
    ///     .with("access_hash", 0i64);
    /// assert_eq!(peer.predicate(), "inputPeerUser");
    /// ```
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn set_predicate(&mut self, predicate: impl Into<String>) {
        self.predicate = predicate.into();
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Sets a field, replacing it in place if it already exists so the
    /// field order is stable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(field, _)| field == name)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.predicate)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:?}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_field_order() {
        let record = Record::new("test")
            .with("b", 2)
            .with("a", 1)
            .with("b", 3);
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(record.get("b"), Some(&Value::Int(3)));
    }

    #[test]
    fn check_truthy() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(Value::Bool(true).truthy());
        assert!(Value::Int(0).truthy());
        assert!(Value::String(String::new()).truthy());
    }

    #[test]
    fn check_long_from_raw_bytes() {
        let value = Value::Bytes(vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(value.as_i64(), Some(0x0102030405060708));
    }
}
