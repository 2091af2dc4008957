// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Schema loading: turning textual TL or pre-parsed JSON schema
//! sources into registries of compiled entries.
//!
//! Schemas are grouped by origin. The `api`, `mtproto` and `secret`
//! origins share one registry; the `td` origin occupies a separate,
//! parallel one, since its identifiers may collide with the shared
//! set.

mod registry;

pub use registry::Registry;

use crate::errors::Error;
use tangram_tl_parser::tl::{Category, Definition, ParameterType};
use tangram_tl_parser::{errors::ParseError, parse_tl_file};

/// Where a schema entry came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    Api,
    Mtproto,
    Secret,
    Td,
    Other(String),
}

/// Whether an entry is a constructor or a callable method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Constructor,
    Method,
}

/// The flag gating an optional parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct FlagBit {
    /// The name of the sibling bitfield parameter, typically `flags`
    /// or `flags2`.
    pub field: String,

    /// The mask selecting this parameter's bit, `1 << N`.
    pub mask: u32,
}

/// A compiled parameter descriptor. This doubles as the type context
/// handed to the serializer and deserializer.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// The field name. Empty for anonymous type contexts.
    pub name: String,

    /// The compiled textual type. Vectors are normalized to `Vector t`
    /// (boxed) or `vector t` (bare) with the element type in
    /// [`Param::subtype`]; generic references keep their `!` sigil and
    /// bare-forced types their `%` sigil.
    pub ty: String,

    /// The element type for vector parameters.
    pub subtype: Option<String>,

    /// The gating flag, if the parameter is optional.
    pub flag: Option<FlagBit>,

    /// Free-form description attached via `//@` directives, if any.
    pub description: String,
}

impl Param {
    /// A type context without a field name, for top-level calls.
    ///
    /// # Examples
    ///
    /// ```
    /// use tangram_tl::schema::Param;
    ///
    /// let ctx = Param::of_type("Vector<long>");
    /// assert_eq!(ctx.ty, "Vector t");
    /// assert_eq!(ctx.subtype.as_deref(), Some("long"));
    /// ```
    pub fn of_type(ty: &str) -> Self {
        Self::compile("", ty)
    }

    /// Compiles a textual parameter type into a descriptor.
    pub fn compile(name: &str, ty: &str) -> Self {
        // Parse `flags.N?Inner`
        let (flag, ty) = match ty.split_once('?') {
            Some((gate, inner)) => match gate.split_once('.') {
                Some((field, bit)) => match bit.parse::<u32>() {
                    Ok(bit) => (
                        Some(FlagBit {
                            field: field.into(),
                            mask: 1 << bit,
                        }),
                        inner,
                    ),
                    Err(_) => (None, ty),
                },
                None => (None, ty),
            },
            None => (None, ty),
        };

        // Normalize `Vector<t>` / `vector<t>` / `Vector t`
        let (ty, subtype) = if let Some(inner) = vector_element(ty) {
            (
                if ty.starts_with('V') {
                    "Vector t"
                } else {
                    "vector t"
                },
                Some(inner.to_string()),
            )
        } else {
            (ty, None)
        };

        Self {
            name: name.into(),
            ty: ty.into(),
            subtype,
            flag,
            description: String::new(),
        }
    }

    /// The type context for this parameter's vector elements.
    pub(crate) fn element(&self) -> Param {
        Param::compile(&self.name, self.subtype.as_deref().unwrap_or(""))
    }
}

fn vector_element(ty: &str) -> Option<&str> {
    for prefix in ["Vector<", "vector<"] {
        if let Some(rest) = ty.strip_prefix(prefix) {
            return rest.strip_suffix('>');
        }
    }
    for prefix in ["Vector ", "vector "] {
        if let Some(rest) = ty.strip_prefix(prefix) {
            return Some(rest);
        }
    }
    None
}

/// A compiled schema entry, shared by constructors and methods.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Predicate (for constructors) or method (for methods), dotted.
    pub name: String,

    /// The 32-bit constructor identifier.
    pub id: u32,

    /// The return/result type name, as declared.
    pub ty: String,

    /// The schema generation this entry belongs to; `-1` means "any".
    pub layer: i32,

    /// Ordered parameter descriptors.
    pub params: Vec<Param>,

    pub origin: Origin,
    pub kind: Kind,

    /// Free-form description, if the schema carried one.
    pub description: String,

    /// Names of parameters the schema descriptions mark as nullable.
    /// Only populated for `td` methods.
    pub nullable: Vec<String>,
}

impl Entry {
    pub fn is_method(&self) -> bool {
        self.kind == Kind::Method
    }

    /// Finds the descriptor of the given parameter.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|param| param.name == name)
    }
}

/// A schema source: textual TL, or the pre-parsed JSON flavour with
/// `constructors` and `methods` arrays.
#[derive(Clone, Debug)]
pub enum SchemaSource {
    Tl(String),
    Json(String),
}

/// A bundle of schema sources, grouped by origin.
///
/// The loader consumes the bundle once; `upgrade` runs after every
/// source has been loaded to allow schema-version migration.
pub trait SchemaBundle {
    fn api_schema(&self) -> Option<SchemaSource> {
        None
    }
    fn mtproto_schema(&self) -> Option<SchemaSource> {
        None
    }
    fn secret_schema(&self) -> Option<SchemaSource> {
        None
    }

    /// Additional labeled sources. The label `td` loads into the
    /// parallel td registry; any other label shares the main registry.
    fn other(&self) -> Vec<(String, SchemaSource)> {
        Vec::new()
    }

    /// Called once, post-load, to allow schema-version migration.
    fn upgrade(&self, shared: &mut Registry, td: &mut Registry) {
        let _ = (shared, td);
    }
}

/// Loads a whole bundle into a `(shared, td)` registry pair.
pub fn load_bundle(bundle: &dyn SchemaBundle) -> Result<(Registry, Registry), Error> {
    let mut shared = Registry::new();
    let mut td = Registry::new();

    if let Some(source) = bundle.api_schema() {
        load_source(&mut shared, &source, Origin::Api)?;
    }
    if let Some(source) = bundle.mtproto_schema() {
        load_source(&mut shared, &source, Origin::Mtproto)?;
    }
    if let Some(source) = bundle.secret_schema() {
        load_source(&mut shared, &source, Origin::Secret)?;
    }
    for (label, source) in bundle.other() {
        if label == "td" {
            load_source(&mut td, &source, Origin::Td)?;
        } else {
            load_source(&mut shared, &source, Origin::Other(label))?;
        }
    }

    bundle.upgrade(&mut shared, &mut td);
    Ok((shared, td))
}

/// Loads a single schema source into a registry.
pub fn load_source(
    registry: &mut Registry,
    source: &SchemaSource,
    origin: Origin,
) -> Result<(), Error> {
    match source {
        SchemaSource::Tl(contents) => load_tl(registry, contents, origin),
        SchemaSource::Json(contents) => load_json(registry, contents, origin),
    }
}

fn load_tl(registry: &mut Registry, contents: &str, origin: Origin) -> Result<(), Error> {
    for definition in parse_tl_file(contents) {
        let definition = match definition {
            Ok(definition) => definition,
            // Unparseable declarations are skipped the way primitive
            // redeclarations are; anything else taints the source.
            Err(ParseError::NotImplemented) | Err(ParseError::UnknownSeparator) => {
                log::debug!("skipping unparseable declaration");
                continue;
            }
            Err(e) => {
                return Err(Error::SchemaInvalid {
                    reason: format!("{:?}", e),
                })
            }
        };

        validate_id(&definition, &origin);
        let entry = compile_definition(definition, origin.clone());
        registry.add(entry)?;
    }
    Ok(())
}

/// Checks the declared identifier against the one inferred from the
/// normalized signature. A mismatch is diagnostic, not fatal: the
/// declared identifier is what goes on the wire.
fn validate_id(definition: &Definition, origin: &Origin) {
    // The td flavour normalizes `bytes` differently and always
    // declares its identifiers, so it is exempt from the check.
    if matches!(origin, Origin::Td | Origin::Other(_)) {
        return;
    }
    let inferred = definition.inferred_id();
    if inferred != definition.id {
        log::warn!(
            "constructor id mismatch for {}: declared {:08x}, computed {:08x}",
            definition.full_name(),
            definition.id,
            inferred,
        );
    }
}

fn compile_definition(definition: Definition, origin: Origin) -> Entry {
    let kind = match definition.category {
        Category::Types => Kind::Constructor,
        Category::Functions => Kind::Method,
    };

    let params: Vec<Param> = definition
        .params
        .iter()
        .map(|param| {
            let mut compiled = match &param.ty {
                ParameterType::Flags => Param::compile(&param.name, "#"),
                ParameterType::Normal { ty, flag } => {
                    let mut compiled = Param::compile(&param.name, &ty.to_string());
                    if let Some(flag) = flag {
                        compiled.flag = Some(FlagBit {
                            field: flag.name.clone(),
                            mask: flag.mask(),
                        });
                    }
                    compiled
                }
            };
            compiled.description = param.description.clone();
            compiled
        })
        .collect();

    // The td descriptions mark some method parameters as nullable;
    // those are recorded on the method entry itself.
    let nullable = if origin == Origin::Td && kind == Kind::Method {
        params
            .iter()
            .filter(|param| param.description.contains("may be null"))
            .map(|param| param.name.clone())
            .collect()
    } else {
        Vec::new()
    };

    Entry {
        name: definition.full_name(),
        id: definition.id,
        ty: definition.ty.to_string(),
        layer: definition.layer.unwrap_or(-1),
        params,
        origin,
        kind,
        description: definition.description,
        nullable,
    }
}

fn load_json(registry: &mut Registry, contents: &str, origin: Origin) -> Result<(), Error> {
    let root: serde_json::Value = serde_json::from_str(contents)?;

    for (key, kind, name_key) in [
        ("constructors", Kind::Constructor, "predicate"),
        ("methods", Kind::Method, "method"),
    ] {
        let Some(items) = root.get(key).and_then(|v| v.as_array()) else {
            continue;
        };
        for item in items {
            let entry = compile_json_entry(item, kind, name_key, origin.clone())?;
            registry.add(entry)?;
        }
    }
    Ok(())
}

fn compile_json_entry(
    item: &serde_json::Value,
    kind: Kind,
    name_key: &str,
    origin: Origin,
) -> Result<Entry, Error> {
    let invalid = |what: &str| Error::SchemaInvalid {
        reason: format!("json entry missing {}", what),
    };

    let name = item
        .get(name_key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| invalid(name_key))?;
    // Identifiers are numeric in the JSON flavour, and may be written
    // as negative numbers: they pack as signed little-endian int32.
    let id = item
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| invalid("id"))? as i32 as u32;
    let ty = item
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| invalid("type"))?;
    let layer = item.get("layer").and_then(|v| v.as_i64()).unwrap_or(-1) as i32;

    let mut params = Vec::new();
    if let Some(items) = item.get("params").and_then(|v| v.as_array()) {
        for param in items {
            let name = param
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| invalid("param name"))?;
            let ty = param
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| invalid("param type"))?;
            params.push(Param::compile(name, ty));
        }
    }

    Ok(Entry {
        name: name.into(),
        id,
        ty: ty.into(),
        layer,
        params,
        origin,
        kind,
        description: String::new(),
        nullable: Vec::new(),
    })
}
