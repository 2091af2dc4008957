// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::collections::{BTreeSet, HashMap};

use super::{Entry, Kind};
use crate::errors::Error;

/// An index of compiled schema entries.
///
/// Effectively read-only after loading: lookups by identifier, by
/// predicate name (layer-aware), by type (for `%T` bare discipline)
/// and by method name.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,

    ctor_by_id: HashMap<u32, usize>,
    /// Indices sorted ascending by layer (`-1`, the unversioned
    /// marker, sorts first).
    ctor_by_name: HashMap<String, Vec<usize>>,
    ctor_by_type: HashMap<String, Vec<usize>>,

    method_by_id: HashMap<u32, usize>,
    method_by_name: HashMap<String, Vec<usize>>,

    method_namespaces: BTreeSet<String>,
    namespace_by_method: HashMap<String, String>,

    secret_layer: i32,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            secret_layer: -1,
            ..Self::default()
        }
    }

    /// Adds an entry, keeping every index in sync.
    ///
    /// Identifiers must be unique within a registry. An entry that
    /// redeclares an existing identifier under the same name is
    /// dropped silently (layered schemas repeat declarations);
    /// a collision between different names is a schema error.
    pub fn add(&mut self, entry: Entry) -> Result<(), Error> {
        let by_id = match entry.kind {
            Kind::Constructor => &mut self.ctor_by_id,
            Kind::Method => &mut self.method_by_id,
        };
        if let Some(&existing) = by_id.get(&entry.id) {
            if self.entries[existing].name == entry.name {
                return Ok(());
            }
            return Err(Error::SchemaInvalid {
                reason: format!(
                    "constructor id {:08x} declared by both {} and {}",
                    entry.id, self.entries[existing].name, entry.name
                ),
            });
        }

        let index = self.entries.len();
        by_id.insert(entry.id, index);

        if entry.origin == super::Origin::Secret {
            self.secret_layer = self.secret_layer.max(entry.layer);
        }

        match entry.kind {
            Kind::Constructor => {
                insert_by_layer(
                    self.ctor_by_name.entry(entry.name.clone()).or_default(),
                    &self.entries,
                    index,
                    entry.layer,
                );
                self.ctor_by_type
                    .entry(entry.ty.clone())
                    .or_default()
                    .push(index);
            }
            Kind::Method => {
                insert_by_layer(
                    self.method_by_name.entry(entry.name.clone()).or_default(),
                    &self.entries,
                    index,
                    entry.layer,
                );
                if let Some(pos) = entry.name.rfind('.') {
                    let namespace = entry.name[..pos].to_string();
                    self.namespace_by_method
                        .insert(entry.name.clone(), namespace.clone());
                    self.method_namespaces.insert(namespace);
                }
            }
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn constructor_by_id(&self, id: u32) -> Option<&Entry> {
        self.ctor_by_id.get(&id).map(|&i| &self.entries[i])
    }

    pub fn method_by_id(&self, id: u32) -> Option<&Entry> {
        self.method_by_id.get(&id).map(|&i| &self.entries[i])
    }

    /// Finds a constructor by its exact predicate name.
    ///
    /// With `layer == -1` any version matches and the newest wins;
    /// otherwise the entry with the highest layer not above the
    /// requested one is returned (unversioned entries always match).
    pub fn constructor_by_predicate(&self, name: &str, layer: i32) -> Option<&Entry> {
        self.pick(self.ctor_by_name.get(name)?, layer)
    }

    /// Finds a method by its exact name, with the same layer rules as
    /// [`Registry::constructor_by_predicate`].
    pub fn method_by_name(&self, name: &str, layer: i32) -> Option<&Entry> {
        self.pick(self.method_by_name.get(name)?, layer)
    }

    fn pick(&self, candidates: &[usize], layer: i32) -> Option<&Entry> {
        if layer == -1 {
            return candidates.last().map(|&i| &self.entries[i]);
        }
        candidates
            .iter()
            .rev()
            .find(|&&i| self.entries[i].layer <= layer)
            // Nothing at or below the requested layer: fall back to
            // the oldest so lookups never fail on layer alone.
            .or(candidates.first())
            .map(|&i| &self.entries[i])
    }

    /// Any constructor whose result type equals the argument, used for
    /// `%T` bare discipline.
    pub fn constructor_by_type(&self, ty: &str) -> Option<&Entry> {
        self.ctor_by_type
            .get(ty)?
            .first()
            .map(|&i| &self.entries[i])
    }

    /// The representative constructor of a type, only if it is the
    /// sole constructor of that type.
    pub fn unique_constructor_by_type(&self, ty: &str) -> Option<&Entry> {
        match self.ctor_by_type.get(ty)?.as_slice() {
            [index] => Some(&self.entries[*index]),
            _ => None,
        }
    }

    /// The namespaces of every dotted method name.
    pub fn method_namespaces(&self) -> impl Iterator<Item = &str> {
        self.method_namespaces.iter().map(|ns| ns.as_str())
    }

    /// The namespace of a dotted method name, if it has one.
    pub fn namespace_of_method(&self, method: &str) -> Option<&str> {
        self.namespace_by_method.get(method).map(|ns| ns.as_str())
    }

    /// The highest layer seen among secret-origin entries; `-1` until
    /// one is loaded. Monotonically non-decreasing during load.
    pub fn secret_layer(&self) -> i32 {
        self.secret_layer
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keeps a name's candidate list sorted ascending by layer.
fn insert_by_layer(candidates: &mut Vec<usize>, entries: &[Entry], index: usize, layer: i32) {
    let pos = candidates
        .iter()
        .position(|&i| entries[i].layer > layer)
        .unwrap_or(candidates.len());
    candidates.insert(pos, index);
}

#[cfg(test)]
mod tests {
    use super::super::{Origin, Param};
    use super::*;

    fn entry(name: &str, id: u32, ty: &str, layer: i32, kind: Kind) -> Entry {
        Entry {
            name: name.into(),
            id,
            ty: ty.into(),
            layer,
            params: Vec::new(),
            origin: Origin::Api,
            kind,
            description: String::new(),
            nullable: Vec::new(),
        }
    }

    #[test]
    fn check_duplicate_ids() {
        let mut registry = Registry::new();
        registry
            .add(entry("foo", 1, "Foo", -1, Kind::Constructor))
            .unwrap();
        // Same name, same id: a layered redeclaration, dropped.
        registry
            .add(entry("foo", 1, "Foo", 20, Kind::Constructor))
            .unwrap();
        // Different name, same id: a corrupt schema.
        assert!(matches!(
            registry.add(entry("bar", 1, "Bar", -1, Kind::Constructor)),
            Err(Error::SchemaInvalid { .. })
        ));
    }

    #[test]
    fn check_layer_selection() {
        let mut registry = Registry::new();
        registry
            .add(entry("thing", 10, "Thing", 8, Kind::Constructor))
            .unwrap();
        registry
            .add(entry("thing", 20, "Thing", 17, Kind::Constructor))
            .unwrap();
        registry
            .add(entry("thing", 30, "Thing", 45, Kind::Constructor))
            .unwrap();

        assert_eq!(registry.constructor_by_predicate("thing", -1).unwrap().id, 30);
        assert_eq!(registry.constructor_by_predicate("thing", 17).unwrap().id, 20);
        assert_eq!(registry.constructor_by_predicate("thing", 30).unwrap().id, 20);
        assert_eq!(registry.constructor_by_predicate("thing", 100).unwrap().id, 30);
        // Below every declared layer: the oldest is better than none.
        assert_eq!(registry.constructor_by_predicate("thing", 2).unwrap().id, 10);
        assert!(registry.constructor_by_predicate("missing", -1).is_none());
    }

    #[test]
    fn check_method_namespaces() {
        let mut registry = Registry::new();
        registry
            .add(entry("messages.sendMessage", 1, "Updates", -1, Kind::Method))
            .unwrap();
        registry
            .add(entry("messages.deleteHistory", 2, "Ok", -1, Kind::Method))
            .unwrap();
        registry
            .add(entry("ping", 3, "Pong", -1, Kind::Method))
            .unwrap();

        let namespaces: Vec<&str> = registry.method_namespaces().collect();
        assert_eq!(namespaces, ["messages"]);
        assert_eq!(
            registry.namespace_of_method("messages.sendMessage"),
            Some("messages")
        );
        assert_eq!(registry.namespace_of_method("ping"), None);
    }

    #[test]
    fn check_unique_constructor_by_type() {
        let mut registry = Registry::new();
        registry
            .add(entry("pong", 1, "Pong", -1, Kind::Constructor))
            .unwrap();
        registry
            .add(entry("boolTrue", 2, "Bool", -1, Kind::Constructor))
            .unwrap();
        registry
            .add(entry("boolFalse", 3, "Bool", -1, Kind::Constructor))
            .unwrap();

        assert_eq!(registry.unique_constructor_by_type("Pong").unwrap().id, 1);
        assert!(registry.unique_constructor_by_type("Bool").is_none());
        assert!(registry.constructor_by_type("Bool").is_some());
    }

    #[test]
    fn check_entry_param_lookup() {
        let mut e = entry("ping", 1, "Pong", -1, Kind::Method);
        e.params.push(Param::compile("ping_id", "long"));
        assert_eq!(e.param("ping_id").unwrap().ty, "long");
        assert!(e.param("nope").is_none());
    }
}
