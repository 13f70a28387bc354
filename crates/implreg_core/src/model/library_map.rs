//! Library-keyed payload maps.
//!
//! # Responsibility
//! - Hold one contribution: library name -> ordered entries.
//! - Describe the two documentation channels and their entry shapes.
//!
//! # Invariants
//! - Keys are unique; inserting an existing key replaces its entries.
//! - Entries keep insertion order; no sorting and no deduplication.

use crate::model::implementor::Implementor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mapping from library name to its ordered entries.
///
/// Serialized transparently as a JSON object of arrays, which is the same
/// shape fragment scripts carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryMap<E> {
    libraries: BTreeMap<String, Vec<E>>,
}

/// Implementor entries keyed by library name.
pub type ImplementorMap = LibraryMap<Implementor>;

/// Type implementation blocks keyed by library name.
pub type TypeImplMap = LibraryMap<TypeImpl>;

impl<E> Default for LibraryMap<E> {
    fn default() -> Self {
        Self {
            libraries: BTreeMap::new(),
        }
    }
}

impl<E> LibraryMap<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used for literal construction.
    pub fn with_library(mut self, library: impl Into<String>, entries: Vec<E>) -> Self {
        self.insert(library, entries);
        self
    }

    /// Sets the entries for one library, returning the replaced entries.
    pub fn insert(&mut self, library: impl Into<String>, entries: Vec<E>) -> Option<Vec<E>> {
        self.libraries.insert(library.into(), entries)
    }

    /// Appends one entry to a library, creating the library when missing.
    pub fn push(&mut self, library: impl Into<String>, entry: E) {
        self.libraries.entry(library.into()).or_default().push(entry);
    }

    pub fn get(&self, library: &str) -> Option<&[E]> {
        self.libraries.get(library).map(Vec::as_slice)
    }

    pub fn contains_library(&self, library: &str) -> bool {
        self.libraries.contains_key(library)
    }

    /// Returns sorted library names.
    pub fn library_names(&self) -> Vec<&str> {
        self.libraries.keys().map(String::as_str).collect()
    }

    /// Number of libraries in this map.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Total number of entries across all libraries.
    pub fn entry_count(&self) -> usize {
        self.libraries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[E])> {
        self.libraries
            .iter()
            .map(|(library, entries)| (library.as_str(), entries.as_slice()))
    }
}

impl<E> IntoIterator for LibraryMap<E> {
    type Item = (String, Vec<E>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.libraries.into_iter()
    }
}

impl<E, K: Into<String>> FromIterator<(K, Vec<E>)> for LibraryMap<E> {
    fn from_iter<I: IntoIterator<Item = (K, Vec<E>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (library, entries) in iter {
            map.insert(library, entries);
        }
        map
    }
}

/// One type implementation block from the `type_impls` channel.
///
/// Wire shape is an array `[html, trait_name, alias...]`. Inherent impls carry
/// `0` in the trait slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct TypeImpl {
    /// Rendered impl block; opaque.
    pub html: String,
    /// Implemented trait as displayed, e.g. `Clone` or `From<T>`; `None` for
    /// an inherent impl.
    pub trait_name: Option<String>,
    /// Fully qualified aliases the block applies to.
    pub aliases: Vec<String>,
}

impl TypeImpl {
    pub fn new(html: impl Into<String>, trait_name: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            trait_name: Some(trait_name.into()),
            aliases: Vec::new(),
        }
    }

    /// Block of an impl with no trait.
    pub fn inherent(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            trait_name: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Type-impl array that is not `[html, trait_name, alias...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeImplShapeError(pub String);

impl Display for TypeImplShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed type impl entry: {}", self.0)
    }
}

impl Error for TypeImplShapeError {}

impl TryFrom<Vec<Value>> for TypeImpl {
    type Error = TypeImplShapeError;

    fn try_from(value: Vec<Value>) -> Result<Self, Self::Error> {
        let len = value.len();
        let mut parts = value.into_iter();
        let (Some(html), Some(trait_slot)) = (parts.next(), parts.next()) else {
            return Err(TypeImplShapeError(format!(
                "needs html and trait slot, got {len} elements"
            )));
        };
        let html = match html {
            Value::String(html) => html,
            other => {
                return Err(TypeImplShapeError(format!(
                    "html must be a string, got {other}"
                )))
            }
        };
        let trait_name = match trait_slot {
            Value::String(name) => Some(name),
            _ => None,
        };
        let aliases = parts
            .map(|alias| match alias {
                Value::String(alias) => Ok(alias),
                other => Err(TypeImplShapeError(format!(
                    "alias must be a string, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            html,
            trait_name,
            aliases,
        })
    }
}

impl From<TypeImpl> for Vec<Value> {
    fn from(value: TypeImpl) -> Self {
        let mut parts = Vec::with_capacity(2 + value.aliases.len());
        parts.push(Value::String(value.html));
        parts.push(value.trait_name.map_or_else(|| Value::from(0), Value::String));
        parts.extend(value.aliases.into_iter().map(Value::String));
        parts
    }
}

/// Documentation channel a fragment contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Trait implementor lists (`implementors/`, `trait.impl/`).
    Implementors,
    /// Impl blocks attached to type aliases (`type.impl/`).
    TypeImpls,
}

impl Channel {
    /// Script variable name, also the stable channel id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Implementors => "implementors",
            Self::TypeImpls => "type_impls",
        }
    }

    /// Global registration function fragments call when it exists.
    pub fn register_fn(self) -> &'static str {
        match self {
            Self::Implementors => "register_implementors",
            Self::TypeImpls => "register_type_impls",
        }
    }

    /// Global slot fragments write to when no handler exists yet.
    pub fn pending_global(self) -> &'static str {
        match self {
            Self::Implementors => "pending_implementors",
            Self::TypeImpls => "pending_type_impls",
        }
    }

    /// Parses a script variable name into a channel.
    pub fn from_var_name(value: &str) -> Option<Self> {
        match value.trim() {
            "implementors" => Some(Self::Implementors),
            "type_impls" => Some(Self::TypeImpls),
            _ => None,
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Channel, ImplementorMap, LibraryMap, TypeImpl};
    use crate::model::Implementor;
    use serde_json::json;

    #[test]
    fn push_keeps_entry_order() {
        let mut map = ImplementorMap::new();
        map.push("lurk", Implementor::new("impl Copy for B"));
        map.push("lurk", Implementor::new("impl Copy for A"));

        let texts: Vec<&str> = map
            .get("lurk")
            .expect("library present")
            .iter()
            .map(Implementor::text)
            .collect();
        assert_eq!(texts, ["impl Copy for B", "impl Copy for A"]);
        assert_eq!(map.entry_count(), 2);
        assert!(map.contains_library("lurk"));
        assert!(!map.contains_library("fcomm"));
    }

    #[test]
    fn serializes_as_plain_object_of_arrays() {
        let map = LibraryMap::new().with_library("lib1", vec!["X".to_string()]);
        let json = serde_json::to_value(&map).expect("map should serialize");
        assert_eq!(json, json!({ "lib1": ["X"] }));
    }

    #[test]
    fn type_impl_uses_array_wire_shape() {
        let value = json!(["<section>", "Clone", "lurk::A", "lurk::B"]);
        let decoded: TypeImpl = serde_json::from_value(value.clone()).expect("valid entry");
        assert_eq!(decoded.trait_name.as_deref(), Some("Clone"));
        assert_eq!(decoded.aliases, ["lurk::A", "lurk::B"]);
        assert_eq!(serde_json::to_value(&decoded).expect("serialize"), value);
    }

    #[test]
    fn inherent_type_impl_keeps_zero_trait_slot() {
        let value = json!(["<details></details>", 0, "lurk::hash_witness::ConsCircuitWitness"]);
        let decoded: TypeImpl = serde_json::from_value(value.clone()).expect("inherent entry");
        assert_eq!(decoded.trait_name, None);
        assert_eq!(decoded.aliases, ["lurk::hash_witness::ConsCircuitWitness"]);
        assert_eq!(serde_json::to_value(&decoded).expect("serialize"), value);
        assert_eq!(
            serde_json::to_value(TypeImpl::inherent("<h3>")).expect("serialize"),
            json!(["<h3>", 0])
        );
    }

    #[test]
    fn type_impl_rejects_short_arrays() {
        let err = serde_json::from_value::<TypeImpl>(json!(["<section>"]))
            .expect_err("one element is not a type impl");
        assert!(err.to_string().contains("needs html and trait slot"));
        assert!(serde_json::from_value::<TypeImpl>(json!([1, "Clone"])).is_err());
    }

    #[test]
    fn channel_names_match_script_globals() {
        assert_eq!(
            Channel::from_var_name("type_impls"),
            Some(Channel::TypeImpls)
        );
        assert_eq!(Channel::Implementors.register_fn(), "register_implementors");
        assert_eq!(Channel::TypeImpls.pending_global(), "pending_type_impls");
        assert_eq!(Channel::from_var_name("search_index"), None);
    }
}
