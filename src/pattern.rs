//! Dependency pattern representation
//!
//! A `DependencyPattern` is an ordered list of node descriptors: the root
//! first, then every other node with a link to a node listed before it.
//! The serialized form is what dependency-tree matchers consume:
//!
//! ```text
//! [{"SPEC": {"NODE_NAME": "node0"}, "PATTERN": {"DEP": "ROOT", "TAG": "VBD"}},
//!  {"SPEC": {"NODE_NAME": "node1", "NBOR_NAME": "node0", "NBOR_RELOP": ">"},
//!   "PATTERN": {"DEP": "nsubj", "TAG": "NN"}}]
//! ```

use crate::tree::WordId;
use rustc_hash::FxHashSet;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Index;

/// Relation between a node and its neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationType {
    /// The node is an immediate dependent of its neighbor
    #[serde(rename = ">")]
    Child,
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationType::Child => write!(f, ">"),
        }
    }
}

/// Name used for the node matching word `id`
pub fn node_name(id: WordId) -> String {
    format!("node{}", id)
}

/// Attribute constraints of one node, kept in the order they were added
///
/// Serializes as a JSON object whose keys follow insertion order, so a
/// feature dictionary's key order survives into the pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Set `key`, replacing an earlier value in place
    pub fn insert(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<&str> for Attributes {
    type Output = String;

    fn index(&self, key: &str) -> &String {
        match self.0.iter().find(|(k, _)| k == key) {
            Some((_, value)) => value,
            None => panic!("no attribute named {}", key),
        }
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}

impl IntoIterator for Attributes {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct AttributesVisitor;

impl<'de> Visitor<'de> for AttributesVisitor {
    type Value = Attributes;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map of string attributes")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Attributes, A::Error> {
        let mut attrs = Attributes::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            attrs.insert(key, value);
        }
        Ok(attrs)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributesVisitor)
    }
}

/// Structural part of a pattern element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "NODE_NAME")]
    pub node_name: String,
    #[serde(rename = "NBOR_NAME", default, skip_serializing_if = "Option::is_none")]
    pub nbor_name: Option<String>,
    #[serde(rename = "NBOR_RELOP", default, skip_serializing_if = "Option::is_none")]
    pub nbor_relop: Option<RelationType>,
}

/// One node of a dependency pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternElement {
    #[serde(rename = "SPEC")]
    pub spec: NodeSpec,
    #[serde(rename = "PATTERN")]
    pub pattern: Attributes,
}

impl PatternElement {
    /// The anchor node: a name and attributes, no neighbor
    pub fn root(node_name: String, pattern: Attributes) -> Self {
        Self {
            spec: NodeSpec {
                node_name,
                nbor_name: None,
                nbor_relop: None,
            },
            pattern,
        }
    }

    /// A node that is a child of the node named `parent`
    pub fn child(node_name: String, parent: String, pattern: Attributes) -> Self {
        Self {
            spec: NodeSpec {
                node_name,
                nbor_name: Some(parent),
                nbor_relop: Some(RelationType::Child),
            },
            pattern,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.spec.node_name
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.spec.nbor_name.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.spec.nbor_name.is_none() && self.spec.nbor_relop.is_none()
    }
}

/// Ordered pattern elements, root first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyPattern {
    elements: Vec<PatternElement>,
}

impl DependencyPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: PatternElement) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[PatternElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// First element, the pattern's anchor
    pub fn root(&self) -> Option<&PatternElement> {
        self.elements.first()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.elements.iter().map(PatternElement::node_name).collect()
    }

    /// Whether only the first element is unlinked and every link points
    /// to a node named earlier in the pattern
    pub fn is_root_first(&self) -> bool {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for (i, element) in self.elements.iter().enumerate() {
            let linked_ok = match (i, element.parent_name()) {
                (0, None) => element.is_root(),
                (0, Some(_)) | (_, None) => false,
                (_, Some(parent)) => {
                    seen.contains(parent) && element.spec.nbor_relop.is_some()
                }
            };
            if !linked_ok || !seen.insert(element.node_name()) {
                return false;
            }
        }
        true
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl<'a> IntoIterator for &'a DependencyPattern {
    type Item = &'a PatternElement;
    type IntoIter = std::slice::Iter<'a, PatternElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl From<Vec<PatternElement>> for DependencyPattern {
    fn from(elements: Vec<PatternElement>) -> Self {
        Self { elements }
    }
}
