use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::assertion::{Assertion, LookupSource};
use super::short_name;
use super::value_type::ValueType;
use crate::model::{Value, ValuePath};

pub const DEFAULT_MAX_LENGTH: u32 = 255;

fn default_max_cardinality() -> Option<u32> {
    Some(1)
}

fn default_true() -> bool {
    true
}

/// A single field of an archetype: a named value path with type, cardinality
/// and assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub path: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub min_cardinality: u32,
    /// `None` means unbounded.
    #[serde(default = "default_max_cardinality")]
    pub max_cardinality: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub base_name: Option<String>,
    /// Short name pattern selecting this node's elements from a shared collection.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub derived: bool,
    #[serde(default)]
    pub derived_value: Option<String>,
    #[serde(default = "default_true")]
    pub parent_child: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    #[serde(default)]
    pub children: IndexMap<String, NodeDescriptor>,
}

impl NodeDescriptor {
    pub fn new(name: &str, path: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: None,
            path: path.to_string(),
            type_name: type_name.to_string(),
            min_cardinality: 0,
            max_cardinality: Some(1),
            max_length: None,
            base_name: None,
            filter: None,
            hidden: false,
            read_only: false,
            derived: false,
            derived_value: None,
            parent_child: true,
            default_value: None,
            assertions: Vec::new(),
            children: IndexMap::new(),
        }
    }

    /// Create a node with specific cardinality
    pub fn with_cardinality(mut self, min: u32, max: Option<u32>) -> Self {
        self.min_cardinality = min;
        self.max_cardinality = max;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    pub fn with_default_value(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    pub fn with_child(mut self, child: NodeDescriptor) -> Self {
        self.children.insert(child.name.clone(), child);
        self
    }

    /// Hold elements by reference instead of owning them.
    pub fn by_reference(mut self) -> Self {
        self.parent_child = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn value_type(&self) -> ValueType {
        ValueType::from_class_name(&self.type_name)
    }

    /// The parsed value path, or `None` if the path is malformed.
    pub fn value_path(&self) -> Option<ValuePath> {
        ValuePath::parse(&self.path)
    }

    /// The display name, falling back to the de-camel-cased node name
    /// (`firstName` -> `First Name`).
    pub fn display_name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => uncamel(&self.name),
        }
    }

    pub fn is_collection(&self) -> bool {
        self.value_type() == ValueType::Collection
    }

    pub fn is_required(&self) -> bool {
        self.min_cardinality > 0
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_cardinality.is_none()
    }

    pub fn is_object_reference(&self) -> bool {
        self.value_type() == ValueType::Reference
    }

    pub fn is_lookup(&self) -> bool {
        self.lookup_source().is_some()
    }

    pub fn lookup_source(&self) -> Option<LookupSource<'_>> {
        self.assertions.iter().find_map(Assertion::lookup_source)
    }

    pub fn effective_max_length(&self) -> u32 {
        self.max_length.unwrap_or(DEFAULT_MAX_LENGTH)
    }

    /// Allowed short names for this node's elements: the archetype range
    /// assertion if present, else the filter.
    pub fn archetype_range(&self) -> Vec<&str> {
        let range: Vec<&str> = self
            .assertions
            .iter()
            .filter_map(|a| match a {
                Assertion::ArchetypeRange { short_names, .. } => Some(short_names),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
            .collect();
        if range.is_empty() {
            self.filter.as_deref().into_iter().collect()
        } else {
            range
        }
    }

    /// Returns true if `element` belongs to this node. Nodes without a filter
    /// accept every element of their collection.
    pub fn accepts(&self, element: &Value) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        match element {
            Value::Object(object) => short_name::matches(filter, object.short_name()),
            Value::Reference(reference) => short_name::matches(filter, reference.short_name()),
            _ => false,
        }
    }

    /// The elements of `collection` that belong to this node.
    pub fn select<'v>(&self, collection: &'v [Value]) -> impl Iterator<Item = &'v Value> {
        collection.iter().filter(move |e| self.accepts(e))
    }

    pub fn child(&self, name: &str) -> Option<&NodeDescriptor> {
        self.children.get(name)
    }

    /// The default value with surrounding single quotes removed
    /// (`'IN_PROGRESS'` -> `IN_PROGRESS`).
    pub fn default_literal(&self) -> Option<&str> {
        self.default_value.as_deref().map(|v| {
            v.strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .unwrap_or(v)
        })
    }
}

fn uncamel(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            result.extend(c.to_uppercase());
        } else {
            if c.is_uppercase() {
                result.push(' ');
            }
            result.push(c);
        }
    }
    result
}
