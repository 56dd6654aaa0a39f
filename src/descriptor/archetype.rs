use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::archetype_id::ArchetypeId;
use super::assertion::{Assertion, full_match_pattern};
use super::node::NodeDescriptor;
use crate::error::{ArchetypeError, Result};
use crate::model::ObjectClass;

fn default_true() -> bool {
    true
}

/// Schema for one kind of [`IMObject`](crate::model::IMObject).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeDescriptor {
    #[serde(rename = "name")]
    pub archetype_id: ArchetypeId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub class_name: String,
    #[serde(default = "default_true")]
    pub latest: bool,
    #[serde(default = "default_true")]
    pub primary: bool,
    /// Ordered by declaration; order is the default field order.
    #[serde(default)]
    pub nodes: IndexMap<String, NodeDescriptor>,
}

impl ArchetypeDescriptor {
    pub fn new(archetype_id: ArchetypeId, class_name: impl Into<String>) -> Self {
        Self {
            archetype_id,
            display_name: None,
            class_name: class_name.into(),
            latest: true,
            primary: true,
            nodes: IndexMap::new(),
        }
    }

    /// Convenience constructor for an archetype bound to a known class.
    pub fn for_class(id: &str, class: ObjectClass) -> Result<Self> {
        Ok(Self::new(ArchetypeId::parse(id)?, class.class_name()))
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_node(mut self, node: NodeDescriptor) -> Self {
        self.nodes.insert(node.name.clone(), node);
        self
    }

    pub fn short_name(&self) -> &str {
        self.archetype_id.short_name()
    }

    /// The display name, defaulting to the archetype concept.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.archetype_id.concept())
    }

    pub fn object_class(&self) -> Result<ObjectClass> {
        ObjectClass::from_class_name(&self.class_name).ok_or_else(|| {
            ArchetypeError::invalid_archetype(
                self.archetype_id.to_string(),
                format!("unsupported class {}", self.class_name),
            )
        })
    }

    pub fn node(&self, name: &str) -> Option<&NodeDescriptor> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.values()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    /// Check that the class is known, every node path resolves against it and
    /// every regular expression compiles.
    pub fn validate_structure(&self) -> Result<()> {
        let class = self.object_class()?;
        let id = self.archetype_id.to_string();

        for node in self.nodes.values() {
            if node.name.is_empty() {
                return Err(ArchetypeError::invalid_archetype(
                    id,
                    "node name cannot be empty".to_string(),
                ));
            }
            let Some(path) = node.value_path() else {
                return Err(ArchetypeError::invalid_archetype(
                    id,
                    format!("node {} has malformed path {}", node.name, node.path),
                ));
            };
            if !path.is_valid_for(class) {
                return Err(ArchetypeError::invalid_archetype(
                    id,
                    format!(
                        "node {} path {} does not resolve against {}",
                        node.name, node.path, class
                    ),
                ));
            }
            if let Some(max) = node.max_cardinality {
                if max < node.min_cardinality {
                    return Err(ArchetypeError::invalid_archetype(
                        id,
                        format!(
                            "node {} has min cardinality {} above max {}",
                            node.name, node.min_cardinality, max
                        ),
                    ));
                }
            }
            validate_assertions(&id, node)?;
        }
        Ok(())
    }
}

fn validate_assertions(id: &str, node: &NodeDescriptor) -> Result<()> {
    for assertion in &node.assertions {
        if let Assertion::RegularExpression { expression, .. } = assertion {
            if let Err(e) = full_match_pattern(expression) {
                return Err(ArchetypeError::invalid_archetype(
                    id.to_string(),
                    format!("node {} has invalid expression: {e}", node.name),
                ));
            }
        }
    }
    for child in node.children.values() {
        validate_assertions(id, child)?;
    }
    Ok(())
}

impl fmt::Display for ArchetypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchetypeDescriptor({})", self.archetype_id)?;
        if let Some(name) = &self.display_name {
            write!(f, " - {name}")?;
        }
        Ok(())
    }
}
