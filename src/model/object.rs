use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::class::{ObjectClass, PropertyKind};
use super::path::ValuePath;
use super::reference::ObjectReference;
use super::value::Value;
use crate::descriptor::ArchetypeId;
use crate::error::{ArchetypeError, PropertyResolverError, Result};

/// A generic business object bound to exactly one archetype.
///
/// The concrete [`ObjectClass`] fixes which class-level properties exist; the
/// archetype descriptor decides which of them, and which `details` entries,
/// are meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IMObject {
    pub id: i64,
    pub archetype_id: ArchetypeId,
    pub class: ObjectClass,
    /// Zero until the first save.
    pub version: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub details: IndexMap<String, Value>,
}

impl IMObject {
    pub fn new(archetype_id: ArchetypeId, class: ObjectClass, id: i64) -> Self {
        Self {
            id,
            archetype_id,
            class,
            version: 0,
            name: None,
            description: None,
            active: true,
            properties: IndexMap::new(),
            details: IndexMap::new(),
        }
    }

    pub fn short_name(&self) -> &str {
        self.archetype_id.short_name()
    }

    pub fn reference(&self) -> ObjectReference {
        ObjectReference::new(self.short_name(), self.id)
    }

    pub fn is_a(&self, patterns: &[&str]) -> bool {
        crate::descriptor::is_a(self.short_name(), patterns)
    }

    pub fn is_new(&self) -> bool {
        self.version == 0
    }

    fn check_property(&self, path: &ValuePath) -> Result<()> {
        if path.is_valid_for(self.class) {
            Ok(())
        } else {
            Err(PropertyResolverError::invalid_property(format!(
                "{}{}",
                self.short_name(),
                path
            ))
            .into())
        }
    }

    /// Read the value at `path`. Unset values read as [`Value::Null`], unset
    /// collections as an empty collection.
    pub fn get(&self, path: &ValuePath) -> Result<Value> {
        self.check_property(path)?;
        let value = match path {
            ValuePath::Id => Value::Integer(self.id),
            ValuePath::Name => Value::from(self.name.clone()),
            ValuePath::Description => Value::from(self.description.clone()),
            ValuePath::Active => Value::Boolean(self.active),
            ValuePath::Property(name) => match self.properties.get(name) {
                Some(value) => value.clone(),
                None if self.is_collection_property(name) => Value::Collection(Vec::new()),
                None => Value::Null,
            },
            ValuePath::Detail(key) => self.details.get(key).cloned().unwrap_or_default(),
        };
        Ok(value)
    }

    /// Write `value` at `path`. Setting a detail or property to null removes it.
    pub fn set(&mut self, path: &ValuePath, value: Value) -> Result<()> {
        self.check_property(path)?;
        match path {
            ValuePath::Id => match value {
                Value::Integer(id) => self.id = id,
                other => return Err(self.mismatch(path, "integer", &other)),
            },
            ValuePath::Name => self.name = self.optional_string(path, value)?,
            ValuePath::Description => self.description = self.optional_string(path, value)?,
            ValuePath::Active => match value {
                Value::Boolean(active) => self.active = active,
                Value::Null => self.active = false,
                other => return Err(self.mismatch(path, "boolean", &other)),
            },
            ValuePath::Property(name) => {
                if value.is_null() {
                    self.properties.shift_remove(name);
                } else {
                    self.properties.insert(name.clone(), value);
                }
            }
            ValuePath::Detail(key) => {
                if value.is_null() {
                    self.details.shift_remove(key);
                } else {
                    self.details.insert(key.clone(), value);
                }
            }
        }
        Ok(())
    }

    /// The elements of the collection at `path`; empty if unset.
    pub fn collection(&self, path: &ValuePath) -> Result<&[Value]> {
        self.check_property(path)?;
        let slot = match path {
            ValuePath::Property(name) => self.properties.get(name),
            ValuePath::Detail(key) => self.details.get(key),
            _ => return Err(self.not_a_collection(path)),
        };
        match slot {
            None => Ok(&[]),
            Some(Value::Collection(items)) => Ok(items),
            Some(_) => Err(self.not_a_collection(path)),
        }
    }

    /// Mutable access to the collection at `path`, creating it when unset.
    pub fn collection_mut(&mut self, path: &ValuePath) -> Result<&mut Vec<Value>> {
        self.check_property(path)?;
        let not_a_collection = self.not_a_collection(path);
        let slot = match path {
            ValuePath::Property(name) => self
                .properties
                .entry(name.clone())
                .or_insert_with(|| Value::Collection(Vec::new())),
            ValuePath::Detail(key) => self
                .details
                .entry(key.clone())
                .or_insert_with(|| Value::Collection(Vec::new())),
            _ => return Err(not_a_collection),
        };
        match slot {
            Value::Collection(items) => Ok(items),
            _ => Err(not_a_collection),
        }
    }

    fn is_collection_property(&self, name: &str) -> bool {
        self.class
            .property(name)
            .is_some_and(|p| p.kind == PropertyKind::Collection)
    }

    fn optional_string(&self, path: &ValuePath, value: Value) -> Result<Option<String>> {
        match value {
            Value::String(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            other => Err(self.mismatch(path, "string", &other)),
        }
    }

    fn mismatch(&self, path: &ValuePath, expected: &str, value: &Value) -> ArchetypeError {
        ArchetypeError::type_coercion(
            format!("{}{}", self.short_name(), path),
            expected.to_string(),
            value.type_name().to_string(),
        )
    }

    fn not_a_collection(&self, path: &ValuePath) -> ArchetypeError {
        ArchetypeError::invalid_collection_operation(
            format!("{}{}", self.short_name(), path),
            "not a collection".to_string(),
        )
    }
}

impl fmt::Display for IMObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())?;
        if let Some(name) = &self.name {
            write!(f, " - {name}")?;
        }
        Ok(())
    }
}
