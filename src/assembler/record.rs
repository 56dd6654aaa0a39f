use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A persisted value. References and child keys are stored in their
/// `short_name:id` text form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RecordValue {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDateTime),
    Reference(String),
    /// Key of a record in the owning record's child table.
    Child(String),
    List(Vec<RecordValue>),
}

/// Persisted form of an [`IMObject`](crate::model::IMObject).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub id: i64,
    pub archetype_id: String,
    pub version: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    /// Class property values keyed by node path (`/participations`).
    #[serde(default)]
    pub values: IndexMap<String, RecordValue>,
    #[serde(default)]
    pub details: IndexMap<String, RecordValue>,
    /// Child records owned by this record, keyed by reference. Only populated
    /// on the top-level record.
    #[serde(default)]
    pub children: IndexMap<String, ObjectRecord>,
}

impl ObjectRecord {
    pub fn short_name(&self) -> &str {
        let mut parts = self.archetype_id.splitn(3, '.');
        match (parts.next(), parts.next()) {
            (Some(entity), Some(concept)) => &self.archetype_id[..entity.len() + concept.len() + 1],
            _ => &self.archetype_id,
        }
    }

    pub fn reference_key(&self) -> String {
        format!("{}:{}", self.short_name(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeRecord {
    pub archetype_id: String,
    pub short_name: String,
    pub display_name: Option<String>,
    pub class_name: String,
    pub latest: bool,
    pub primary: bool,
    pub nodes: IndexMap<String, NodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub name: String,
    pub display_name: Option<String>,
    pub path: String,
    pub type_name: String,
    pub min_cardinality: i32,
    /// `-1` is unbounded.
    pub max_cardinality: i32,
    pub max_length: Option<i32>,
    pub base_name: Option<String>,
    pub filter: Option<String>,
    pub hidden: bool,
    pub read_only: bool,
    pub derived: bool,
    pub derived_value: Option<String>,
    pub parent_child: bool,
    pub default_value: Option<String>,
    pub assertions: Vec<AssertionRecord>,
    #[serde(default)]
    pub children: IndexMap<String, NodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRecord {
    pub name: String,
    pub error_message: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    /// Name/value list entries; names may repeat.
    #[serde(default)]
    pub entries: Vec<(String, String)>,
}
