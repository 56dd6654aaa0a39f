//! Archetype definition loading.
//!
//! Reads the archetype XML format:
//!
//! ```xml
//! <archetypes>
//!   <archetype name="party.patientpet.1.0" latest="true"
//!              type="org.openvpms.component.business.domain.im.party.Party"
//!              displayName="Patient(Pet)">
//!     <node name="name" path="/name" type="java.lang.String" minCardinality="1"/>
//!     <node name="species" path="/details/species" type="java.lang.String">
//!       <assertion name="lookup.local">
//!         <propertyList name="entries">
//!           <property name="CANINE" value="Canine"/>
//!         </propertyList>
//!       </assertion>
//!     </node>
//!   </archetype>
//! </archetypes>
//! ```
//!
//! A JSON array of serialized [`ArchetypeDescriptor`]s is accepted as well.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use walkdir::WalkDir;

use super::archetype::ArchetypeDescriptor;
use super::archetype_id::ArchetypeId;
use super::assertion::Assertion;
use super::node::NodeDescriptor;
use crate::error::{ArchetypeError, Result};

const XML_EXTENSIONS: &[&str] = &["adl", "xml"];

#[derive(Debug, Deserialize)]
struct RawArchetypes {
    #[serde(rename = "archetype", default)]
    archetypes: Vec<RawArchetype>,
}

#[derive(Debug, Deserialize)]
struct RawArchetype {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@latest", default)]
    latest: Option<bool>,
    #[serde(rename = "@primary", default)]
    primary: Option<bool>,
    #[serde(rename = "@type")]
    class_name: String,
    #[serde(rename = "@displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "node", default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "@path")]
    path: String,
    #[serde(rename = "@type")]
    type_name: String,
    #[serde(rename = "@minCardinality", default)]
    min_cardinality: Option<u32>,
    #[serde(rename = "@maxCardinality", default)]
    max_cardinality: Option<String>,
    #[serde(rename = "@maxLength", default)]
    max_length: Option<u32>,
    #[serde(rename = "@baseName", default)]
    base_name: Option<String>,
    #[serde(rename = "@filter", default)]
    filter: Option<String>,
    #[serde(rename = "@hidden", default)]
    hidden: Option<bool>,
    #[serde(rename = "@readOnly", default)]
    read_only: Option<bool>,
    #[serde(rename = "@derived", default)]
    derived: Option<bool>,
    #[serde(rename = "@derivedValue", default)]
    derived_value: Option<String>,
    #[serde(rename = "@parentChild", default)]
    parent_child: Option<bool>,
    #[serde(rename = "@defaultValue", default)]
    default_value: Option<String>,
    #[serde(rename = "assertion", default)]
    assertions: Vec<RawAssertion>,
    #[serde(rename = "node", default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawAssertion {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
    #[serde(rename = "property", default)]
    properties: Vec<RawProperty>,
    #[serde(rename = "propertyList", default)]
    lists: Vec<RawPropertyList>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@value", default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPropertyList {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "property", default)]
    properties: Vec<RawProperty>,
    #[serde(rename = "propertyMap", default)]
    maps: Vec<RawPropertyMap>,
}

#[derive(Debug, Deserialize)]
struct RawPropertyMap {
    #[serde(rename = "property", default)]
    properties: Vec<RawProperty>,
}

/// Archetype definition parser.
pub struct ArchetypeLoader;

impl ArchetypeLoader {
    /// Parse an `<archetypes>` XML document.
    pub fn parse_xml(xml: &str) -> Result<Vec<ArchetypeDescriptor>> {
        let raw: RawArchetypes = quick_xml::de::from_str(xml)?;
        raw.archetypes.into_iter().map(convert_archetype).collect()
    }

    /// Parse a JSON array of archetype descriptors.
    pub fn parse_json(json: &str) -> Result<Vec<ArchetypeDescriptor>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse `content`, choosing the format from the file extension of `path`.
    pub fn parse(path: &Path, content: &str) -> Result<Vec<ArchetypeDescriptor>> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::parse_json(content),
            Some(ext) if XML_EXTENSIONS.contains(&ext) => Self::parse_xml(content),
            _ => Err(ArchetypeError::Configuration {
                message: format!("unsupported archetype file {}", path.display()),
            }),
        }
    }

    /// Returns true if `path` has an archetype definition extension.
    pub fn is_archetype_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == "json" || XML_EXTENSIONS.contains(&ext))
    }

    /// Load a single file, or every archetype file below a directory
    /// (sorted by path, recursively).
    pub fn load_path(path: &Path) -> Result<Vec<ArchetypeDescriptor>> {
        if path.is_dir() {
            let mut descriptors = Vec::new();
            for file in Self::collect_files(path)? {
                descriptors.extend(Self::load_file(&file)?);
            }
            Ok(descriptors)
        } else {
            Self::load_file(path)
        }
    }

    fn load_file(path: &Path) -> Result<Vec<ArchetypeDescriptor>> {
        let content = std::fs::read_to_string(path)?;
        let descriptors = Self::parse(path, &content)?;
        tracing::debug!(
            "Loaded {} archetype(s) from {}",
            descriptors.len(),
            path.display()
        );
        Ok(descriptors)
    }

    /// Archetype files below `dir`, sorted by path.
    pub fn collect_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if Self::is_archetype_file(entry.path()) {
                files.push(entry.into_path());
            } else {
                tracing::warn!("Skipping non-archetype file {}", entry.path().display());
            }
        }
        Ok(files)
    }
}

fn convert_archetype(raw: RawArchetype) -> Result<ArchetypeDescriptor> {
    let archetype_id = ArchetypeId::parse(&raw.name)?;
    let nodes = convert_nodes(&raw.name, raw.nodes)?;
    Ok(ArchetypeDescriptor {
        archetype_id,
        display_name: raw.display_name,
        class_name: raw.class_name,
        latest: raw.latest.unwrap_or(true),
        primary: raw.primary.unwrap_or(true),
        nodes,
    })
}

fn convert_nodes(archetype: &str, raw: Vec<RawNode>) -> Result<IndexMap<String, NodeDescriptor>> {
    let mut nodes = IndexMap::with_capacity(raw.len());
    for raw_node in raw {
        let node = convert_node(archetype, raw_node)?;
        if nodes.contains_key(&node.name) {
            return Err(ArchetypeError::invalid_archetype(
                archetype.to_string(),
                format!("duplicate node {}", node.name),
            ));
        }
        nodes.insert(node.name.clone(), node);
    }
    Ok(nodes)
}

fn convert_node(archetype: &str, raw: RawNode) -> Result<NodeDescriptor> {
    let max_cardinality = match raw.max_cardinality.as_deref().map(str::trim) {
        None => Some(1),
        Some("*") | Some("-1") => None,
        Some(max) => Some(max.parse::<u32>().map_err(|_| {
            ArchetypeError::invalid_archetype(
                archetype.to_string(),
                format!("node {} has invalid maxCardinality {max}", raw.name),
            )
        })?),
    };

    let assertions = raw
        .assertions
        .into_iter()
        .map(|a| convert_assertion(archetype, &raw.name, a))
        .collect::<Result<Vec<_>>>()?;

    Ok(NodeDescriptor {
        children: convert_nodes(archetype, raw.nodes)?,
        name: raw.name,
        display_name: raw.display_name,
        path: raw.path,
        type_name: raw.type_name,
        min_cardinality: raw.min_cardinality.unwrap_or(0),
        max_cardinality,
        max_length: raw.max_length,
        base_name: raw.base_name,
        filter: raw.filter,
        hidden: raw.hidden.unwrap_or(false),
        read_only: raw.read_only.unwrap_or(false),
        derived: raw.derived.unwrap_or(false),
        derived_value: raw.derived_value,
        parent_child: raw.parent_child.unwrap_or(true),
        default_value: raw.default_value,
        assertions,
    })
}

fn convert_assertion(archetype: &str, node: &str, raw: RawAssertion) -> Result<Assertion> {
    let error_message = raw
        .error_message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    let property = |name: &str| {
        raw.properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.clone())
    };
    let invalid = |message: String| {
        ArchetypeError::invalid_archetype(archetype.to_string(), format!("node {node}: {message}"))
    };

    let assertion = match raw.name.as_str() {
        "regularExpression" => Assertion::RegularExpression {
            expression: property("expression")
                .ok_or_else(|| invalid("regularExpression requires an expression".to_string()))?,
            error_message,
        },
        "numericRange" => {
            let decimal = |name: &str| -> Result<Option<Decimal>> {
                property(name)
                    .map(|v| {
                        Decimal::from_str(v.trim())
                            .map_err(|_| invalid(format!("invalid {name} '{v}'")))
                    })
                    .transpose()
            };
            Assertion::NumericRange {
                min_value: decimal("minValue")?,
                max_value: decimal("maxValue")?,
                error_message,
            }
        }
        "lookup.local" => {
            let entries = raw
                .lists
                .iter()
                .filter(|l| l.name == "entries")
                .flat_map(|l| l.properties.iter())
                .map(|p| (p.name.clone(), p.value.clone().unwrap_or_default()))
                .collect();
            Assertion::LocalLookup {
                entries,
                error_message,
            }
        }
        "lookup" => Assertion::RemoteLookup {
            source: property("source")
                .ok_or_else(|| invalid("lookup requires a source".to_string()))?,
            error_message,
        },
        "archetypeRange" => {
            let short_names = raw
                .lists
                .iter()
                .filter(|l| l.name == "archetypes")
                .flat_map(|l| l.maps.iter())
                .flat_map(|m| m.properties.iter())
                .filter(|p| p.name == "shortName")
                .filter_map(|p| p.value.clone())
                .collect();
            Assertion::ArchetypeRange {
                short_names,
                error_message,
            }
        }
        _ => Assertion::Other {
            properties: raw
                .properties
                .iter()
                .map(|p| (p.name.clone(), p.value.clone().unwrap_or_default()))
                .collect(),
            name: raw.name.clone(),
            error_message,
        },
    };
    Ok(assertion)
}
