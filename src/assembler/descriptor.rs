use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::map::MapAssembler;
use super::record::{ArchetypeRecord, AssertionRecord, NodeRecord};
use super::{Assembler, AssemblyContext};
use crate::descriptor::{ArchetypeDescriptor, ArchetypeId, Assertion, NodeDescriptor};
use crate::error::{ArchetypeError, Result};

/// Assembles archetype descriptors to and from their records. Nodes and
/// their nested children go through [`MapAssembler`].
#[derive(Debug, Clone, Default)]
pub struct ArchetypeDescriptorAssembler {
    nodes: MapAssembler<NodeAssembler>,
}

impl ArchetypeDescriptorAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update an existing record in place, dropping nodes the descriptor no
    /// longer declares.
    pub fn update_record(
        &self,
        record: &mut ArchetypeRecord,
        descriptor: &ArchetypeDescriptor,
        context: &mut AssemblyContext,
    ) -> Result<()> {
        if record.archetype_id != descriptor.archetype_id.qualified_name() {
            return Err(ArchetypeError::assembly(format!(
                "cannot update record {} from {}",
                record.archetype_id, descriptor.archetype_id
            )));
        }
        record.display_name = descriptor.display_name.clone();
        record.class_name = descriptor.class_name.clone();
        record.latest = descriptor.latest;
        record.primary = descriptor.primary;
        self.nodes
            .merge(&mut record.nodes, &descriptor.nodes, context)
    }
}

impl Assembler for ArchetypeDescriptorAssembler {
    type Object = ArchetypeDescriptor;
    type Record = ArchetypeRecord;

    fn assemble_record(
        &self,
        descriptor: &ArchetypeDescriptor,
        context: &mut AssemblyContext,
    ) -> Result<ArchetypeRecord> {
        Ok(ArchetypeRecord {
            archetype_id: descriptor.archetype_id.qualified_name().to_string(),
            short_name: descriptor.short_name().to_string(),
            display_name: descriptor.display_name.clone(),
            class_name: descriptor.class_name.clone(),
            latest: descriptor.latest,
            primary: descriptor.primary,
            nodes: self.nodes.assemble_record(&descriptor.nodes, context)?,
        })
    }

    fn assemble_object(
        &self,
        record: &ArchetypeRecord,
        context: &mut AssemblyContext,
    ) -> Result<ArchetypeDescriptor> {
        Ok(ArchetypeDescriptor {
            archetype_id: ArchetypeId::parse(&record.archetype_id)?,
            display_name: record.display_name.clone(),
            class_name: record.class_name.clone(),
            latest: record.latest,
            primary: record.primary,
            nodes: self.nodes.assemble_object(&record.nodes, context)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeAssembler;

impl Assembler for NodeAssembler {
    type Object = NodeDescriptor;
    type Record = NodeRecord;

    fn assemble_record(
        &self,
        node: &NodeDescriptor,
        context: &mut AssemblyContext,
    ) -> Result<NodeRecord> {
        Ok(NodeRecord {
            name: node.name.clone(),
            display_name: node.display_name.clone(),
            path: node.path.clone(),
            type_name: node.type_name.clone(),
            min_cardinality: to_i32(node.min_cardinality),
            max_cardinality: node.max_cardinality.map(to_i32).unwrap_or(-1),
            max_length: node.max_length.map(to_i32),
            base_name: node.base_name.clone(),
            filter: node.filter.clone(),
            hidden: node.hidden,
            read_only: node.read_only,
            derived: node.derived,
            derived_value: node.derived_value.clone(),
            parent_child: node.parent_child,
            default_value: node.default_value.clone(),
            assertions: node.assertions.iter().map(assertion_record).collect(),
            children: MapAssembler::new(NodeAssembler).assemble_record(&node.children, context)?,
        })
    }

    fn assemble_object(
        &self,
        record: &NodeRecord,
        context: &mut AssemblyContext,
    ) -> Result<NodeDescriptor> {
        let count = |value: i32, what: &str| {
            u32::try_from(value).map_err(|_| {
                ArchetypeError::assembly(format!("node {} has invalid {what} {value}", record.name))
            })
        };
        Ok(NodeDescriptor {
            name: record.name.clone(),
            display_name: record.display_name.clone(),
            path: record.path.clone(),
            type_name: record.type_name.clone(),
            min_cardinality: count(record.min_cardinality, "minCardinality")?,
            max_cardinality: match record.max_cardinality {
                -1 => None,
                max => Some(count(max, "maxCardinality")?),
            },
            max_length: record
                .max_length
                .map(|len| count(len, "maxLength"))
                .transpose()?,
            base_name: record.base_name.clone(),
            filter: record.filter.clone(),
            hidden: record.hidden,
            read_only: record.read_only,
            derived: record.derived,
            derived_value: record.derived_value.clone(),
            parent_child: record.parent_child,
            default_value: record.default_value.clone(),
            assertions: record
                .assertions
                .iter()
                .map(assertion_object)
                .collect::<Result<_>>()?,
            children: MapAssembler::new(NodeAssembler).assemble_object(&record.children, context)?,
        })
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn properties<const N: usize>(pairs: [(&str, Option<String>); N]) -> IndexMap<String, String> {
    pairs
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
}

fn assertion_record(assertion: &Assertion) -> AssertionRecord {
    let (properties, entries) = match assertion {
        Assertion::RegularExpression { expression, .. } => (
            properties([("expression", Some(expression.clone()))]),
            Vec::new(),
        ),
        Assertion::NumericRange {
            min_value,
            max_value,
            ..
        } => (
            properties([
                ("minValue", min_value.map(|v| v.to_string())),
                ("maxValue", max_value.map(|v| v.to_string())),
            ]),
            Vec::new(),
        ),
        Assertion::LocalLookup { entries, .. } => (
            IndexMap::new(),
            entries
                .iter()
                .map(|(code, name)| (code.clone(), name.clone()))
                .collect(),
        ),
        Assertion::RemoteLookup { source, .. } => (
            properties([
                ("type", Some("lookup".to_string())),
                ("source", Some(source.clone())),
            ]),
            Vec::new(),
        ),
        Assertion::ArchetypeRange { short_names, .. } => (
            IndexMap::new(),
            short_names
                .iter()
                .map(|s| ("shortName".to_string(), s.clone()))
                .collect(),
        ),
        Assertion::Other { properties, .. } => (properties.clone(), Vec::new()),
    };
    AssertionRecord {
        name: assertion.name().to_string(),
        error_message: assertion.error_message().map(str::to_string),
        properties,
        entries,
    }
}

fn assertion_object(record: &AssertionRecord) -> Result<Assertion> {
    let error_message = record.error_message.clone();
    let property = |name: &str| record.properties.get(name).cloned();
    let decimal = |name: &str| -> Result<Option<Decimal>> {
        property(name)
            .map(|v| {
                Decimal::from_str(&v).map_err(|_| {
                    ArchetypeError::assembly(format!("assertion {} has invalid {name} {v}", record.name))
                })
            })
            .transpose()
    };
    let missing =
        |name: &str| ArchetypeError::assembly(format!("assertion {} is missing {name}", record.name));

    let assertion = match record.name.as_str() {
        "regularExpression" => Assertion::RegularExpression {
            expression: property("expression").ok_or_else(|| missing("expression"))?,
            error_message,
        },
        "numericRange" => Assertion::NumericRange {
            min_value: decimal("minValue")?,
            max_value: decimal("maxValue")?,
            error_message,
        },
        "lookup.local" => Assertion::LocalLookup {
            entries: record.entries.iter().cloned().collect(),
            error_message,
        },
        "lookup" => Assertion::RemoteLookup {
            source: property("source").ok_or_else(|| missing("source"))?,
            error_message,
        },
        "archetypeRange" => Assertion::ArchetypeRange {
            short_names: record
                .entries
                .iter()
                .filter(|(name, _)| name == "shortName")
                .map(|(_, value)| value.clone())
                .collect(),
            error_message,
        },
        _ => Assertion::Other {
            name: record.name.clone(),
            properties: record.properties.clone(),
            error_message,
        },
    };
    Ok(assertion)
}
