use std::collections::HashSet;
use std::sync::Arc;

use super::map::MapAssembler;
use super::record::{ObjectRecord, RecordValue};
use super::{Assembler, AssemblyContext};
use crate::descriptor::{ArchetypeDescriptor, ArchetypeId, DescriptorRegistry};
use crate::error::{ArchetypeError, Result};
use crate::model::{IMObject, ObjectReference, Value, ValuePath};

/// Assembles [`IMObject`]s to and from [`ObjectRecord`]s using the
/// archetype's node paths.
pub struct IMObjectAssembler<'r> {
    registry: &'r DescriptorRegistry,
}

impl<'r> IMObjectAssembler<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self { registry }
    }

    /// Assemble a top-level record, including its child record table.
    pub fn to_record(&self, object: &IMObject) -> Result<ObjectRecord> {
        let mut context = AssemblyContext::new();
        context.begin(&object.reference().to_string());
        let mut record = self.assemble_record(object, &mut context)?;
        record.children = context.into_records();
        Ok(record)
    }

    /// Rebuild a top-level object from its record.
    pub fn from_record(&self, record: &ObjectRecord) -> Result<IMObject> {
        let mut context = AssemblyContext::with_records(record.children.clone());
        context.begin(&record.reference_key());
        self.assemble_object(record, &mut context)
    }

    fn descriptor(&self, archetype_id: &ArchetypeId) -> Result<Arc<ArchetypeDescriptor>> {
        self.registry
            .get_by_id(archetype_id)
            .or_else(|| self.registry.get(archetype_id.short_name()))
            .ok_or_else(|| ArchetypeError::archetype_not_found(archetype_id.short_name()))
    }

    /// Assemble a child object into the context's record table and return
    /// its key. A child already in the table is not assembled again.
    fn assemble_child(&self, child: &IMObject, context: &mut AssemblyContext) -> Result<String> {
        let key = child.reference().to_string();
        if context.has_record(&key) || !context.begin(&key) {
            return Ok(key);
        }
        let record = self.assemble_record(child, context)?;
        context.end(&key);
        context.add_record(key.clone(), record);
        Ok(key)
    }

    fn child_object(&self, key: &str, context: &mut AssemblyContext) -> Result<IMObject> {
        if let Some(object) = context.object(key) {
            return Ok(object.clone());
        }
        if !context.begin(key) {
            return Err(ArchetypeError::assembly(format!(
                "child record {key} refers to itself"
            )));
        }
        let record = context
            .record(key)
            .cloned()
            .ok_or_else(|| ArchetypeError::assembly(format!("missing child record {key}")))?;
        let object = self.assemble_object(&record, context)?;
        context.end(key);
        context.add_object(key.to_string(), object.clone());
        Ok(object)
    }
}

impl Assembler for IMObjectAssembler<'_> {
    type Object = IMObject;
    type Record = ObjectRecord;

    fn assemble_record(
        &self,
        object: &IMObject,
        context: &mut AssemblyContext,
    ) -> Result<ObjectRecord> {
        let archetype = self.descriptor(&object.archetype_id)?;
        let values = ValueAssembler::new(self);

        let mut record = ObjectRecord {
            id: object.id,
            archetype_id: object.archetype_id.to_string(),
            version: object.version,
            name: object.name.clone(),
            description: object.description.clone(),
            active: object.active,
            values: Default::default(),
            details: MapAssembler::new(ValueAssembler::new(self))
                .assemble_record(&object.details, context)?,
            children: Default::default(),
        };

        // nodes with filters share a path; copy each path once
        let mut seen = HashSet::new();
        for node in archetype.nodes() {
            let Some(path @ ValuePath::Property(_)) = node.value_path() else {
                continue;
            };
            if !seen.insert(path.clone()) {
                continue;
            }
            let value = object.get(&path)?;
            if value.is_null() {
                continue;
            }
            let value = values.assemble_record(&value, context)?;
            record.values.insert(path.to_string(), value);
        }

        // class properties no node maps, such as mirrored relationships
        for (name, value) in &object.properties {
            let path = ValuePath::Property(name.clone());
            if seen.contains(&path) || value.is_empty() {
                continue;
            }
            let value = values.assemble_record(value, context)?;
            record.values.insert(path.to_string(), value);
        }
        Ok(record)
    }

    fn assemble_object(
        &self,
        record: &ObjectRecord,
        context: &mut AssemblyContext,
    ) -> Result<IMObject> {
        let archetype_id = ArchetypeId::parse(&record.archetype_id)?;
        let class = self.descriptor(&archetype_id)?.object_class()?;
        let values = ValueAssembler::new(self);

        let mut object = IMObject::new(archetype_id, class, record.id);
        object.version = record.version;
        object.name = record.name.clone();
        object.description = record.description.clone();
        object.active = record.active;
        object.details = MapAssembler::new(ValueAssembler::new(self))
            .assemble_object(&record.details, context)?;

        for (path, value) in &record.values {
            let path = ValuePath::parse(path).ok_or_else(|| {
                ArchetypeError::assembly(format!(
                    "record {} has invalid path {path}",
                    record.reference_key()
                ))
            })?;
            let value = values.assemble_object(value, context)?;
            object.set(&path, value)?;
        }
        Ok(object)
    }
}

/// Assembles single values. Child objects go through the owning
/// [`IMObjectAssembler`] and become keys into the child table.
pub struct ValueAssembler<'a> {
    objects: &'a IMObjectAssembler<'a>,
}

impl<'a> ValueAssembler<'a> {
    pub fn new(objects: &'a IMObjectAssembler<'a>) -> Self {
        Self { objects }
    }
}

impl Assembler for ValueAssembler<'_> {
    type Object = Value;
    type Record = RecordValue;

    fn assemble_record(&self, value: &Value, context: &mut AssemblyContext) -> Result<RecordValue> {
        let record = match value {
            Value::Null => RecordValue::Null,
            Value::String(s) => RecordValue::Text(s.clone()),
            Value::Integer(i) => RecordValue::Integer(*i),
            Value::Decimal(d) => RecordValue::Decimal(*d),
            Value::Boolean(b) => RecordValue::Boolean(*b),
            Value::Date(d) => RecordValue::Date(*d),
            Value::Reference(r) => RecordValue::Reference(r.to_string()),
            Value::Object(child) => RecordValue::Child(self.objects.assemble_child(child, context)?),
            Value::Collection(items) => RecordValue::List(
                items
                    .iter()
                    .map(|item| self.assemble_record(item, context))
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(record)
    }

    fn assemble_object(&self, record: &RecordValue, context: &mut AssemblyContext) -> Result<Value> {
        let value = match record {
            RecordValue::Null => Value::Null,
            RecordValue::Text(s) => Value::String(s.clone()),
            RecordValue::Integer(i) => Value::Integer(*i),
            RecordValue::Decimal(d) => Value::Decimal(*d),
            RecordValue::Boolean(b) => Value::Boolean(*b),
            RecordValue::Date(d) => Value::Date(*d),
            RecordValue::Reference(r) => Value::Reference(r.parse::<ObjectReference>()?),
            RecordValue::Child(key) => Value::from(self.objects.child_object(key, context)?),
            RecordValue::List(items) => Value::Collection(
                items
                    .iter()
                    .map(|item| self.assemble_object(item, context))
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::NodeDescriptor;
    use crate::model::ObjectClass;

    fn registry() -> DescriptorRegistry {
        let pet = ArchetypeDescriptor::for_class("party.patientpet.1.0", ObjectClass::Party)
            .unwrap()
            .with_node(NodeDescriptor::new("name", "/name", "java.lang.String"))
            .with_node(NodeDescriptor::new("species", "/details/species", "java.lang.String"))
            .with_node(
                NodeDescriptor::new("owners", "/targetEntityRelationships", "java.util.HashSet")
                    .with_cardinality(0, None)
                    .with_filter("entityRelationship.patientOwner"),
            )
            .with_node(
                NodeDescriptor::new("locations", "/targetEntityRelationships", "java.util.HashSet")
                    .with_cardinality(0, None)
                    .with_filter("entityRelationship.patientLocation"),
            );
        let owner = ArchetypeDescriptor::for_class(
            "entityRelationship.patientOwner.1.0",
            ObjectClass::EntityRelationship,
        )
        .unwrap()
        .with_node(NodeDescriptor::new("source", "/source", "IMObjectReference"))
        .with_node(NodeDescriptor::new("target", "/target", "IMObjectReference"));
        DescriptorRegistry::new(vec![pet, owner]).unwrap()
    }

    fn pet_with_owner() -> IMObject {
        let mut relationship = IMObject::new(
            ArchetypeId::parse("entityRelationship.patientOwner.1.0").unwrap(),
            ObjectClass::EntityRelationship,
            11,
        );
        let source = Value::Reference(ObjectReference::new("party.customerperson", 5));
        let target = Value::Reference(ObjectReference::new("party.patientpet", 10));
        relationship
            .set(&ValuePath::parse("/source").unwrap(), source)
            .unwrap();
        relationship
            .set(&ValuePath::parse("/target").unwrap(), target)
            .unwrap();

        let mut pet = IMObject::new(
            ArchetypeId::parse("party.patientpet.1.0").unwrap(),
            ObjectClass::Party,
            10,
        );
        pet.name = Some("Fido".to_string());
        pet.details
            .insert("species".to_string(), Value::from("CANINE"));
        pet.collection_mut(&ValuePath::parse("/targetEntityRelationships").unwrap())
            .unwrap()
            .push(Value::from(relationship));
        pet
    }

    #[test]
    fn test_object_roundtrip() {
        let registry = registry();
        let assembler = IMObjectAssembler::new(&registry);
        let pet = pet_with_owner();

        let record = assembler.to_record(&pet).unwrap();
        assert_eq!(record.archetype_id, "party.patientpet.1.0");
        assert_eq!(record.values.len(), 1);
        assert_eq!(record.children.len(), 1);
        assert!(record.children.contains_key("entityRelationship.patientOwner:11"));
        assert_eq!(
            record.details.get("species"),
            Some(&RecordValue::Text("CANINE".to_string()))
        );

        let rebuilt = assembler.from_record(&record).unwrap();
        assert_eq!(rebuilt, pet);
    }

    #[test]
    fn test_shared_child_stored_once() {
        let registry = registry();
        let assembler = IMObjectAssembler::new(&registry);
        let mut pet = pet_with_owner();
        let path = ValuePath::parse("/targetEntityRelationships").unwrap();
        let relationship = pet.collection(&path).unwrap()[0].clone();
        pet.collection_mut(&path).unwrap().push(relationship);

        let record = assembler.to_record(&pet).unwrap();
        assert_eq!(record.children.len(), 1);
        match &record.values["/targetEntityRelationships"] {
            RecordValue::List(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        let rebuilt = assembler.from_record(&record).unwrap();
        assert_eq!(rebuilt.collection(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_unmapped_class_collection_kept() {
        let registry = registry();
        let assembler = IMObjectAssembler::new(&registry);
        let mut pet = pet_with_owner();
        let mut relationship = IMObject::new(
            ArchetypeId::parse("entityRelationship.patientOwner.1.0").unwrap(),
            ObjectClass::EntityRelationship,
            12,
        );
        relationship
            .set(
                &ValuePath::parse("/source").unwrap(),
                Value::Reference(pet.reference()),
            )
            .unwrap();
        let sources = ValuePath::parse("/sourceEntityRelationships").unwrap();
        pet.collection_mut(&sources)
            .unwrap()
            .push(Value::from(relationship));

        let record = assembler.to_record(&pet).unwrap();
        assert_eq!(record.values.len(), 2);
        assert!(record.children.contains_key("entityRelationship.patientOwner:12"));

        let rebuilt = assembler.from_record(&record).unwrap();
        assert_eq!(rebuilt.collection(&sources).unwrap().len(), 1);
        assert_eq!(rebuilt, pet);
    }

    #[test]
    fn test_missing_child_record() {
        let registry = registry();
        let assembler = IMObjectAssembler::new(&registry);
        let mut record = assembler.to_record(&pet_with_owner()).unwrap();
        record.children.clear();
        assert!(matches!(
            assembler.from_record(&record),
            Err(ArchetypeError::Assembly { .. })
        ));
    }
}
