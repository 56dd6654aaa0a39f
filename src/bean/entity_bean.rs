use std::ops::{Deref, DerefMut};

use super::object_bean::{IMObjectBean, mirror_relationship};
use crate::error::{ArchetypeError, Result};
use crate::model::{IMObject, ObjectClass, ObjectReference, ValuePath};
use crate::service::ArchetypeService;

const SOURCE_RELATIONSHIPS: &str = "sourceEntityRelationships";
const TARGET_RELATIONSHIPS: &str = "targetEntityRelationships";

/// An [`IMObjectBean`] over an entity or party, with entity relationship
/// helpers that work on the class collections rather than named nodes.
pub struct EntityBean<'s> {
    bean: IMObjectBean<'s>,
}

impl<'s> EntityBean<'s> {
    pub fn new(object: IMObject, service: &'s ArchetypeService) -> Result<Self> {
        if !matches!(object.class, ObjectClass::Entity | ObjectClass::Party) {
            return Err(ArchetypeError::invalid_archetype(
                object.short_name().to_string(),
                format!("{} is not an entity", object.class),
            ));
        }
        Ok(Self {
            bean: IMObjectBean::new(object, service)?,
        })
    }

    pub fn create(short_name: &str, service: &'s ArchetypeService) -> Result<Self> {
        Self::new(service.create(short_name)?, service)
    }

    pub fn into_bean(self) -> IMObjectBean<'s> {
        self.bean
    }

    /// Create an entity relationship of archetype `short_name` from this
    /// entity to `target`, and mirror it on the target. Returns the
    /// relationship.
    pub fn add_relationship(&mut self, short_name: &str, target: &mut IMObject) -> Result<IMObject> {
        let relationship = self.bean.create_relationship(short_name, target)?;
        if relationship.class != ObjectClass::EntityRelationship {
            return Err(ArchetypeError::invalid_archetype(
                short_name.to_string(),
                "not an entity relationship".to_string(),
            ));
        }
        self.bean
            .add_to_collection(SOURCE_RELATIONSHIPS, relationship.clone())?;
        mirror_relationship(target, &relationship)?;
        Ok(relationship)
    }

    /// Relationships held on the source side whose archetype matches
    /// `short_name`.
    pub fn get_relationships(&self, short_name: &str) -> Result<Vec<IMObject>> {
        self.related(SOURCE_RELATIONSHIPS, short_name)
    }

    /// Targets of the source-side relationships matching `short_name`.
    pub fn get_target_entity_refs(&self, short_name: &str) -> Result<Vec<ObjectReference>> {
        self.ends(SOURCE_RELATIONSHIPS, short_name, "target")
    }

    /// Sources of the target-side relationships matching `short_name`.
    pub fn get_source_entity_refs(&self, short_name: &str) -> Result<Vec<ObjectReference>> {
        self.ends(TARGET_RELATIONSHIPS, short_name, "source")
    }

    fn related(&self, property: &str, short_name: &str) -> Result<Vec<IMObject>> {
        let path = ValuePath::Property(property.to_string());
        let mut relationships = Vec::new();
        for value in self.bean.object().collection(&path)? {
            let matches = value
                .as_reference()
                .is_some_and(|r| r.is_a(&[short_name]));
            if !matches {
                continue;
            }
            if let Some(relationship) = self.bean.materialize(value.clone())? {
                relationships.push(relationship);
            }
        }
        Ok(relationships)
    }

    fn ends(&self, property: &str, short_name: &str, end: &str) -> Result<Vec<ObjectReference>> {
        let end = ValuePath::Property(end.to_string());
        let mut refs = Vec::new();
        for relationship in self.related(property, short_name)? {
            if let Some(reference) = relationship.get(&end)?.as_reference() {
                refs.push(reference);
            }
        }
        Ok(refs)
    }
}

impl<'s> Deref for EntityBean<'s> {
    type Target = IMObjectBean<'s>;

    fn deref(&self) -> &Self::Target {
        &self.bean
    }
}

impl DerefMut for EntityBean<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bean
    }
}
