use std::ops::{Deref, DerefMut};

use super::object_bean::{IMObjectBean, mirror_relationship};
use crate::error::{ArchetypeError, Result};
use crate::model::{IMObject, ObjectClass, ObjectReference, Value, ValuePath};
use crate::service::ArchetypeService;

const PARTICIPATIONS: &str = "participations";
const SOURCE_RELATIONSHIPS: &str = "sourceActRelationships";

/// An [`IMObjectBean`] over an act, with participation and act relationship
/// helpers keyed by archetype short name.
pub struct ActBean<'s> {
    bean: IMObjectBean<'s>,
}

impl<'s> ActBean<'s> {
    pub fn new(object: IMObject, service: &'s ArchetypeService) -> Result<Self> {
        if object.class != ObjectClass::Act {
            return Err(ArchetypeError::invalid_archetype(
                object.short_name().to_string(),
                format!("{} is not an act", object.class),
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

    /// Add a participation of archetype `short_name` linking `entity` to this
    /// act. Returns the participation.
    pub fn add_participation(&mut self, short_name: &str, entity: &ObjectReference) -> Result<IMObject> {
        let mut participation = self.service().create(short_name)?;
        if participation.class != ObjectClass::Participation {
            return Err(ArchetypeError::invalid_archetype(
                short_name.to_string(),
                "not a participation".to_string(),
            ));
        }
        participation.set(&property("entity"), Value::from(entity))?;
        participation.set(&property("act"), Value::from(self.reference()))?;
        self.bean
            .add_to_collection(PARTICIPATIONS, participation.clone())?;
        Ok(participation)
    }

    /// The first participation matching `short_name`.
    pub fn get_participation(&self, short_name: &str) -> Result<Option<IMObject>> {
        for value in self.bean.object().collection(&property(PARTICIPATIONS))? {
            let matches = value.as_reference().is_some_and(|r| r.is_a(&[short_name]));
            if matches {
                if let Some(participation) = self.bean.materialize(value.clone())? {
                    return Ok(Some(participation));
                }
            }
        }
        Ok(None)
    }

    /// The entity of the first participation matching `short_name`.
    pub fn get_participant_ref(&self, short_name: &str) -> Result<Option<ObjectReference>> {
        Ok(match self.get_participation(short_name)? {
            Some(participation) => participation.get(&property("entity"))?.as_reference(),
            None => None,
        })
    }

    /// The entity of the first participation matching `short_name`,
    /// dereferenced.
    pub fn get_participant(&self, short_name: &str) -> Result<Option<IMObject>> {
        match self.get_participant_ref(short_name)? {
            Some(reference) => self.service().get(&reference),
            None => Ok(None),
        }
    }

    /// Relate this act to `target` with an act relationship of archetype
    /// `short_name`, mirrored on the target. Returns the relationship.
    pub fn add_act_relationship(&mut self, short_name: &str, target: &mut IMObject) -> Result<IMObject> {
        let relationship = self.bean.create_relationship(short_name, target)?;
        if relationship.class != ObjectClass::ActRelationship {
            return Err(ArchetypeError::invalid_archetype(
                short_name.to_string(),
                "not an act relationship".to_string(),
            ));
        }
        self.bean
            .add_to_collection(SOURCE_RELATIONSHIPS, relationship.clone())?;
        mirror_relationship(target, &relationship)?;
        Ok(relationship)
    }
}

fn property(name: &str) -> ValuePath {
    ValuePath::Property(name.to_string())
}

impl<'s> Deref for ActBean<'s> {
    type Target = IMObjectBean<'s>;

    fn deref(&self) -> &Self::Target {
        &self.bean
    }
}

impl DerefMut for ActBean<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bean
    }
}
