use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a class-level property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar,
    Reference,
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassProperty {
    pub name: &'static str,
    pub kind: PropertyKind,
}

const fn scalar(name: &'static str) -> ClassProperty {
    ClassProperty {
        name,
        kind: PropertyKind::Scalar,
    }
}

const fn reference(name: &'static str) -> ClassProperty {
    ClassProperty {
        name,
        kind: PropertyKind::Reference,
    }
}

const fn collection(name: &'static str) -> ClassProperty {
    ClassProperty {
        name,
        kind: PropertyKind::Collection,
    }
}

const ENTITY: &[ClassProperty] = &[
    collection("classifications"),
    collection("identities"),
    collection("sourceEntityRelationships"),
    collection("targetEntityRelationships"),
    collection("entityLinks"),
];

const PARTY: &[ClassProperty] = &[
    collection("classifications"),
    collection("identities"),
    collection("sourceEntityRelationships"),
    collection("targetEntityRelationships"),
    collection("entityLinks"),
    collection("contacts"),
];

const ACT: &[ClassProperty] = &[
    scalar("activityStartTime"),
    scalar("activityEndTime"),
    scalar("status"),
    scalar("title"),
    scalar("reason"),
    scalar("printed"),
    collection("participations"),
    collection("sourceActRelationships"),
    collection("targetActRelationships"),
    collection("identities"),
];

const LOOKUP: &[ClassProperty] = &[
    scalar("code"),
    scalar("defaultLookup"),
    collection("sourceLookupRelationships"),
    collection("targetLookupRelationships"),
];

const RELATIONSHIP: &[ClassProperty] = &[
    reference("source"),
    reference("target"),
    scalar("activeStartTime"),
    scalar("activeEndTime"),
    scalar("sequence"),
];

const PARTICIPATION: &[ClassProperty] = &[
    reference("entity"),
    reference("act"),
    scalar("activityStartTime"),
    scalar("activityEndTime"),
];

const CONTACT: &[ClassProperty] = &[
    reference("party"),
    collection("purposes"),
    scalar("activeStartTime"),
    scalar("activeEndTime"),
];

const IDENTITY: &[ClassProperty] = &[scalar("identity"), reference("entity")];

/// The runtime class an archetype binds its instances to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    Entity,
    Party,
    Act,
    Lookup,
    EntityRelationship,
    ActRelationship,
    LookupRelationship,
    EntityLink,
    Participation,
    Contact,
    EntityIdentity,
}

impl ObjectClass {
    /// Map an archetype `type` attribute to its runtime class.
    ///
    /// Only the simple class name is significant, so both
    /// `org.openvpms.component.business.domain.im.party.Party` and `Party` map to
    /// [`ObjectClass::Party`]. Specialised subclasses collapse onto their base.
    pub fn from_class_name(class_name: &str) -> Option<Self> {
        let simple = class_name.rsplit('.').next().unwrap_or(class_name);
        match simple {
            "Entity" | "Product" | "User" | "Organisation" => Some(ObjectClass::Entity),
            "Party" => Some(ObjectClass::Party),
            "Act" | "FinancialAct" | "DocumentAct" => Some(ObjectClass::Act),
            "Lookup" => Some(ObjectClass::Lookup),
            "EntityRelationship" => Some(ObjectClass::EntityRelationship),
            "ActRelationship" => Some(ObjectClass::ActRelationship),
            "LookupRelationship" => Some(ObjectClass::LookupRelationship),
            "EntityLink" => Some(ObjectClass::EntityLink),
            "Participation" => Some(ObjectClass::Participation),
            "Contact" => Some(ObjectClass::Contact),
            "EntityIdentity" => Some(ObjectClass::EntityIdentity),
            _ => None,
        }
    }

    /// Properties beyond the common `id`, `name`, `description`, `active` and `details`.
    pub fn properties(&self) -> &'static [ClassProperty] {
        match self {
            ObjectClass::Entity => ENTITY,
            ObjectClass::Party => PARTY,
            ObjectClass::Act => ACT,
            ObjectClass::Lookup => LOOKUP,
            ObjectClass::EntityRelationship
            | ObjectClass::ActRelationship
            | ObjectClass::LookupRelationship
            | ObjectClass::EntityLink => RELATIONSHIP,
            ObjectClass::Participation => PARTICIPATION,
            ObjectClass::Contact => CONTACT,
            ObjectClass::EntityIdentity => IDENTITY,
        }
    }

    pub fn property(&self, name: &str) -> Option<&'static ClassProperty> {
        self.properties().iter().find(|p| p.name == name)
    }

    pub fn is_relationship(&self) -> bool {
        matches!(
            self,
            ObjectClass::EntityRelationship
                | ObjectClass::ActRelationship
                | ObjectClass::LookupRelationship
                | ObjectClass::EntityLink
        )
    }

    /// For a relationship class, the collection on the source object that
    /// holds it.
    pub fn source_collection(&self) -> Option<&'static str> {
        match self {
            ObjectClass::EntityRelationship => Some("sourceEntityRelationships"),
            ObjectClass::ActRelationship => Some("sourceActRelationships"),
            ObjectClass::LookupRelationship => Some("sourceLookupRelationships"),
            ObjectClass::EntityLink => Some("entityLinks"),
            _ => None,
        }
    }

    /// For a relationship class, the collection on the target object that
    /// mirrors it. Entity links are one-sided.
    pub fn target_collection(&self) -> Option<&'static str> {
        match self {
            ObjectClass::EntityRelationship => Some("targetEntityRelationships"),
            ObjectClass::ActRelationship => Some("targetActRelationships"),
            ObjectClass::LookupRelationship => Some("targetLookupRelationships"),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ObjectClass::Entity => "org.openvpms.component.business.domain.im.common.Entity",
            ObjectClass::Party => "org.openvpms.component.business.domain.im.party.Party",
            ObjectClass::Act => "org.openvpms.component.business.domain.im.act.Act",
            ObjectClass::Lookup => "org.openvpms.component.business.domain.im.lookup.Lookup",
            ObjectClass::EntityRelationship => {
                "org.openvpms.component.business.domain.im.common.EntityRelationship"
            }
            ObjectClass::ActRelationship => {
                "org.openvpms.component.business.domain.im.act.ActRelationship"
            }
            ObjectClass::LookupRelationship => {
                "org.openvpms.component.business.domain.im.lookup.LookupRelationship"
            }
            ObjectClass::EntityLink => "org.openvpms.component.business.domain.im.common.EntityLink",
            ObjectClass::Participation => {
                "org.openvpms.component.business.domain.im.common.Participation"
            }
            ObjectClass::Contact => "org.openvpms.component.business.domain.im.party.Contact",
            ObjectClass::EntityIdentity => {
                "org.openvpms.component.business.domain.im.common.EntityIdentity"
            }
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
