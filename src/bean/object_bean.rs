use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::descriptor::{ArchetypeDescriptor, NodeDescriptor, ValueType, is_a};
use crate::error::{ArchetypeError, PropertyResolverError, Result};
use crate::model::{IMObject, ObjectClass, ObjectReference, Value, ValuePath};
use crate::service::ArchetypeService;
use crate::validation::{ValidationError, ValidationErrorCode};

/// Typed, validated access to the nodes of a single object.
///
/// The bean owns the object while it is being edited; take it back with
/// [`into_object`](Self::into_object). Node names are case-sensitive and an
/// unknown name always fails with `InvalidProperty`.
pub struct IMObjectBean<'s> {
    object: IMObject,
    archetype: Arc<ArchetypeDescriptor>,
    service: &'s ArchetypeService,
}

impl<'s> IMObjectBean<'s> {
    pub fn new(object: IMObject, service: &'s ArchetypeService) -> Result<Self> {
        let archetype = service.descriptor_for(&object)?;
        Ok(Self {
            object,
            archetype,
            service,
        })
    }

    /// Create a new object of `short_name` and wrap it.
    pub fn create(short_name: &str, service: &'s ArchetypeService) -> Result<Self> {
        Self::new(service.create(short_name)?, service)
    }

    pub fn object(&self) -> &IMObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut IMObject {
        &mut self.object
    }

    pub fn into_object(self) -> IMObject {
        self.object
    }

    pub fn reference(&self) -> ObjectReference {
        self.object.reference()
    }

    pub fn archetype(&self) -> &ArchetypeDescriptor {
        &self.archetype
    }

    pub fn service(&self) -> &'s ArchetypeService {
        self.service
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.archetype.node(name).is_some()
    }

    pub fn get_node(&self, name: &str) -> Option<&NodeDescriptor> {
        self.archetype.node(name)
    }

    /// The archetype display name.
    pub fn get_display_name(&self) -> &str {
        self.archetype.display_name()
    }

    pub fn get_short_name(&self) -> &str {
        self.object.short_name()
    }

    pub fn is_a(&self, patterns: &[&str]) -> bool {
        self.object.is_a(patterns)
    }

    /// The value of a node. Collection nodes return the elements that belong
    /// to the node.
    pub fn get_value(&self, name: &str) -> Result<Value> {
        let node = find_node(&self.archetype, name)?;
        let path = node_path(&self.archetype, node)?;
        if node.is_collection() {
            let items = self.object.collection(&path)?;
            Ok(Value::Collection(node.select(items).cloned().collect()))
        } else {
            self.object.get(&path)
        }
    }

    /// Coerce `value` to the node's type, validate it and store it.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let node = find_node(&self.archetype, name)?;
        if node.is_collection() {
            return Err(ArchetypeError::invalid_collection_operation(
                name.to_string(),
                "use add_value/remove_value on collection nodes".to_string(),
            ));
        }
        let path = node_path(&self.archetype, node)?;
        let value = node.value_type().coerce(&node.name, value.into())?;

        if self.service.config().validation.validate_on_set && !value.is_null() {
            let errors = self
                .service
                .validate_value(self.object.short_name(), node, &value)?;
            if !errors.is_empty() {
                return Err(ArchetypeError::validation(errors));
            }
        }
        self.object.set(&path, value)
    }

    fn typed(&self, name: &str, value_type: ValueType) -> Result<Value> {
        let value = self.get_value(name)?;
        value_type.coerce(name, value)
    }

    pub fn get_string(&self, name: &str) -> Result<Option<String>> {
        Ok(match self.typed(name, ValueType::String)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn get_string_or(&self, name: &str, default: &str) -> Result<String> {
        Ok(self.get_string(name)?.unwrap_or_else(|| default.to_string()))
    }

    /// Integer value of a node; zero if unset.
    pub fn get_i64(&self, name: &str) -> Result<i64> {
        Ok(self.typed(name, ValueType::Integer)?.as_i64().unwrap_or(0))
    }

    /// Boolean value of a node; false if unset.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        Ok(self
            .typed(name, ValueType::Boolean)?
            .as_bool()
            .unwrap_or(false))
    }

    pub fn get_decimal(&self, name: &str) -> Result<Option<Decimal>> {
        Ok(self.typed(name, ValueType::Decimal)?.as_decimal())
    }

    pub fn get_decimal_or(&self, name: &str, default: Decimal) -> Result<Decimal> {
        Ok(self.get_decimal(name)?.unwrap_or(default))
    }

    pub fn get_date(&self, name: &str) -> Result<Option<NaiveDateTime>> {
        Ok(self.typed(name, ValueType::Date)?.as_date())
    }

    pub fn get_reference(&self, name: &str) -> Result<Option<ObjectReference>> {
        Ok(self.get_value(name)?.as_reference())
    }

    /// The elements of a collection node.
    pub fn get_values(&self, name: &str) -> Result<Vec<Value>> {
        let (node, path) = collection_node(&self.archetype, name)?;
        Ok(node
            .select(self.object.collection(&path)?)
            .cloned()
            .collect())
    }

    /// The elements of a collection node whose archetype matches `short_name`
    /// (wildcards allowed).
    pub fn get_values_of(&self, name: &str, short_name: &str) -> Result<Vec<Value>> {
        Ok(self
            .get_values(name)?
            .into_iter()
            .filter(|v| element_short_name(v).is_some_and(|s| is_a(s, &[short_name])))
            .collect())
    }

    /// The elements of a collection node as objects, dereferencing elements
    /// held by reference. Missing referents are skipped.
    pub fn get_objects(&self, name: &str) -> Result<Vec<IMObject>> {
        let mut objects = Vec::new();
        for value in self.get_values(name)? {
            if let Some(object) = self.materialize(value)? {
                objects.push(object);
            }
        }
        Ok(objects)
    }

    pub(crate) fn materialize(&self, value: Value) -> Result<Option<IMObject>> {
        match value {
            Value::Object(object) => Ok(Some(*object)),
            Value::Reference(reference) => {
                let object = self.service.get(&reference)?;
                if object.is_none() {
                    tracing::warn!("{} refers to missing object {}", self.reference(), reference);
                }
                Ok(object)
            }
            _ => Ok(None),
        }
    }

    /// Add an element to a collection node.
    ///
    /// The element must be an object or a reference in the node's archetype
    /// range, and the node must not be full. Nodes that do not own their
    /// elements store them by reference. Adding an element that is already
    /// present is a no-op.
    pub fn add_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let (node, path) = collection_node(&self.archetype, name)?;
        let value = match value.into() {
            Value::Object(object) if !node.parent_child => Value::Reference(object.reference()),
            value @ (Value::Object(_) | Value::Reference(_)) => value,
            other => {
                return Err(ArchetypeError::invalid_collection_operation(
                    name.to_string(),
                    format!("cannot add a {} to a collection", other.type_name()),
                ));
            }
        };
        let short_name = element_short_name(&value).unwrap_or_default().to_string();
        let reference = value.as_reference();

        let range = node.archetype_range();
        if !range.is_empty() && !is_a(&short_name, &range) {
            return Err(self.rejected(
                node,
                ValidationErrorCode::ArchetypeRange,
                format!("{short_name} is not a valid {}", node.display_name()),
            ));
        }

        let items = self.object.collection(&path)?;
        let selected: Vec<&Value> = node.select(items).collect();
        if selected.iter().any(|v| v.as_reference() == reference) {
            return Ok(());
        }
        if let Some(max) = node.max_cardinality {
            if selected.len() as u32 >= max {
                return Err(self.rejected(
                    node,
                    ValidationErrorCode::MaxCardinality,
                    format!(
                        "{} allows at most {} element(s)",
                        node.display_name(),
                        max
                    ),
                ));
            }
        }

        let node_name = node.name.clone();
        self.object.collection_mut(&path)?.push(value);
        tracing::debug!("Added {} to {}.{}", short_name, self.reference(), node_name);
        Ok(())
    }

    /// Remove an element (matched by reference) from a collection node.
    /// Returns true if it was present.
    pub fn remove_value(&mut self, name: &str, value: &Value) -> Result<bool> {
        let (node, path) = collection_node(&self.archetype, name)?;
        let Some(reference) = value.as_reference() else {
            return Ok(false);
        };
        let items = self.object.collection_mut(&path)?;
        let before = items.len();
        items.retain(|v| !(node.accepts(v) && v.as_reference().as_ref() == Some(&reference)));
        Ok(items.len() < before)
    }

    fn rejected(&self, node: &NodeDescriptor, code: ValidationErrorCode, message: String) -> ArchetypeError {
        ArchetypeError::validation(vec![ValidationError::new(
            self.get_short_name(),
            &node.name,
            code,
            message,
        )])
    }

    /// The entity of the participation held by a participation node.
    pub fn get_node_participant_ref(&self, name: &str) -> Result<Option<ObjectReference>> {
        for value in self.get_values(name)? {
            if let Some(participation) = self.materialize(value)? {
                return Ok(participation.get(&participation_path("entity"))?.as_reference());
            }
        }
        Ok(None)
    }

    /// The entity of a participation node, dereferenced.
    pub fn get_node_participant(&self, name: &str) -> Result<Option<IMObject>> {
        match self.get_node_participant_ref(name)? {
            Some(reference) => self.service.get(&reference),
            None => Ok(None),
        }
    }

    /// Point a participation node at `entity`, creating the participation if
    /// the node has none yet.
    pub fn set_node_participant(&mut self, name: &str, entity: &ObjectReference) -> Result<()> {
        let (node, path) = collection_node(&self.archetype, name)?;
        let act = self.reference();

        let items = self.object.collection_mut(&path)?;
        if let Some(existing) = items
            .iter_mut()
            .filter(|v| node.accepts(v))
            .find_map(Value::as_object_mut)
        {
            existing.set(&participation_path("entity"), Value::from(entity))?;
            return Ok(());
        }

        let short_name = element_archetype(node)?;
        let mut participation = self.service.create(&short_name)?;
        if participation.class != ObjectClass::Participation {
            return Err(ArchetypeError::invalid_collection_operation(
                name.to_string(),
                format!("{short_name} is not a participation"),
            ));
        }
        participation.set(&participation_path("entity"), Value::from(entity))?;
        participation.set(&participation_path("act"), Value::from(act))?;
        self.add_value(name, participation)
    }

    /// Create a relationship from this object to `target` through a
    /// relationship node, and mirror it into the target's
    /// `target*Relationships` collection. Returns the relationship.
    pub fn add_node_target(&mut self, name: &str, target: &mut IMObject) -> Result<IMObject> {
        let (node, _) = collection_node(&self.archetype, name)?;
        let short_name = element_archetype(node)?;
        let relationship = self.create_relationship(&short_name, target)?;
        self.add_value(name, relationship.clone())?;
        mirror_relationship(target, &relationship)?;
        Ok(relationship)
    }

    pub(crate) fn create_relationship(&self, short_name: &str, target: &IMObject) -> Result<IMObject> {
        let mut relationship = self.service.create(short_name)?;
        if !relationship.class.is_relationship() {
            return Err(ArchetypeError::invalid_collection_operation(
                short_name.to_string(),
                "not a relationship archetype".to_string(),
            ));
        }
        if let Some(mirror) = relationship.class.target_collection() {
            if target.class.property(mirror).is_none() {
                return Err(PropertyResolverError::invalid_property(format!(
                    "{}.{}",
                    target.short_name(),
                    mirror
                ))
                .into());
            }
        }
        relationship.set(&relationship_path("source"), Value::from(self.reference()))?;
        relationship.set(&relationship_path("target"), Value::from(target.reference()))?;
        Ok(relationship)
    }

    /// Add `element` to the class collection `property`, through the first
    /// node that maps it and accepts the element, so that node checks apply.
    pub(crate) fn add_to_collection(&mut self, property: &str, element: IMObject) -> Result<()> {
        let value = Value::from(element);
        let path = ValuePath::Property(property.to_string());
        let node = self
            .archetype
            .nodes()
            .find(|n| n.value_path().as_ref() == Some(&path) && n.accepts(&value))
            .map(|n| n.name.clone());
        match node {
            Some(node) => self.add_value(&node, value),
            None => {
                self.object.collection_mut(&path)?.push(value);
                Ok(())
            }
        }
    }

    fn relationship_refs(&self, name: &str, end: &str) -> Result<Vec<ObjectReference>> {
        let mut refs = Vec::new();
        for value in self.get_values(name)? {
            if let Some(relationship) = self.materialize(value)? {
                if let Some(reference) = relationship.get(&relationship_path(end))?.as_reference() {
                    refs.push(reference);
                }
            }
        }
        Ok(refs)
    }

    /// Targets of the relationships held by a relationship node.
    pub fn get_node_target_refs(&self, name: &str) -> Result<Vec<ObjectReference>> {
        self.relationship_refs(name, "target")
    }

    /// Sources of the relationships held by a relationship node.
    pub fn get_node_source_refs(&self, name: &str) -> Result<Vec<ObjectReference>> {
        self.relationship_refs(name, "source")
    }

    pub fn get_node_target_ref(&self, name: &str) -> Result<Option<ObjectReference>> {
        Ok(self.get_node_target_refs(name)?.into_iter().next())
    }

    /// Targets of a relationship node, dereferenced. Missing targets are skipped.
    pub fn get_node_targets(&self, name: &str) -> Result<Vec<IMObject>> {
        let mut targets = Vec::new();
        for reference in self.get_node_target_refs(name)? {
            match self.service.get(&reference)? {
                Some(target) => targets.push(target),
                None => tracing::warn!("Relationship target {} not found", reference),
            }
        }
        Ok(targets)
    }

    /// Remove the relationships from this object to `target` held by a
    /// relationship node, on both sides. Returns true if any were removed.
    pub fn remove_node_relationship(&mut self, name: &str, target: &mut IMObject) -> Result<bool> {
        let target_ref = target.reference();
        let mut removed = Vec::new();
        for value in self.get_values(name)? {
            if let Some(relationship) = value.as_object() {
                let points_at = relationship
                    .get(&relationship_path("target"))?
                    .as_reference();
                if points_at.as_ref() == Some(&target_ref) {
                    removed.push(relationship.clone());
                }
            }
        }
        for relationship in &removed {
            self.remove_value(name, &Value::Reference(relationship.reference()))?;
            unmirror_relationship(target, relationship)?;
        }
        Ok(!removed.is_empty())
    }

    /// Check the object against its archetype without saving.
    pub fn validate(&self) -> Result<Vec<ValidationError>> {
        self.service.validate(&self.object)
    }

    /// Validate and persist the object.
    pub fn save(&mut self) -> Result<()> {
        self.service.save(&mut self.object)
    }
}

fn find_node<'a>(archetype: &'a ArchetypeDescriptor, name: &str) -> Result<&'a NodeDescriptor> {
    archetype.node(name).ok_or_else(|| {
        PropertyResolverError::invalid_property(format!("{}.{}", archetype.short_name(), name)).into()
    })
}

fn node_path(archetype: &ArchetypeDescriptor, node: &NodeDescriptor) -> Result<ValuePath> {
    node.value_path().ok_or_else(|| {
        PropertyResolverError::invalid_property(format!(
            "{}.{} ({})",
            archetype.short_name(),
            node.name,
            node.path
        ))
        .into()
    })
}

fn collection_node<'a>(
    archetype: &'a ArchetypeDescriptor,
    name: &str,
) -> Result<(&'a NodeDescriptor, ValuePath)> {
    let node = find_node(archetype, name)?;
    if !node.is_collection() {
        return Err(ArchetypeError::invalid_collection_operation(
            name.to_string(),
            "not a collection node".to_string(),
        ));
    }
    Ok((node, node_path(archetype, node)?))
}

/// The single archetype a node creates elements of. Wildcard ranges are
/// ambiguous.
fn element_archetype(node: &NodeDescriptor) -> Result<String> {
    match node.archetype_range().as_slice() {
        [short_name] if !short_name.contains('*') => Ok(short_name.to_string()),
        _ => Err(ArchetypeError::invalid_collection_operation(
            node.name.clone(),
            "cannot determine the archetype to create".to_string(),
        )),
    }
}

fn element_short_name(value: &Value) -> Option<&str> {
    match value {
        Value::Object(object) => Some(object.short_name()),
        Value::Reference(reference) => Some(reference.short_name()),
        _ => None,
    }
}

fn participation_path(property: &str) -> ValuePath {
    ValuePath::Property(property.to_string())
}

fn relationship_path(property: &str) -> ValuePath {
    ValuePath::Property(property.to_string())
}

/// Add `relationship` to the target side's `target*Relationships` collection.
pub(crate) fn mirror_relationship(target: &mut IMObject, relationship: &IMObject) -> Result<()> {
    let Some(property) = relationship.class.target_collection() else {
        return Ok(());
    };
    let reference = relationship.reference();
    let items = target.collection_mut(&ValuePath::Property(property.to_string()))?;
    if !items.iter().any(|v| v.as_reference().as_ref() == Some(&reference)) {
        items.push(Value::from(relationship.clone()));
    }
    Ok(())
}

fn unmirror_relationship(target: &mut IMObject, relationship: &IMObject) -> Result<()> {
    let Some(property) = relationship.class.target_collection() else {
        return Ok(());
    };
    let reference = relationship.reference();
    target
        .collection_mut(&ValuePath::Property(property.to_string()))?
        .retain(|v| v.as_reference().as_ref() != Some(&reference));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::fixtures;
    use crate::error::PropertyResolverErrorCode;

    #[test]
    fn test_set_and_get_with_coercion() {
        let service = fixtures::service();
        let mut bean = IMObjectBean::create("party.customerperson", &service).unwrap();

        bean.set_value("firstName", "J").unwrap();
        bean.set_value("credit", "12.50").unwrap();
        assert_eq!(bean.get_value("firstName").unwrap(), Value::from("J"));
        assert_eq!(bean.get_string("firstName").unwrap().as_deref(), Some("J"));
        assert_eq!(
            bean.get_decimal("credit").unwrap(),
            Some(Decimal::new(1250, 2))
        );
        assert_eq!(bean.get_string_or("lastName", "Unknown").unwrap(), "Unknown");
        assert_eq!(bean.get_i64("id").unwrap(), bean.object().id);
        assert_eq!(bean.get_display_name(), "Customer");
        assert!(bean.is_a(&["party.customer*"]));
        assert!(bean.has_node("patients"));

        bean.set_value("firstName", Value::Null).unwrap();
        assert_eq!(bean.get_value("firstName").unwrap(), Value::Null);
    }

    #[test]
    fn test_unknown_node() {
        let service = fixtures::service();
        let mut bean = IMObjectBean::create("party.customerperson", &service).unwrap();
        let err = bean.get_value("firstname").unwrap_err();
        assert_eq!(err.resolver_code(), Some(PropertyResolverErrorCode::InvalidProperty));
        let err = bean.set_value("nickname", "Jo").unwrap_err();
        assert_eq!(err.resolver_code(), Some(PropertyResolverErrorCode::InvalidProperty));
    }

    #[test]
    fn test_set_value_validates() {
        let service = fixtures::service();
        let mut bean = IMObjectBean::create("party.customerperson", &service).unwrap();

        let err = bean.set_value("firstName", "J".repeat(31)).unwrap_err();
        assert_eq!(
            err.validation_errors()[0].code,
            ValidationErrorCode::MaxLength
        );
        let err = bean.set_value("credit", -1).unwrap_err();
        assert_eq!(err.validation_errors()[0].code, ValidationErrorCode::Range);
        assert!(matches!(
            bean.set_value("credit", "lots"),
            Err(ArchetypeError::TypeCoercion { .. })
        ));
        assert!(matches!(
            bean.set_value("patients", "x"),
            Err(ArchetypeError::InvalidCollectionOperation { .. })
        ));
        assert_eq!(bean.get_value("firstName").unwrap(), Value::Null);
    }

    #[test]
    fn test_collection_by_reference() {
        let service = fixtures::service();
        let mut customer = IMObjectBean::create("party.customerperson", &service).unwrap();
        let first = service.create("party.patientpet").unwrap();
        let second = service.create("party.patientpet").unwrap();
        let third = service.create("party.patientpet").unwrap();

        customer.add_value("referrals", first.clone()).unwrap();
        customer.add_value("referrals", first.clone()).unwrap();
        customer.add_value("referrals", second.reference()).unwrap();
        assert_eq!(
            customer.get_values("referrals").unwrap(),
            vec![
                Value::Reference(first.reference()),
                Value::Reference(second.reference())
            ]
        );

        let err = customer.add_value("referrals", third.clone()).unwrap_err();
        assert_eq!(
            err.validation_errors()[0].code,
            ValidationErrorCode::MaxCardinality
        );

        let estimation = service.create("act.customerEstimation").unwrap();
        let err = customer.add_value("referrals", estimation).unwrap_err();
        assert_eq!(
            err.validation_errors()[0].code,
            ValidationErrorCode::ArchetypeRange
        );

        assert!(customer
            .remove_value("referrals", &Value::from(first.reference()))
            .unwrap());
        assert!(!customer
            .remove_value("referrals", &Value::from(first.reference()))
            .unwrap());
        customer.add_value("referrals", third.reference()).unwrap();
        assert_eq!(
            customer.get_values_of("referrals", "party.patientpet").unwrap().len(),
            2
        );
        assert!(customer.get_values_of("referrals", "party.other").unwrap().is_empty());
    }

    #[test]
    fn test_get_objects_dereferences() {
        let service = fixtures::service();
        let mut customer = IMObjectBean::create("party.customerperson", &service).unwrap();
        let mut saved = service.create("party.patientpet").unwrap();
        saved.name = Some("Fido".to_string());
        service.save(&mut saved).unwrap();
        let unsaved = service.create("party.patientpet").unwrap();

        customer.add_value("referrals", saved.reference()).unwrap();
        customer.add_value("referrals", unsaved.reference()).unwrap();
        assert_eq!(customer.get_objects("referrals").unwrap(), vec![saved]);
    }

    #[test]
    fn test_node_participant() {
        let service = fixtures::service();
        let mut estimation = IMObjectBean::create("act.customerEstimation", &service).unwrap();
        let first = service.create("party.customerperson").unwrap();
        let second = service.create("party.customerperson").unwrap();

        assert!(estimation.get_node_participant_ref("customer").unwrap().is_none());
        estimation
            .set_node_participant("customer", &first.reference())
            .unwrap();
        assert_eq!(
            estimation.get_node_participant_ref("customer").unwrap(),
            Some(first.reference())
        );

        estimation
            .set_node_participant("customer", &second.reference())
            .unwrap();
        assert_eq!(estimation.get_values("customer").unwrap().len(), 1);
        assert_eq!(
            estimation.get_node_participant_ref("customer").unwrap(),
            Some(second.reference())
        );
        assert!(estimation.get_node_participant_ref("patient").unwrap().is_none());
        assert!(estimation.get_node_participant("customer").unwrap().is_none());
    }

    #[test]
    fn test_node_targets_mirror_and_remove() {
        let service = fixtures::service();
        let mut customer = IMObjectBean::create("party.customerperson", &service).unwrap();
        let mut patient = service.create("party.patientpet").unwrap();
        patient.name = Some("Fido".to_string());

        let relationship = customer.add_node_target("patients", &mut patient).unwrap();
        assert_eq!(
            relationship.get(&relationship_path("source")).unwrap(),
            Value::from(customer.reference())
        );
        assert_eq!(
            customer.get_node_target_ref("patients").unwrap(),
            Some(patient.reference())
        );
        let mirrored = patient
            .collection(&ValuePath::Property("targetEntityRelationships".to_string()))
            .unwrap();
        assert_eq!(mirrored, &[Value::from(relationship.clone())]);

        service.save(&mut patient).unwrap();
        assert_eq!(customer.get_node_targets("patients").unwrap(), vec![patient.clone()]);

        assert!(customer.remove_node_relationship("patients", &mut patient).unwrap());
        assert!(customer.get_node_target_refs("patients").unwrap().is_empty());
        assert!(patient
            .collection(&ValuePath::Property("targetEntityRelationships".to_string()))
            .unwrap()
            .is_empty());
        assert!(!customer.remove_node_relationship("patients", &mut patient).unwrap());
    }

    #[test]
    fn test_save_reports_validation_errors() {
        let service = fixtures::service();
        let mut customer = IMObjectBean::create("party.customerperson", &service).unwrap();
        assert_eq!(customer.validate().unwrap().len(), 1);
        assert!(customer.save().is_err());
        assert!(customer.object().is_new());

        customer.set_value("lastName", "Smith").unwrap();
        assert!(customer.validate().unwrap().is_empty());
        customer.save().unwrap();
        assert_eq!(customer.object().version, 1);
        assert_eq!(
            service.resolve(&customer.reference()).unwrap(),
            customer.into_object()
        );
    }
}
