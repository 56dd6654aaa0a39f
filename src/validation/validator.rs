use super::{ValidationContext, ValidationError, ValidationErrorCode};
use crate::core::ValidationConfig;
use crate::descriptor::{
    ArchetypeDescriptor, Assertion, DescriptorRegistry, NodeDescriptor, ValueType,
    full_match_pattern, is_a,
};
use crate::error::{ArchetypeError, Result};
use crate::model::{IMObject, Value};
use crate::service::LookupService;

/// Checks objects against their archetype: required nodes, string lengths,
/// assertions and collection cardinality. Parent-child collections are
/// validated recursively against the child's own archetype.
pub struct ArchetypeValidator<'a> {
    registry: &'a DescriptorRegistry,
    lookups: &'a dyn LookupService,
    config: &'a ValidationConfig,
}

impl<'a> ArchetypeValidator<'a> {
    pub fn new(
        registry: &'a DescriptorRegistry,
        lookups: &'a dyn LookupService,
        config: &'a ValidationConfig,
    ) -> Self {
        Self {
            registry,
            lookups,
            config,
        }
    }

    /// Validate `object` and every child object it owns.
    ///
    /// Returns the failed checks; the error path is reserved for objects whose
    /// archetype is not registered and for lookup service failures.
    pub fn validate(&self, object: &IMObject) -> Result<Vec<ValidationError>> {
        let mut context = ValidationContext::new();
        self.validate_object(object, &mut context)?;
        Ok(context.into_errors())
    }

    /// Validate a single (already coerced) value against one node.
    pub fn validate_value(
        &self,
        archetype: &str,
        node: &NodeDescriptor,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let mut context = ValidationContext::new();
        context.push_archetype(archetype);
        match value {
            Value::Collection(items) => self.validate_collection(node, items, &mut context)?,
            _ => self.validate_scalar(node, value, &mut context)?,
        }
        Ok(context.into_errors())
    }

    fn descriptor(&self, object: &IMObject) -> Result<std::sync::Arc<ArchetypeDescriptor>> {
        self.registry
            .get_by_id(&object.archetype_id)
            .or_else(|| self.registry.get(object.short_name()))
            .ok_or_else(|| ArchetypeError::archetype_not_found(object.short_name()))
    }

    fn validate_object(&self, object: &IMObject, context: &mut ValidationContext) -> Result<()> {
        let archetype = self.descriptor(object)?;
        context.push_archetype(object.short_name());
        for node in archetype.nodes() {
            let Some(path) = node.value_path() else {
                continue;
            };
            if node.is_collection() {
                let items = object.collection(&path)?;
                self.validate_collection(node, items, context)?;
                if node.parent_child {
                    for child in node.select(items).filter_map(Value::as_object) {
                        self.validate_object(child, context)?;
                    }
                }
            } else {
                let value = object.get(&path)?;
                self.validate_scalar(node, &value, context)?;
            }
        }
        context.pop_archetype();
        Ok(())
    }

    fn validate_collection(
        &self,
        node: &NodeDescriptor,
        items: &[Value],
        context: &mut ValidationContext,
    ) -> Result<()> {
        let selected: Vec<&Value> = node.select(items).collect();
        let count = selected.len() as u32;
        if count < node.min_cardinality {
            context.add_error(
                &node.name,
                ValidationErrorCode::MinCardinality,
                format!(
                    "{} requires at least {} element(s), found {}",
                    node.display_name(),
                    node.min_cardinality,
                    count
                ),
            );
        }
        if let Some(max) = node.max_cardinality {
            if count > max {
                context.add_error(
                    &node.name,
                    ValidationErrorCode::MaxCardinality,
                    format!(
                        "{} allows at most {} element(s), found {}",
                        node.display_name(),
                        max,
                        count
                    ),
                );
            }
        }

        let range = node.archetype_range();
        if !range.is_empty() {
            for item in selected {
                let short_name = match item {
                    Value::Object(object) => object.short_name(),
                    Value::Reference(reference) => reference.short_name(),
                    other => {
                        context.add_error(
                            &node.name,
                            ValidationErrorCode::TypeMismatch,
                            format!("{} cannot hold a {}", node.display_name(), other.type_name()),
                        );
                        continue;
                    }
                };
                if !is_a(short_name, &range) {
                    context.add_error(
                        &node.name,
                        ValidationErrorCode::ArchetypeRange,
                        format!("{short_name} is not a valid {}", node.display_name()),
                    );
                }
            }
        }
        Ok(())
    }

    fn validate_scalar(
        &self,
        node: &NodeDescriptor,
        value: &Value,
        context: &mut ValidationContext,
    ) -> Result<()> {
        if value.is_empty() {
            if node.is_required() {
                context.add_error(
                    &node.name,
                    ValidationErrorCode::Required,
                    format!("{} is required", node.display_name()),
                );
            }
            return Ok(());
        }

        if !type_matches(node.value_type(), value) {
            context.add_error(
                &node.name,
                ValidationErrorCode::TypeMismatch,
                format!(
                    "{} expects a {}, got a {}",
                    node.display_name(),
                    node.value_type(),
                    value.type_name()
                ),
            );
            return Ok(());
        }

        if let Value::String(s) = value {
            let max = node.max_length.unwrap_or(self.config.default_max_length);
            let len = s.chars().count();
            if len > max as usize {
                context.add_error(
                    &node.name,
                    ValidationErrorCode::MaxLength,
                    format!(
                        "{} is {} characters, maximum is {}",
                        node.display_name(),
                        len,
                        max
                    ),
                );
            }
        }

        for assertion in &node.assertions {
            self.check_assertion(node, assertion, value, context)?;
        }
        Ok(())
    }

    fn check_assertion(
        &self,
        node: &NodeDescriptor,
        assertion: &Assertion,
        value: &Value,
        context: &mut ValidationContext,
    ) -> Result<()> {
        let failure = match assertion {
            Assertion::RegularExpression { expression, .. } => {
                let text = value.to_string();
                let pattern = full_match_pattern(expression).map_err(|e| {
                    ArchetypeError::invalid_archetype(
                        context.current_archetype().to_string(),
                        format!("node {} has invalid expression: {e}", node.name),
                    )
                })?;
                (!pattern.is_match(&text)).then(|| {
                    (
                        ValidationErrorCode::Pattern,
                        format!("{} '{}' does not match {}", node.display_name(), text, expression),
                    )
                })
            }
            Assertion::NumericRange {
                min_value,
                max_value,
                ..
            } => value.as_decimal().and_then(|number| {
                let below = min_value.is_some_and(|min| number < min);
                let above = max_value.is_some_and(|max| number > max);
                (below || above).then(|| {
                    (
                        ValidationErrorCode::Range,
                        format!("{} {} is out of range", node.display_name(), number),
                    )
                })
            }),
            Assertion::LocalLookup { entries, .. } => {
                let code = value.to_string();
                (!entries.contains_key(&code)).then(|| {
                    (
                        ValidationErrorCode::Lookup,
                        format!("'{}' is not a valid {}", code, node.display_name()),
                    )
                })
            }
            Assertion::RemoteLookup { source, .. } => {
                let code = value.to_string();
                let found = self.lookups.get_lookup(source, &code)?.is_some();
                (!found).then(|| {
                    (
                        ValidationErrorCode::Lookup,
                        format!("'{}' is not a valid {}", code, node.display_name()),
                    )
                })
            }
            Assertion::ArchetypeRange { short_names, .. } => {
                value.as_reference().and_then(|reference| {
                    let patterns: Vec<&str> = short_names.iter().map(String::as_str).collect();
                    (!reference.is_a(&patterns)).then(|| {
                        (
                            ValidationErrorCode::ArchetypeRange,
                            format!(
                                "{} is not a valid {}",
                                reference.short_name(),
                                node.display_name()
                            ),
                        )
                    })
                })
            }
            Assertion::Other { .. } => None,
        };

        if let Some((code, message)) = failure {
            let message = assertion
                .error_message()
                .map(str::to_string)
                .unwrap_or(message);
            context.add_error(&node.name, code, message);
        }
        Ok(())
    }
}

fn type_matches(value_type: ValueType, value: &Value) -> bool {
    match (value_type, value) {
        (ValueType::String, Value::String(_)) => true,
        (ValueType::Integer, Value::Integer(_)) => true,
        (ValueType::Decimal, Value::Decimal(_) | Value::Integer(_)) => true,
        (ValueType::Boolean, Value::Boolean(_)) => true,
        (ValueType::Date, Value::Date(_)) => true,
        (ValueType::Reference, Value::Reference(_)) => true,
        (ValueType::Object, Value::Object(_) | Value::Reference(_)) => true,
        (ValueType::Collection, Value::Collection(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ArchetypeId;
    use crate::model::{ObjectClass, ValuePath};
    use rust_decimal::Decimal;

    struct NoLookups;

    impl LookupService for NoLookups {
        fn get_lookup(&self, _short_name: &str, _code: &str) -> Result<Option<IMObject>> {
            Ok(None)
        }

        fn get_lookups(&self, _short_name: &str) -> Result<Vec<IMObject>> {
            Ok(Vec::new())
        }
    }

    fn registry() -> DescriptorRegistry {
        let pet = ArchetypeDescriptor::for_class("party.patientpet.1.0", ObjectClass::Party)
            .unwrap()
            .with_node(
                NodeDescriptor::new("name", "/name", "java.lang.String")
                    .with_cardinality(1, Some(1))
                    .with_max_length(10),
            )
            .with_node(
                NodeDescriptor::new("species", "/details/species", "java.lang.String")
                    .with_assertion(Assertion::local_lookup([("CANINE", "Canine")])),
            )
            .with_node(
                NodeDescriptor::new("breed", "/details/breed", "java.lang.String")
                    .with_assertion(Assertion::remote_lookup("lookup.breed")),
            )
            .with_node(
                NodeDescriptor::new("weight", "/details/weight", "java.math.BigDecimal")
                    .with_assertion(Assertion::numeric_range(
                        Some(Decimal::ZERO),
                        Some(Decimal::from(100)),
                    )),
            )
            .with_node(
                NodeDescriptor::new("microchip", "/details/microchip", "java.lang.String")
                    .with_assertion(Assertion::RegularExpression {
                        expression: "[0-9]{3}".to_string(),
                        error_message: Some("Microchip must be 3 digits".to_string()),
                    }),
            )
            .with_node(
                NodeDescriptor::new("owners", "/targetEntityRelationships", "java.util.HashSet")
                    .with_cardinality(0, Some(1))
                    .with_filter("entityRelationship.patientOwner"),
            );
        let owner = ArchetypeDescriptor::for_class(
            "entityRelationship.patientOwner.1.0",
            ObjectClass::EntityRelationship,
        )
        .unwrap()
        .with_node(
            NodeDescriptor::new("target", "/target", "IMObjectReference")
                .with_cardinality(1, Some(1)),
        );
        DescriptorRegistry::new(vec![pet, owner]).unwrap()
    }

    fn pet() -> IMObject {
        let mut pet = IMObject::new(
            ArchetypeId::parse("party.patientpet.1.0").unwrap(),
            ObjectClass::Party,
            1,
        );
        pet.set(&ValuePath::Name, Value::from("Fido")).unwrap();
        pet
    }

    fn codes(errors: &[ValidationError]) -> Vec<ValidationErrorCode> {
        errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_valid_object() {
        let registry = registry();
        let config = ValidationConfig::default();
        let validator = ArchetypeValidator::new(&registry, &NoLookups, &config);
        assert!(validator.validate(&pet()).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_failures() {
        let registry = registry();
        let config = ValidationConfig::default();
        let validator = ArchetypeValidator::new(&registry, &NoLookups, &config);

        let mut pet = pet();
        pet.set(&ValuePath::Name, Value::from("Fido the Great"))
            .unwrap();
        let detail = |key: &str| ValuePath::Detail(key.to_string());
        pet.set(&detail("species"), Value::from("EQUINE")).unwrap();
        pet.set(&detail("breed"), Value::from("LAB")).unwrap();
        pet.set(&detail("weight"), Value::Decimal(Decimal::from(120)))
            .unwrap();
        pet.set(&detail("microchip"), Value::from("12a")).unwrap();

        let errors = validator.validate(&pet).unwrap();
        assert_eq!(
            codes(&errors),
            vec![
                ValidationErrorCode::MaxLength,
                ValidationErrorCode::Lookup,
                ValidationErrorCode::Lookup,
                ValidationErrorCode::Range,
                ValidationErrorCode::Pattern,
            ]
        );
        assert_eq!(errors[4].message, "Microchip must be 3 digits");
        assert!(errors.iter().all(|e| e.archetype == "party.patientpet"));
    }

    #[test]
    fn test_required() {
        let registry = registry();
        let config = ValidationConfig::default();
        let validator = ArchetypeValidator::new(&registry, &NoLookups, &config);
        let mut pet = pet();
        pet.set(&ValuePath::Name, Value::Null).unwrap();
        let errors = validator.validate(&pet).unwrap();
        assert_eq!(codes(&errors), vec![ValidationErrorCode::Required]);
        assert_eq!(errors[0].node, "name");
    }

    #[test]
    fn test_children_validated() {
        let registry = registry();
        let config = ValidationConfig::default();
        let validator = ArchetypeValidator::new(&registry, &NoLookups, &config);

        let relationship = IMObject::new(
            ArchetypeId::parse("entityRelationship.patientOwner.1.0").unwrap(),
            ObjectClass::EntityRelationship,
            2,
        );
        let mut pet = pet();
        let owners = ValuePath::Property("targetEntityRelationships".to_string());
        pet.collection_mut(&owners)
            .unwrap()
            .push(Value::from(relationship.clone()));

        let errors = validator.validate(&pet).unwrap();
        assert_eq!(codes(&errors), vec![ValidationErrorCode::Required]);
        assert_eq!(errors[0].archetype, "entityRelationship.patientOwner");

        pet.collection_mut(&owners)
            .unwrap()
            .push(Value::from(relationship));
        let errors = validator.validate(&pet).unwrap();
        assert!(codes(&errors).contains(&ValidationErrorCode::MaxCardinality));
    }

    #[test]
    fn test_invalid_expression_is_an_error() {
        let registry = registry();
        let config = ValidationConfig::default();
        let validator = ArchetypeValidator::new(&registry, &NoLookups, &config);
        let node = NodeDescriptor::new("code", "/details/code", "java.lang.String")
            .with_assertion(Assertion::regular_expression("[0-9"));
        assert!(matches!(
            validator.validate_value("party.patientpet", &node, &Value::from("1")),
            Err(ArchetypeError::InvalidArchetype { .. })
        ));
    }

    #[test]
    fn test_unknown_archetype() {
        let registry = DescriptorRegistry::empty();
        let config = ValidationConfig::default();
        let validator = ArchetypeValidator::new(&registry, &NoLookups, &config);
        assert!(matches!(
            validator.validate(&pet()),
            Err(ArchetypeError::ArchetypeNotFound { .. })
        ));
    }
}
