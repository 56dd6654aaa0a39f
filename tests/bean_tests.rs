mod common;

use chrono::NaiveDate;
use common::*;
use openvpms_archetype::*;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn first_error(err: ArchetypeError) -> ValidationErrorCode {
    err.validation_errors()[0].code
}

#[test]
fn test_create_applies_node_defaults() {
    let service = create_test_service();
    let customer = IMObjectBean::create("party.customerperson", &service).unwrap();
    assert_eq!(customer.get_string("title").unwrap().as_deref(), Some("MR"));
    assert!(customer.get_bool("active").unwrap());

    let patient = IMObjectBean::create("party.patientpet", &service).unwrap();
    assert!(!patient.get_bool("desexed").unwrap());

    let item = IMObjectBean::create("act.customerEstimationItem", &service).unwrap();
    assert_eq!(item.get_decimal("quantity").unwrap(), Some(Decimal::ONE));

    let estimation = IMObjectBean::create("act.customerEstimation", &service).unwrap();
    assert_eq!(
        estimation.get_date("startTime").unwrap(),
        NaiveDate::from_ymd_opt(2026, 1, 1).and_then(|d| d.and_hms_opt(9, 0, 0))
    );
    assert_eq!(estimation.get_string("status").unwrap().as_deref(), Some("IN_PROGRESS"));
}

#[test]
fn test_assertions_on_set() {
    let service = create_test_service();
    let mut customer = IMObjectBean::create("party.customerperson", &service).unwrap();

    customer.set_value("email", "j@example.com").unwrap();
    let err = customer.set_value("email", "not an email").unwrap_err();
    assert_eq!(err.validation_errors()[0].message, "Invalid email address");
    assert_eq!(first_error(err), ValidationErrorCode::Pattern);

    customer.set_value("title", "DR").unwrap();
    let err = customer.set_value("title", "SIR").unwrap_err();
    assert_eq!(first_error(err), ValidationErrorCode::Lookup);

    let err = customer.set_value("lastName", "x".repeat(31)).unwrap_err();
    assert_eq!(first_error(err), ValidationErrorCode::MaxLength);

    let mut patient = IMObjectBean::create("party.patientpet", &service).unwrap();
    patient.set_value("weight", "12.5").unwrap();
    assert_eq!(first_error(patient.set_value("weight", 201).unwrap_err()), ValidationErrorCode::Range);
    let err = patient.set_value("species", "EQUINE").unwrap_err();
    assert_eq!(err.validation_errors()[0].message, "Invalid species");

    patient.set_value("dateOfBirth", "2020-03-04").unwrap();
    assert_eq!(
        patient.get_date("dateOfBirth").unwrap(),
        NaiveDate::from_ymd_opt(2020, 3, 4).and_then(|d| d.and_hms_opt(0, 0, 0))
    );
    assert!(matches!(
        patient.set_value("dateOfBirth", "yesterday"),
        Err(ArchetypeError::TypeCoercion { .. })
    ));
}

#[test]
fn test_deferred_validation() {
    let config = create_test_config().with_validation_config(ValidationConfig::deferred());
    let service = ArchetypeService::from_config(config).unwrap();
    let mut patient = IMObjectBean::create("party.patientpet", &service).unwrap();
    patient.set_value("species", "EQUINE").unwrap();
    patient.set_value("name", "Fido").unwrap();

    let errors = patient.validate().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node, "species");
    assert!(patient.save().is_err());

    patient.set_value("species", "CANINE").unwrap();
    patient.save().unwrap();
}

#[test]
fn test_save_aggregates_errors() {
    let service = create_test_service();
    let mut patient = IMObjectBean::create("party.patientpet", &service).unwrap();
    let err = patient.save().unwrap_err();
    let mut nodes: Vec<_> = err.validation_errors().iter().map(|e| e.node.as_str()).collect();
    nodes.sort();
    assert_eq!(nodes, vec!["name", "species"]);
    assert!(err.validation_errors().iter().all(|e| e.code == ValidationErrorCode::Required));
}

#[test]
fn test_save_and_reload() {
    let service = create_test_service();
    let customer = create_customer(&service, "J", "Smith");
    assert_eq!(customer.version, 1);

    let stored = service.resolve(&customer.reference()).unwrap();
    assert_eq!(stored, customer);

    let mut bean = IMObjectBean::new(stored, &service).unwrap();
    bean.set_value("firstName", "Jo").unwrap();
    bean.save().unwrap();
    assert_eq!(bean.object().version, 2);

    // a stale copy can no longer be saved
    let mut stale = customer;
    let err = service.save(&mut stale).unwrap_err();
    assert!(matches!(err, ArchetypeError::StaleObject { expected: 1, found: 2, .. }));
}

#[test]
fn test_save_all_is_all_or_nothing() {
    let service = create_test_service();
    let customer = create_customer(&service, "J", "Smith");
    let mut stale = customer.clone();
    let mut bean = IMObjectBean::new(customer, &service).unwrap();
    bean.set_value("firstName", "Jo").unwrap();
    bean.save().unwrap();

    let mut patient = create_patient(&service, "Fido", "CANINE");
    let err = service
        .save_all(&mut [&mut patient, &mut stale])
        .unwrap_err();
    assert!(matches!(err, ArchetypeError::StaleObject { expected: 1, found: 2, .. }));
    assert_eq!(patient.version, 0);
    assert_eq!(stale.version, 1);
    assert!(service.get(&patient.reference()).unwrap().is_none());
    assert_eq!(service.resolve(&stale.reference()).unwrap(), *bean.object());

    // validation failures also leave the store untouched
    let mut unnamed = service.create("party.patientpet").unwrap();
    let err = service
        .save_all(&mut [&mut patient, &mut unnamed])
        .unwrap_err();
    assert_eq!(first_error(err), ValidationErrorCode::Required);
    assert!(service.get(&patient.reference()).unwrap().is_none());

    let mut current = bean.into_object();
    service.save_all(&mut [&mut patient, &mut current]).unwrap();
    assert_eq!(patient.version, 1);
    assert_eq!(current.version, 3);
    assert_eq!(service.resolve(&patient.reference()).unwrap(), patient);
    assert_eq!(service.resolve(&current.reference()).unwrap(), current);
}

#[test]
fn test_patient_owner_relationship() {
    let service = create_test_service();
    let customer = create_customer(&service, "J", "Smith");
    let mut patient = create_patient(&service, "Fido", "CANINE");

    let mut owner = EntityBean::new(customer, &service).unwrap();
    owner
        .add_relationship("entityRelationship.patientOwner", &mut patient)
        .unwrap();

    service.save(&mut patient).unwrap();
    owner.save().unwrap();

    let owner = EntityBean::new(service.resolve(&owner.reference()).unwrap(), &service).unwrap();
    assert_eq!(
        owner.get_target_entity_refs("entityRelationship.patientOwner").unwrap(),
        vec![patient.reference()]
    );
    assert_eq!(owner.get_node_targets("patients").unwrap(), vec![patient.clone()]);

    let pet = IMObjectBean::new(service.resolve(&patient.reference()).unwrap(), &service).unwrap();
    assert_eq!(pet.get_node_source_refs("owners").unwrap(), vec![owner.reference()]);
}

#[test]
fn test_unmapped_relationship_collections_persist() {
    let service = create_test_service();
    let mut customer = create_customer(&service, "J", "Smith");
    let patient = create_patient(&service, "Fido", "CANINE");

    // neither side maps these collections with a node
    let mut pet = EntityBean::new(patient, &service).unwrap();
    let relationship = pet
        .add_relationship("entityRelationship.patientOwner", &mut customer)
        .unwrap();
    pet.save().unwrap();
    service.save(&mut customer).unwrap();

    let pet = EntityBean::new(service.resolve(&pet.reference()).unwrap(), &service).unwrap();
    assert_eq!(
        pet.get_relationships("entityRelationship.patientOwner").unwrap(),
        vec![relationship]
    );

    let customer = EntityBean::new(service.resolve(&customer.reference()).unwrap(), &service).unwrap();
    assert_eq!(
        customer.get_source_entity_refs("entityRelationship.patientOwner").unwrap(),
        vec![pet.reference()]
    );
}

#[test]
fn test_relationship_archetype_range() {
    let service = create_test_service();
    let first = create_patient(&service, "Fido", "CANINE");
    let second = create_patient(&service, "Rex", "CANINE");

    // a patient cannot own a patient
    let relationship = service.create("entityRelationship.patientOwner").unwrap();
    let mut relationship = IMObjectBean::new(relationship, &service).unwrap();
    let err = relationship.set_value("source", first.reference()).unwrap_err();
    assert_eq!(first_error(err), ValidationErrorCode::ArchetypeRange);

    relationship
        .object_mut()
        .set(&ValuePath::Property("source".to_string()), Value::from(first.reference()))
        .unwrap();
    relationship.set_value("target", second.reference()).unwrap();
    let errors = relationship.validate().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node, "source");
    assert_eq!(errors[0].code, ValidationErrorCode::ArchetypeRange);
}

#[test]
fn test_estimation_participations() {
    let service = create_test_service();
    let customer = create_customer(&service, "J", "Smith");
    let mut patient = create_patient(&service, "Fido", "FELINE");
    service.save(&mut patient).unwrap();

    let mut estimation = ActBean::create("act.customerEstimation", &service).unwrap();
    assert!(estimation.save().is_err());

    estimation
        .add_participation("participation.customer", &customer.reference())
        .unwrap();
    estimation
        .set_node_participant("patient", &patient.reference())
        .unwrap();
    estimation.save().unwrap();

    let stored = ActBean::new(service.resolve(&estimation.reference()).unwrap(), &service).unwrap();
    assert_eq!(stored.get_participant("participation.customer").unwrap(), Some(customer));
    assert_eq!(stored.get_node_participant("patient").unwrap(), Some(patient));
    assert_eq!(stored.get_values("customer").unwrap().len(), 1);

    // the patient participation must reference a patient
    let mut wrong = ActBean::create("act.customerEstimation", &service).unwrap();
    wrong
        .add_participation("participation.customer", &ObjectReference::new("party.patientpet", 1))
        .unwrap();
    let errors = wrong.validate().unwrap();
    assert!(errors.iter().any(|e| e.code == ValidationErrorCode::ArchetypeRange));
}

#[test]
fn test_estimation_items() {
    let service = create_test_service();
    let customer = create_customer(&service, "J", "Smith");
    let mut estimation = ActBean::new(create_estimation(&service, &customer), &service).unwrap();

    let mut items = Vec::new();
    for quantity in [1, 2, 3] {
        let mut item = IMObjectBean::create("act.customerEstimationItem", &service).unwrap();
        item.set_value("quantity", quantity).unwrap();
        let mut item = item.into_object();
        estimation
            .add_act_relationship("actRelationship.estimationItem", &mut item)
            .unwrap();
        items.push(item);
    }
    for item in &mut items {
        service.save(item).unwrap();
    }
    estimation.save().unwrap();

    let refs = estimation.get_node_target_refs("items").unwrap();
    assert_eq!(refs, items.iter().map(IMObject::reference).collect::<Vec<_>>());

    let total: Decimal = estimation
        .get_node_targets("items")
        .unwrap()
        .into_iter()
        .map(|item| IMObjectBean::new(item, &service).unwrap().get_decimal_or("quantity", Decimal::ZERO).unwrap())
        .sum();
    assert_eq!(total, Decimal::from(6));

    let first = IMObjectBean::new(items.remove(0), &service).unwrap();
    assert_eq!(first.get_node_source_refs("estimation").unwrap(), vec![estimation.reference()]);
}

#[test]
fn test_metadata_accessors() {
    let service = create_test_service();
    let bean = IMObjectBean::create("party.patientpet", &service).unwrap();
    assert_eq!(bean.get_display_name(), "Patient(Pet)");
    assert_eq!(bean.get_short_name(), "party.patientpet");
    assert!(bean.is_a(&["party.*"]));
    assert!(!bean.is_a(&["act.*"]));
    assert!(bean.has_node("species"));
    assert!(!bean.has_node("Species"));
    assert_eq!(bean.get_node("dateOfBirth").unwrap().display_name(), "Date Of Birth");
    assert_eq!(
        bean.get_value("Species").unwrap_err().resolver_code(),
        Some(PropertyResolverErrorCode::InvalidProperty)
    );
}
