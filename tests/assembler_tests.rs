mod common;

use common::*;
use openvpms_archetype::assembler::ArchetypeRecord;
use openvpms_archetype::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn store_and_service() -> (Arc<InMemoryObjectService>, ArchetypeService) {
    let registry = create_test_registry();
    let store = Arc::new(InMemoryObjectService::new(Arc::clone(&registry)));
    let service = ArchetypeService::new(registry, store.clone(), store.clone(), create_test_config());
    for (code, name) in [("MR", "Mr"), ("MS", "Ms")] {
        create_lookup(&service, "lookup.title", code, name);
    }
    (store, service)
}

#[test]
fn test_stored_customer_record() {
    let (store, service) = store_and_service();
    let customer = create_customer(&service, "J", "Smith");

    let record = store.record(&customer.reference()).unwrap();
    assert_eq!(record.id, customer.id);
    assert_eq!(record.archetype_id, "party.customerperson.1.0");
    assert_eq!(record.version, 1);
    assert_eq!(record.short_name(), "party.customerperson");
    assert_eq!(record.details.get("firstName"), Some(&RecordValue::Text("J".to_string())));
    assert_eq!(record.details.get("title"), Some(&RecordValue::Text("MR".to_string())));
    assert!(!record.details.contains_key("email"));
    assert_eq!(
        record.values.get("/sourceEntityRelationships"),
        Some(&RecordValue::List(Vec::new()))
    );
    assert!(record.children.is_empty());
}

#[test]
fn test_stored_estimation_record() {
    let (store, service) = store_and_service();
    let customer = create_customer(&service, "J", "Smith");
    let mut estimation = create_estimation(&service, &customer);
    service.save(&mut estimation).unwrap();

    let record = store.record(&estimation.reference()).unwrap();
    let Some(RecordValue::List(participations)) = record.values.get("/participations") else {
        panic!("participations not stored as a list");
    };
    assert_eq!(participations.len(), 1);
    let RecordValue::Child(key) = &participations[0] else {
        panic!("participation not stored as a child");
    };
    assert!(key.starts_with("participation.customer:"));

    let child = &record.children[key.as_str()];
    assert_eq!(
        child.values.get("/entity"),
        Some(&RecordValue::Reference(customer.reference().to_string()))
    );
    assert_eq!(
        child.values.get("/act"),
        Some(&RecordValue::Reference(estimation.reference().to_string()))
    );
    assert!(matches!(
        record.values.get("/activityStartTime"),
        Some(RecordValue::Date(_))
    ));

    assert_eq!(service.resolve(&estimation.reference()).unwrap(), estimation);
    assert_eq!(store.len(), 4);
}

#[test]
fn test_shared_child_stored_once() {
    let registry = create_test_registry();
    let service = ArchetypeService::in_memory(Arc::clone(&registry), create_test_config());
    let customer = service.create("party.customerperson").unwrap();
    let mut estimation = create_estimation(&service, &customer);

    let participations = ValuePath::Property("participations".to_string());
    let shared = estimation.collection(&participations).unwrap()[0].clone();
    estimation
        .collection_mut(&participations)
        .unwrap()
        .push(shared);

    let assembler = IMObjectAssembler::new(&registry);
    let record = assembler.to_record(&estimation).unwrap();
    assert_eq!(record.children.len(), 1);
    let Some(RecordValue::List(items)) = record.values.get("/participations") else {
        panic!("participations not stored as a list");
    };
    assert_eq!(items[0], items[1]);

    let restored = assembler.from_record(&record).unwrap();
    assert_eq!(restored, estimation);
}

#[test]
fn test_record_json_round_trip() {
    let (store, service) = store_and_service();
    let customer = create_customer(&service, "J", "Smith");
    let record = store.record(&customer.reference()).unwrap();

    let json = serde_json::to_string(&record).unwrap();
    let parsed: ObjectRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn test_fixture_descriptors_round_trip() {
    let registry = create_test_registry();
    let assembler = ArchetypeDescriptorAssembler::new();
    let mut context = AssemblyContext::new();

    for descriptor in registry.descriptors("*") {
        let record = assembler.assemble_record(&descriptor, &mut context).unwrap();
        assert_eq!(record.short_name, descriptor.short_name());
        assert_eq!(record.nodes.len(), descriptor.nodes.len());
        let restored = assembler.assemble_object(&record, &mut context).unwrap();
        assert_eq!(&restored, descriptor.as_ref(), "{}", descriptor.archetype_id);
    }
}

#[test]
fn test_descriptor_record_contents() {
    let registry = create_test_registry();
    let assembler = ArchetypeDescriptorAssembler::new();
    let mut context = AssemblyContext::new();
    let patient = registry.require("party.patientpet").unwrap();

    let record: ArchetypeRecord = assembler.assemble_record(&patient, &mut context).unwrap();
    assert_eq!(record.archetype_id, "party.patientpet.1.0");
    assert_eq!(record.display_name.as_deref(), Some("Patient(Pet)"));

    let owners = &record.nodes["owners"];
    assert_eq!(owners.max_cardinality, -1);
    assert_eq!(owners.filter.as_deref(), Some("entityRelationship.patientOwner"));

    let species = &record.nodes["species"];
    assert_eq!(species.assertions[0].name, "lookup.local");
    assert_eq!(species.assertions[0].error_message.as_deref(), Some("Invalid species"));
    assert_eq!(
        species.assertions[0].entries,
        vec![
            ("CANINE".to_string(), "Canine".to_string()),
            ("FELINE".to_string(), "Feline".to_string()),
        ]
    );

    let weight = &record.nodes["weight"];
    assert_eq!(weight.assertions[0].properties["maxValue"], "200");
}

#[test]
fn test_update_descriptor_record() {
    let registry = create_test_registry();
    let assembler = ArchetypeDescriptorAssembler::new();
    let mut context = AssemblyContext::new();
    let customer = registry.require("party.customerperson").unwrap();
    let mut record = assembler.assemble_record(&customer, &mut context).unwrap();

    let mut revised = customer.as_ref().clone();
    revised.nodes.shift_remove("email");
    revised = revised.with_node(NodeDescriptor::new("mobile", "/details/mobile", "java.lang.String"));
    assembler.update_record(&mut record, &revised, &mut context).unwrap();

    assert!(!record.nodes.contains_key("email"));
    assert_eq!(record.nodes.keys().last().map(String::as_str), Some("mobile"));
    assert_eq!(assembler.assemble_object(&record, &mut context).unwrap(), revised);
}
