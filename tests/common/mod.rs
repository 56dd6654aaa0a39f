use openvpms_archetype::*;
use std::path::PathBuf;
use std::sync::Arc;

#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/archetypes")
}

#[allow(dead_code)]
pub fn create_test_config() -> ArchetypeConfig {
    ArchetypeConfig::for_directory(fixtures_dir())
}

#[allow(dead_code)]
pub fn create_test_registry() -> Arc<DescriptorRegistry> {
    Arc::new(DescriptorRegistry::from_config(&create_test_config()).unwrap())
}

/// A service over the fixture archetypes with the title lookups saved.
#[allow(dead_code)]
pub fn create_test_service() -> ArchetypeService {
    let service = ArchetypeService::from_config(create_test_config()).unwrap();
    for (code, name) in [("MR", "Mr"), ("MS", "Ms"), ("DR", "Dr")] {
        create_lookup(&service, "lookup.title", code, name);
    }
    service
}

#[allow(dead_code)]
pub fn create_lookup(service: &ArchetypeService, short_name: &str, code: &str, name: &str) -> IMObject {
    let mut lookup = IMObjectBean::create(short_name, service).unwrap();
    lookup.set_value("code", code).unwrap();
    lookup.set_value("name", name).unwrap();
    lookup.save().unwrap();
    lookup.into_object()
}

/// A saved customer named `first_name last_name`.
#[allow(dead_code)]
pub fn create_customer(service: &ArchetypeService, first_name: &str, last_name: &str) -> IMObject {
    let mut customer = IMObjectBean::create("party.customerperson", service).unwrap();
    customer.set_value("firstName", first_name).unwrap();
    customer.set_value("lastName", last_name).unwrap();
    customer.save().unwrap();
    customer.into_object()
}

/// An unsaved patient of the given species.
#[allow(dead_code)]
pub fn create_patient(service: &ArchetypeService, name: &str, species: &str) -> IMObject {
    let mut patient = IMObjectBean::create("party.patientpet", service).unwrap();
    patient.set_value("name", name).unwrap();
    patient.set_value("species", species).unwrap();
    patient.into_object()
}

/// An unsaved estimate for `customer`.
#[allow(dead_code)]
pub fn create_estimation(service: &ArchetypeService, customer: &IMObject) -> IMObject {
    let mut act = ActBean::create("act.customerEstimation", service).unwrap();
    act.add_participation("participation.customer", &customer.reference())
        .unwrap();
    act.into_bean().into_object()
}
