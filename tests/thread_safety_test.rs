mod common;

use common::*;
use openvpms_archetype::*;
use std::sync::Arc;
use std::thread;

#[test]
fn test_service_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<ArchetypeService>();
    assert_send_sync::<DescriptorRegistry>();
    assert_send_sync::<InMemoryObjectService>();
    assert_send_sync::<ArchetypeError>();
}

#[test]
fn test_reads_during_reload() {
    let registry = create_test_registry();
    let lookups = ArchetypeLoader::load_path(&fixtures_dir().join("lookup.adl")).unwrap();
    let everything = ArchetypeLoader::load_path(&fixtures_dir()).unwrap();
    let mut handles = vec![];

    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                // every snapshot is a complete table: either both lookups or all ten
                let snapshot = registry.snapshot();
                let len = snapshot.len();
                assert!(len == 2 || len == 10, "torn snapshot of {len} archetypes");
                assert!(snapshot.get("lookup.title").is_some());
            }
        }));
    }

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..50 {
                let descriptors = if i % 2 == 0 {
                    lookups.clone()
                } else {
                    everything.clone()
                };
                registry.reload(descriptors).unwrap();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    writer.join().unwrap();
    assert_eq!(registry.generation(), 51);
}

#[test]
fn test_concurrent_saves_of_distinct_objects() {
    let service = Arc::new(create_test_service());
    let mut handles = vec![];

    for i in 0..4 {
        let service = Arc::clone(&service);
        handles.push(thread::spawn(move || {
            (0..25)
                .map(|j| create_customer(&service, &format!("C{i}"), &format!("N{j}")).id)
                .collect::<Vec<_>>()
        }));
    }

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 100);
    assert_eq!(service.query("party.customerperson").unwrap().len(), 100);
}

#[test]
fn test_concurrent_updates_of_one_object() {
    let service = Arc::new(create_test_service());
    let customer = create_customer(&service, "J", "Smith");
    let mut handles = vec![];

    // every thread saves the same version; exactly one wins
    for i in 0..8 {
        let service = Arc::clone(&service);
        let copy = customer.clone();
        handles.push(thread::spawn(move || {
            let mut bean = IMObjectBean::new(copy, &service).unwrap();
            bean.set_value("firstName", format!("T{i}")).unwrap();
            bean.save().is_ok()
        }));
    }

    let saved = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(saved, 1);
    assert_eq!(service.resolve(&customer.reference()).unwrap().version, 2);
}

#[tokio::test]
async fn test_async_resolution() {
    let service = Arc::new(create_test_service());
    let customer = create_customer(&service, "J", "Smith");
    let set = Arc::new(ObjectSet::new().with("act", create_estimation(&service, &customer)));
    let mut tasks = vec![];

    for _ in 0..4 {
        let service = Arc::clone(&service);
        let set = Arc::clone(&set);
        tasks.push(tokio::spawn(async move {
            PropertySetResolver::new(&set, &service)
                .get_object("act.customer.entity.title.name")
                .unwrap()
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), Value::from("Mr"));
    }
}
