use papaya::{Compute, Operation};
use std::sync::Arc;

use super::{LookupService, ObjectService};
use crate::assembler::{IMObjectAssembler, ObjectRecord, RecordValue};
use crate::descriptor::{DescriptorRegistry, is_a};
use crate::error::{ArchetypeError, Result};
use crate::model::{IMObject, ObjectClass, ObjectReference};

/// Object store backed by a concurrent map of assembled records.
///
/// Every save and get passes through [`IMObjectAssembler`], so objects come
/// back exactly as their archetype describes them. Also serves remote lookups
/// from the stored `Lookup` objects.
pub struct InMemoryObjectService {
    registry: Arc<DescriptorRegistry>,
    records: papaya::HashMap<ObjectReference, ObjectRecord>,
    optimistic_locking: bool,
}

impl InMemoryObjectService {
    pub fn new(registry: Arc<DescriptorRegistry>) -> Self {
        Self {
            registry,
            records: papaya::HashMap::new(),
            optimistic_locking: true,
        }
    }

    pub fn with_optimistic_locking(mut self, enabled: bool) -> Self {
        self.optimistic_locking = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.records.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored record for `reference`, as persisted.
    pub fn record(&self, reference: &ObjectReference) -> Option<ObjectRecord> {
        self.records.pin().get(reference).cloned()
    }

    fn assembler(&self) -> IMObjectAssembler<'_> {
        IMObjectAssembler::new(&self.registry)
    }

    /// Store `record` as the next version of `object`, returning that version
    /// and the record it replaced.
    fn write(
        &self,
        object: &IMObject,
        mut record: ObjectRecord,
    ) -> Result<(i64, Option<ObjectRecord>)> {
        let version = object.version + 1;
        record.version = version;

        let guard = self.records.pin();
        let result = guard.compute(object.reference(), |entry| {
            let found = entry.map(|(_, existing)| existing.version).unwrap_or(0);
            if self.optimistic_locking && found != object.version {
                Operation::Abort(found)
            } else {
                Operation::Insert(record.clone())
            }
        });
        let previous = match result {
            Compute::Aborted(found) => {
                return Err(ArchetypeError::StaleObject {
                    reference: object.reference().to_string(),
                    expected: object.version,
                    found,
                });
            }
            Compute::Updated { old: (_, old), .. } => Some(old.clone()),
            _ => None,
        };
        tracing::debug!("Saved {} at version {}", object.reference(), version);
        Ok((version, previous))
    }

    /// Put back the records replaced by a partly written batch.
    fn restore(&self, written: Vec<(ObjectReference, Option<ObjectRecord>)>) {
        let guard = self.records.pin();
        for (reference, previous) in written.into_iter().rev() {
            tracing::debug!("Rolling back save of {}", reference);
            match previous {
                Some(record) => {
                    guard.insert(reference, record);
                }
                None => {
                    guard.remove(&reference);
                }
            }
        }
    }

    fn select<F>(&self, mut predicate: F) -> Result<Vec<IMObject>>
    where
        F: FnMut(&ObjectReference, &ObjectRecord) -> bool,
    {
        let assembler = self.assembler();
        let guard = self.records.pin();
        let mut objects = guard
            .iter()
            .filter(|(reference, record)| predicate(reference, record))
            .map(|(_, record)| assembler.from_record(record))
            .collect::<Result<Vec<_>>>()?;
        objects.sort_by_key(|o| o.id);
        Ok(objects)
    }
}

impl ObjectService for InMemoryObjectService {
    fn get(&self, reference: &ObjectReference) -> Result<Option<IMObject>> {
        let record = self.records.pin().get(reference).cloned();
        tracing::debug!("Fetching {} (found: {})", reference, record.is_some());
        record
            .map(|record| self.assembler().from_record(&record))
            .transpose()
    }

    fn save(&self, object: &IMObject) -> Result<i64> {
        let record = self.assembler().to_record(object)?;
        let (version, _) = self.write(object, record)?;
        Ok(version)
    }

    fn save_all(&self, objects: &[&IMObject]) -> Result<Vec<i64>> {
        let assembler = self.assembler();
        let records = objects
            .iter()
            .map(|object| assembler.to_record(object))
            .collect::<Result<Vec<_>>>()?;

        let mut written = Vec::with_capacity(objects.len());
        let mut versions = Vec::with_capacity(objects.len());
        for (object, record) in objects.iter().zip(records) {
            match self.write(object, record) {
                Ok((version, previous)) => {
                    written.push((object.reference(), previous));
                    versions.push(version);
                }
                Err(err) => {
                    self.restore(written);
                    return Err(err);
                }
            }
        }
        Ok(versions)
    }

    fn remove(&self, reference: &ObjectReference) -> Result<()> {
        match self.records.pin().remove(reference) {
            Some(_) => {
                tracing::debug!("Removed {}", reference);
                Ok(())
            }
            None => Err(ArchetypeError::object_not_found(reference)),
        }
    }

    fn query(&self, pattern: &str) -> Result<Vec<IMObject>> {
        self.select(|reference, _| is_a(reference.short_name(), &[pattern]))
    }
}

impl LookupService for InMemoryObjectService {
    fn get_lookup(&self, short_name: &str, code: &str) -> Result<Option<IMObject>> {
        let mut found = self.select(|reference, record| {
            reference.short_name() == short_name
                && matches!(record.values.get("/code"), Some(RecordValue::Text(c)) if c == code)
        })?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    fn get_lookups(&self, short_name: &str) -> Result<Vec<IMObject>> {
        let mut lookups = self.query(short_name)?;
        lookups.retain(|o| o.class == ObjectClass::Lookup);
        Ok(lookups)
    }
}
