use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

use super::record::ObjectRecord;
use crate::model::IMObject;

/// State shared across one assembly: the child record table and the objects
/// already built from it.
#[derive(Debug, Default)]
pub struct AssemblyContext {
    records: IndexMap<String, ObjectRecord>,
    objects: HashMap<String, IMObject>,
    in_progress: HashSet<String>,
}

impl AssemblyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context for rebuilding objects from `children`.
    pub fn with_records(children: IndexMap<String, ObjectRecord>) -> Self {
        Self {
            records: children,
            ..Self::default()
        }
    }

    pub fn has_record(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn record(&self, key: &str) -> Option<&ObjectRecord> {
        self.records.get(key)
    }

    pub fn add_record(&mut self, key: String, record: ObjectRecord) {
        self.records.insert(key, record);
    }

    pub fn object(&self, key: &str) -> Option<&IMObject> {
        self.objects.get(key)
    }

    pub fn add_object(&mut self, key: String, object: IMObject) {
        self.objects.insert(key, object);
    }

    /// Mark `key` as being assembled. Returns false if it already is, which
    /// means the graph is cyclic.
    pub fn begin(&mut self, key: &str) -> bool {
        self.in_progress.insert(key.to_string())
    }

    pub fn end(&mut self, key: &str) {
        self.in_progress.remove(key);
    }

    pub fn into_records(self) -> IndexMap<String, ObjectRecord> {
        self.records
    }
}
