use indexmap::IndexMap;

use crate::model::{IMObject, ObjectReference, Value};

/// Named roots for property resolution: objects, references, primitives or
/// null, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSet {
    values: IndexMap<String, Value>,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_object(self, name: impl Into<String>, object: IMObject) -> Self {
        self.with(name, object)
    }

    pub fn with_reference(self, name: impl Into<String>, reference: ObjectReference) -> Self {
        self.with(name, reference)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ObjectSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ObjectSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}
