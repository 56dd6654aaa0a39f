use crate::descriptor::{LookupSource, NodeDescriptor};
use crate::error::{PropertyResolverError, Result};
use crate::model::{IMObject, ObjectClass, Value, ValuePath};
use crate::service::ArchetypeService;

use super::object_set::ObjectSet;
use super::path::{PropertyPath, Segment};
use super::state::PropertyState;

/// Resolves property paths against an [`ObjectSet`]. The first segment of a
/// path names a root in the set.
///
/// A null reached part-way along a path resolves to null; an unknown name on
/// an object, or a name after a primitive value, is an error.
pub struct PropertySetResolver<'a> {
    set: &'a ObjectSet,
    service: &'a ArchetypeService,
}

impl<'a> PropertySetResolver<'a> {
    pub fn new(set: &'a ObjectSet, service: &'a ArchetypeService) -> Self {
        Self { set, service }
    }

    /// The value at `path`.
    pub fn get_object(&self, path: &str) -> Result<Value> {
        Ok(self.resolve(path)?.into_value())
    }

    /// The value at `path`, with the object and node it was read from.
    pub fn resolve(&self, path: &str) -> Result<PropertyState> {
        self.resolve_path(&PropertyPath::parse(path)?)
    }

    pub fn resolve_path(&self, path: &PropertyPath) -> Result<PropertyState> {
        let root = path.root();
        let value = self
            .set
            .get(&root.name)
            .cloned()
            .ok_or_else(|| PropertyResolverError::invalid_property(root.name.clone()))?;
        let value = index_root(value, root, path)?;
        let state = PropertyState {
            parent: None,
            node: None,
            name: root.name.clone(),
            value,
        };
        Walker::new(self.service, path).walk(state, 1)
    }
}

/// Resolves property paths against a single object. Every segment, including
/// the first, names a node or pseudo-property.
pub struct NodeResolver<'a> {
    object: &'a IMObject,
    service: &'a ArchetypeService,
}

impl<'a> NodeResolver<'a> {
    pub fn new(object: &'a IMObject, service: &'a ArchetypeService) -> Self {
        Self { object, service }
    }

    pub fn get_object(&self, path: &str) -> Result<Value> {
        Ok(self.resolve(path)?.into_value())
    }

    pub fn resolve(&self, path: &str) -> Result<PropertyState> {
        self.resolve_path(&PropertyPath::parse(path)?)
    }

    pub fn resolve_path(&self, path: &PropertyPath) -> Result<PropertyState> {
        let state = PropertyState {
            parent: None,
            node: None,
            name: String::new(),
            value: Value::from(self.object.clone()),
        };
        Walker::new(self.service, path).walk(state, 0)
    }
}

fn index_root(value: Value, root: &Segment, path: &PropertyPath) -> Result<Value> {
    match (root.index, value) {
        (None, value) => Ok(value),
        (Some(index), Value::Collection(items)) => {
            let len = items.len();
            items
                .into_iter()
                .nth(index)
                .ok_or_else(|| PropertyResolverError::invalid_index(path.prefix(0), index, len).into())
        }
        (Some(_), Value::Null) => Ok(Value::Null),
        (Some(_), _) => Err(PropertyResolverError::invalid_object(path.prefix(0)).into()),
    }
}

/// A lookup reached through a lookup node that is not the last segment.
enum LookupView {
    Local {
        code: String,
        name: Option<String>,
        display_name: String,
    },
    Remote {
        code: String,
        lookup: Option<IMObject>,
        display_name: String,
    },
}

impl LookupView {
    fn property(&self, name: &str) -> Option<Value> {
        let value = match (self, name) {
            (LookupView::Local { code, .. } | LookupView::Remote { code, .. }, "code") => {
                Value::from(code.as_str())
            }
            (LookupView::Local { name, .. }, "name") => Value::from(name.clone()),
            (LookupView::Remote { lookup, .. }, "name") => {
                Value::from(lookup.as_ref().and_then(|l| l.name.clone()))
            }
            (LookupView::Local { .. }, "id") => Value::Null,
            (LookupView::Remote { lookup, .. }, "id") => Value::from(lookup.as_ref().map(|l| l.id)),
            (
                LookupView::Local { display_name, .. } | LookupView::Remote { display_name, .. },
                "displayName",
            ) => Value::from(display_name.as_str()),
            _ => return None,
        };
        Some(value)
    }
}

enum Current {
    Value(Value),
    Lookup(LookupView),
}

struct Walker<'a> {
    service: &'a ArchetypeService,
    path: &'a PropertyPath,
}

impl<'a> Walker<'a> {
    fn new(service: &'a ArchetypeService, path: &'a PropertyPath) -> Self {
        Self { service, path }
    }

    fn walk(&self, state: PropertyState, start: usize) -> Result<PropertyState> {
        let segments = self.path.segments();
        let mut state = state;
        let mut current = Current::Value(state.value.clone());

        for (position, segment) in segments.iter().enumerate().skip(start) {
            let last = position + 1 == segments.len();
            current = match current {
                Current::Lookup(view) => {
                    let value = view
                        .property(&segment.name)
                        .ok_or_else(|| PropertyResolverError::invalid_property(self.path.prefix(position)))?;
                    state = PropertyState {
                        parent: None,
                        node: None,
                        name: segment.name.clone(),
                        value: Value::Null,
                    };
                    Current::Value(value)
                }
                Current::Value(value) => {
                    let (next, next_state) = self.step(value, segment, position, last)?;
                    state = next_state;
                    next
                }
            };
            if let Current::Value(Value::Null) = current {
                // a null part-way along resolves the whole path to null
                state.value = Value::Null;
                state.name = segments[segments.len() - 1].name.clone();
                return Ok(state);
            }
        }

        match current {
            Current::Value(value) => {
                state.value = value;
                Ok(state)
            }
            Current::Lookup(_) => Err(PropertyResolverError::invalid_object(self.path.to_string()).into()),
        }
    }

    fn step(
        &self,
        value: Value,
        segment: &Segment,
        position: usize,
        last: bool,
    ) -> Result<(Current, PropertyState)> {
        match value {
            Value::Collection(items) => {
                let first = items.into_iter().next().unwrap_or_default();
                self.step(first, segment, position, last)
            }
            Value::Reference(reference) => {
                let metadata = match segment.name.as_str() {
                    "shortName" => Some(Value::from(reference.short_name())),
                    "id" => Some(Value::Integer(reference.id)),
                    _ => None,
                };
                if let Some(value) = metadata {
                    return Ok((Current::Value(value), self.bare(segment)));
                }
                let object = self.service.get(&reference)?.ok_or_else(|| {
                    PropertyResolverError::object_not_found(self.path.prefix(position), &reference)
                })?;
                tracing::debug!("Dereferenced {} for {}", reference, self.path);
                self.step_object(object, segment, position, last)
            }
            Value::Object(object) => self.step_object(*object, segment, position, last),
            Value::Null => Ok((Current::Value(Value::Null), self.bare(segment))),
            _ => Err(PropertyResolverError::invalid_object(self.path.prefix(position)).into()),
        }
    }

    fn bare(&self, segment: &Segment) -> PropertyState {
        PropertyState {
            parent: None,
            node: None,
            name: segment.name.clone(),
            value: Value::Null,
        }
    }

    fn step_object(
        &self,
        object: IMObject,
        segment: &Segment,
        position: usize,
        last: bool,
    ) -> Result<(Current, PropertyState)> {
        let archetype = self.service.descriptor_for(&object)?;
        let Some(node) = archetype.node(&segment.name) else {
            let value = self.pseudo_property(&object, archetype.display_name(), segment, position)?;
            let state = PropertyState {
                parent: Some(object),
                node: None,
                name: segment.name.clone(),
                value: Value::Null,
            };
            return Ok((Current::Value(value), state));
        };

        let path = node
            .value_path()
            .ok_or_else(|| PropertyResolverError::invalid_property(self.path.prefix(position)))?;
        let current = if node.is_collection() {
            let selected: Vec<Value> = node.select(object.collection(&path)?).cloned().collect();
            let value = match segment.index {
                Some(index) => {
                    let len = selected.len();
                    selected.into_iter().nth(index).ok_or_else(|| {
                        PropertyResolverError::invalid_index(self.path.prefix(position), index, len)
                    })?
                }
                None if last && node.filter.is_none() => Value::Collection(selected),
                None => selected.into_iter().next().unwrap_or_default(),
            };
            Current::Value(value)
        } else {
            if segment.index.is_some() {
                return Err(PropertyResolverError::invalid_path(
                    self.path.prefix(position),
                    format!("node {} is not a collection", node.name),
                )
                .into());
            }
            let value = object.get(&path)?;
            match value {
                Value::String(code) if !last && node.is_lookup() => {
                    Current::Lookup(self.lookup_view(node, code)?)
                }
                value => Current::Value(value),
            }
        };

        let state = PropertyState {
            parent: Some(object),
            node: Some(node.clone()),
            name: segment.name.clone(),
            value: Value::Null,
        };
        Ok((current, state))
    }

    /// Metadata names answered when the object has no node of that name.
    fn pseudo_property(
        &self,
        object: &IMObject,
        display_name: &str,
        segment: &Segment,
        position: usize,
    ) -> Result<Value> {
        let value = match segment.name.as_str() {
            "displayName" => Value::from(display_name),
            "shortName" => Value::from(object.short_name()),
            "id" => Value::Integer(object.id),
            "name" => Value::from(object.name.clone()),
            "code" if object.class == ObjectClass::Lookup => {
                object.get(&ValuePath::Property("code".to_string()))?
            }
            _ => {
                return Err(PropertyResolverError::invalid_property(self.path.prefix(position)).into());
            }
        };
        Ok(value)
    }

    fn lookup_view(&self, node: &NodeDescriptor, code: String) -> Result<LookupView> {
        let view = match node.lookup_source() {
            Some(LookupSource::Local(entries)) => LookupView::Local {
                name: entries.get(&code).cloned(),
                code,
                display_name: node.display_name(),
            },
            Some(LookupSource::Remote(source)) => {
                let lookup = self.service.get_lookup(source, &code)?;
                let display_name = self
                    .service
                    .registry()
                    .get(source)
                    .map(|a| a.display_name().to_string())
                    .unwrap_or_else(|| node.display_name());
                LookupView::Remote {
                    code,
                    lookup,
                    display_name,
                }
            }
            None => LookupView::Local {
                name: None,
                code,
                display_name: node.display_name(),
            },
        };
        Ok(view)
    }
}
