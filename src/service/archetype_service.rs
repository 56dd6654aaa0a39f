use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{InMemoryObjectService, LookupService, ObjectService};
use crate::core::ArchetypeConfig;
use crate::descriptor::{ArchetypeDescriptor, DescriptorRegistry, NodeDescriptor};
use crate::error::{ArchetypeError, Result};
use crate::model::{IMObject, ObjectReference, Value};
use crate::validation::{ArchetypeValidator, ValidationError};

/// Entry point for creating, validating and persisting archetyped objects.
///
/// Holds the descriptor registry and the persistence and lookup services.
/// Shared by reference between beans and resolvers; it carries no per-object
/// state beyond the id sequence.
pub struct ArchetypeService {
    registry: Arc<DescriptorRegistry>,
    objects: Arc<dyn ObjectService>,
    lookups: Arc<dyn LookupService>,
    config: ArchetypeConfig,
    next_id: AtomicI64,
}

impl ArchetypeService {
    pub fn new(
        registry: Arc<DescriptorRegistry>,
        objects: Arc<dyn ObjectService>,
        lookups: Arc<dyn LookupService>,
        config: ArchetypeConfig,
    ) -> Self {
        let next_id = AtomicI64::new(config.persistence.first_id);
        Self {
            registry,
            objects,
            lookups,
            config,
            next_id,
        }
    }

    /// A service over an [`InMemoryObjectService`], which also serves lookups.
    pub fn in_memory(registry: Arc<DescriptorRegistry>, config: ArchetypeConfig) -> Self {
        let store = Arc::new(
            InMemoryObjectService::new(Arc::clone(&registry))
                .with_optimistic_locking(config.persistence.optimistic_locking),
        );
        Self::new(registry, store.clone(), store, config)
    }

    /// Load the configured archetypes and back them with an in-memory store.
    pub fn from_config(config: ArchetypeConfig) -> Result<Self> {
        let registry = Arc::new(DescriptorRegistry::from_config(&config)?);
        Ok(Self::in_memory(registry, config))
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ArchetypeConfig {
        &self.config
    }

    pub fn get_archetype_descriptor(&self, short_name: &str) -> Result<Arc<ArchetypeDescriptor>> {
        self.registry.require(short_name)
    }

    /// The descriptor an object was created from.
    pub fn descriptor_for(&self, object: &IMObject) -> Result<Arc<ArchetypeDescriptor>> {
        self.registry
            .get_by_id(&object.archetype_id)
            .map(Ok)
            .unwrap_or_else(|| self.registry.require(object.short_name()))
    }

    pub fn get_archetype_short_names(&self, pattern: &str) -> Vec<String> {
        self.registry.short_names(pattern)
    }

    /// Hand out the next object id.
    pub fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a new object of the latest version of `short_name`, with node
    /// defaults applied and collections initialised.
    pub fn create(&self, short_name: &str) -> Result<IMObject> {
        let archetype = self.registry.require(short_name)?;
        let class = archetype.object_class()?;
        let mut object = IMObject::new(archetype.archetype_id.clone(), class, self.next_id());

        for node in archetype.nodes() {
            let Some(path) = node.value_path() else {
                continue;
            };
            if node.is_collection() {
                object.collection_mut(&path)?;
            } else if let Some(default) = node.default_literal() {
                let value = node.value_type().coerce(&node.name, Value::from(default))?;
                object.set(&path, value)?;
            }
        }

        tracing::debug!("Created {}", object.reference());
        Ok(object)
    }

    fn validator(&self) -> ArchetypeValidator<'_> {
        ArchetypeValidator::new(&self.registry, self.lookups.as_ref(), &self.config.validation)
    }

    /// Check an object and its children against their archetypes without
    /// saving.
    pub fn validate(&self, object: &IMObject) -> Result<Vec<ValidationError>> {
        self.validator().validate(object)
    }

    /// Check one value against one node.
    pub fn validate_value(
        &self,
        archetype: &str,
        node: &NodeDescriptor,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        self.validator().validate_value(archetype, node, value)
    }

    /// Validate (unless disabled) and persist `object`, updating its version.
    pub fn save(&self, object: &mut IMObject) -> Result<()> {
        if self.config.validation.validate_on_save {
            let errors = self.validate(object)?;
            if !errors.is_empty() {
                tracing::debug!(
                    "Rejected save of {}: {} validation error(s)",
                    object.reference(),
                    errors.len()
                );
                return Err(ArchetypeError::validation(errors));
            }
        }
        object.version = self.objects.save(object)?;
        Ok(())
    }

    /// Save several objects. All are validated before any is written, and
    /// either every object is persisted or none is; versions only change once
    /// the whole batch is stored.
    pub fn save_all(&self, objects: &mut [&mut IMObject]) -> Result<()> {
        if self.config.validation.validate_on_save {
            let mut errors = Vec::new();
            for object in objects.iter() {
                errors.extend(self.validate(object)?);
            }
            if !errors.is_empty() {
                return Err(ArchetypeError::validation(errors));
            }
        }
        let versions = {
            let batch: Vec<&IMObject> = objects.iter().map(|object| &**object).collect();
            self.objects.save_all(&batch)?
        };
        for (object, version) in objects.iter_mut().zip(versions) {
            object.version = version;
        }
        Ok(())
    }

    pub fn get(&self, reference: &ObjectReference) -> Result<Option<IMObject>> {
        self.objects.get(reference)
    }

    /// Dereference a reference that must resolve.
    pub fn resolve(&self, reference: &ObjectReference) -> Result<IMObject> {
        self.objects
            .get(reference)?
            .ok_or_else(|| ArchetypeError::object_not_found(reference))
    }

    pub fn remove(&self, reference: &ObjectReference) -> Result<()> {
        self.objects.remove(reference)
    }

    pub fn query(&self, pattern: &str) -> Result<Vec<IMObject>> {
        self.objects.query(pattern)
    }

    pub fn get_lookup(&self, short_name: &str, code: &str) -> Result<Option<IMObject>> {
        self.lookups.get_lookup(short_name, code)
    }

    pub fn get_lookups(&self, short_name: &str) -> Result<Vec<IMObject>> {
        self.lookups.get_lookups(short_name)
    }
}
