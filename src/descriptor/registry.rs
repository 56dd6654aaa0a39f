use arc_swap::ArcSwap;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

use super::archetype::ArchetypeDescriptor;
use super::archetype_id::ArchetypeId;
use super::loader::ArchetypeLoader;
use super::short_name;
use crate::core::ArchetypeConfig;
use crate::error::{ArchetypeError, Result};

/// An immutable, fully validated set of archetype descriptors.
#[derive(Debug, Clone, Default)]
pub struct ArchetypeSnapshot {
    /// The latest version of each short name, in load order.
    by_short_name: IndexMap<String, Arc<ArchetypeDescriptor>>,
    by_id: HashMap<ArchetypeId, Arc<ArchetypeDescriptor>>,
    generation: u64,
}

impl ArchetypeSnapshot {
    fn build(descriptors: Vec<ArchetypeDescriptor>, generation: u64) -> Result<Self> {
        let mut by_short_name: IndexMap<String, Arc<ArchetypeDescriptor>> = IndexMap::new();
        let mut by_id = HashMap::new();

        for descriptor in descriptors {
            descriptor.validate_structure()?;
            let descriptor = Arc::new(descriptor);
            if by_id
                .insert(descriptor.archetype_id.clone(), Arc::clone(&descriptor))
                .is_some()
            {
                return Err(ArchetypeError::invalid_archetype(
                    descriptor.archetype_id.to_string(),
                    "duplicate archetype definition".to_string(),
                ));
            }

            let short_name = descriptor.short_name().to_string();
            let replace = match by_short_name.get(&short_name) {
                Some(existing) => descriptor.latest || !existing.latest,
                None => true,
            };
            if replace {
                by_short_name.insert(short_name, descriptor);
            }
        }

        Ok(Self {
            by_short_name,
            by_id,
            generation,
        })
    }

    pub fn get(&self, short_name: &str) -> Option<&Arc<ArchetypeDescriptor>> {
        self.by_short_name.get(short_name)
    }

    pub fn get_by_id(&self, id: &ArchetypeId) -> Option<&Arc<ArchetypeDescriptor>> {
        self.by_id.get(id)
    }

    /// Short names matching `pattern`, in load order.
    pub fn short_names(&self, pattern: &str) -> Vec<String> {
        self.by_short_name
            .keys()
            .filter(|name| short_name::matches(pattern, name))
            .cloned()
            .collect()
    }

    pub fn descriptors(&self, pattern: &str) -> Vec<Arc<ArchetypeDescriptor>> {
        self.by_short_name
            .iter()
            .filter(|(name, _)| short_name::matches(pattern, name))
            .map(|(_, descriptor)| Arc::clone(descriptor))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_short_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_short_name.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Process-wide archetype descriptor registry.
///
/// Readers load the current snapshot without locking. [`reload`](Self::reload)
/// builds and validates a complete replacement before publishing it, so
/// concurrent readers see either the old table or the new one, never a mix.
#[derive(Debug)]
pub struct DescriptorRegistry {
    current: ArcSwap<ArchetypeSnapshot>,
}

impl DescriptorRegistry {
    pub fn new(descriptors: Vec<ArchetypeDescriptor>) -> Result<Self> {
        let snapshot = ArchetypeSnapshot::build(descriptors, 1)?;
        tracing::info!(
            "Loaded {} archetype(s) into descriptor registry",
            snapshot.len()
        );
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
        })
    }

    pub fn empty() -> Self {
        Self {
            current: ArcSwap::from_pointee(ArchetypeSnapshot::default()),
        }
    }

    /// Load every archetype source named in the configuration.
    pub fn from_config(config: &ArchetypeConfig) -> Result<Self> {
        Self::new(Self::load_sources(config)?)
    }

    fn load_sources(config: &ArchetypeConfig) -> Result<Vec<ArchetypeDescriptor>> {
        let mut descriptors = Vec::new();
        for path in &config.archetype_paths {
            descriptors.extend(ArchetypeLoader::load_path(path)?);
        }
        Ok(descriptors)
    }

    /// The current snapshot. Holding it pins that generation for the caller.
    pub fn snapshot(&self) -> Arc<ArchetypeSnapshot> {
        self.current.load_full()
    }

    pub fn get(&self, short_name: &str) -> Option<Arc<ArchetypeDescriptor>> {
        self.current.load().get(short_name).cloned()
    }

    pub fn get_by_id(&self, id: &ArchetypeId) -> Option<Arc<ArchetypeDescriptor>> {
        self.current.load().get_by_id(id).cloned()
    }

    /// Like [`get`](Self::get), but a missing archetype is an error.
    pub fn require(&self, short_name: &str) -> Result<Arc<ArchetypeDescriptor>> {
        self.get(short_name)
            .ok_or_else(|| ArchetypeError::archetype_not_found(short_name))
    }

    pub fn short_names(&self, pattern: &str) -> Vec<String> {
        self.current.load().short_names(pattern)
    }

    pub fn descriptors(&self, pattern: &str) -> Vec<Arc<ArchetypeDescriptor>> {
        self.current.load().descriptors(pattern)
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Replace the whole table. On error the current table is left untouched.
    ///
    /// Each successful reload publishes exactly one generation past the
    /// snapshot it replaced, even when reloads race.
    pub fn reload(&self, descriptors: Vec<ArchetypeDescriptor>) -> Result<()> {
        let built = ArchetypeSnapshot::build(descriptors, 0)?;
        let previous = self.current.rcu(|current| ArchetypeSnapshot {
            generation: current.generation + 1,
            ..built.clone()
        });
        tracing::info!(
            "Reloaded descriptor registry: {} archetype(s), generation {}",
            built.len(),
            previous.generation + 1
        );
        Ok(())
    }

    /// Reload from the configured archetype sources.
    pub fn reload_from_config(&self, config: &ArchetypeConfig) -> Result<()> {
        self.reload(Self::load_sources(config)?)
    }
}
