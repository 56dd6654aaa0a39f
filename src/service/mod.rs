//! Persistence and lookup boundaries, plus the archetype service facade that
//! ties them to the descriptor registry.

pub mod archetype_service;
pub mod memory;

use crate::error::{ArchetypeError, Result};
use crate::model::{IMObject, ObjectReference};

pub use archetype_service::ArchetypeService;
pub use memory::InMemoryObjectService;

/// Storage for persistent objects.
///
/// Implementations must be safe to share between threads. Every call is an
/// independent fetch or write; callers do no caching.
pub trait ObjectService: Send + Sync {
    /// Fetch the object a reference points at, or `None` if it does not exist.
    fn get(&self, reference: &ObjectReference) -> Result<Option<IMObject>>;

    /// Persist `object` and return its new version.
    ///
    /// Fails with [`StaleObject`](crate::error::ArchetypeError::StaleObject) if
    /// the stored version no longer matches `object.version`.
    fn save(&self, object: &IMObject) -> Result<i64>;

    /// Persist every object or none of them, returning the new versions in
    /// order.
    ///
    /// The default checks every stored version before writing; stores that
    /// can undo a write should override it to be atomic against concurrent
    /// savers too.
    fn save_all(&self, objects: &[&IMObject]) -> Result<Vec<i64>> {
        for object in objects {
            let found = self.get(&object.reference())?.map_or(0, |o| o.version);
            if found != object.version {
                return Err(ArchetypeError::StaleObject {
                    reference: object.reference().to_string(),
                    expected: object.version,
                    found,
                });
            }
        }
        objects.iter().map(|object| self.save(object)).collect()
    }

    /// Remove the referenced object. Removing a missing object is an error.
    fn remove(&self, reference: &ObjectReference) -> Result<()>;

    /// All objects whose short name matches `pattern`.
    fn query(&self, pattern: &str) -> Result<Vec<IMObject>>;
}

/// Source of remote lookups: shared `lookup.*` objects keyed by code.
pub trait LookupService: Send + Sync {
    fn get_lookup(&self, short_name: &str, code: &str) -> Result<Option<IMObject>>;

    fn get_lookups(&self, short_name: &str) -> Result<Vec<IMObject>>;
}
