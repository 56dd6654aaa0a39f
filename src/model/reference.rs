use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ArchetypeError;

/// A weak reference to a persistent object: archetype short name plus id.
///
/// References never own their referent. They are resolved on demand through an
/// [`ObjectService`](crate::service::ObjectService), and resolution may fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectReference {
    pub archetype: String,
    pub id: i64,
}

impl ObjectReference {
    pub fn new(archetype: impl Into<String>, id: i64) -> Self {
        Self {
            archetype: archetype.into(),
            id,
        }
    }

    pub fn short_name(&self) -> &str {
        &self.archetype
    }

    /// Returns true if the reference archetype matches any of the short name patterns.
    pub fn is_a(&self, patterns: &[&str]) -> bool {
        crate::descriptor::is_a(&self.archetype, patterns)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.archetype, self.id)
    }
}

impl FromStr for ObjectReference {
    type Err = ArchetypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ArchetypeError::InvalidArchetypeId { id: s.to_string() };
        let (archetype, id) = s.rsplit_once(':').ok_or_else(invalid)?;
        if archetype.is_empty() {
            return Err(invalid());
        }
        let id = id.parse::<i64>().map_err(|_| invalid())?;
        Ok(Self::new(archetype, id))
    }
}
