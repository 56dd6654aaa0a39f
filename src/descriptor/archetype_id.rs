use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ArchetypeError, Result};

/// Archetype identifier of the form `<entity>.<concept>[.<version>]`,
/// e.g. `party.customerperson.1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchetypeId {
    qualified_name: String,
    short_name_len: usize,
}

impl ArchetypeId {
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = || ArchetypeError::InvalidArchetypeId { id: id.to_string() };
        let mut parts = id.splitn(3, '.');
        let entity = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let concept = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        if let Some(version) = parts.next() {
            if version.is_empty() || !version.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(invalid());
            }
        }
        if id.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self {
            qualified_name: id.to_string(),
            short_name_len: entity.len() + 1 + concept.len(),
        })
    }

    /// The archetype short name, `<entity>.<concept>`.
    pub fn short_name(&self) -> &str {
        &self.qualified_name[..self.short_name_len]
    }

    pub fn entity_name(&self) -> &str {
        self.short_name()
            .split_once('.')
            .map(|(entity, _)| entity)
            .unwrap_or_default()
    }

    pub fn concept(&self) -> &str {
        self.short_name()
            .split_once('.')
            .map(|(_, concept)| concept)
            .unwrap_or_default()
    }

    pub fn version(&self) -> Option<&str> {
        self.qualified_name
            .get(self.short_name_len + 1..)
            .filter(|v| !v.is_empty())
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name)
    }
}

impl FromStr for ArchetypeId {
    type Err = ArchetypeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ArchetypeId {
    type Error = ArchetypeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ArchetypeId> for String {
    fn from(value: ArchetypeId) -> Self {
        value.qualified_name
    }
}
