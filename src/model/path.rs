use std::fmt;

use super::class::ObjectClass;

/// Location of a node's value inside an [`IMObject`](super::IMObject).
///
/// Parsed from node descriptor paths such as `/name`, `/details/firstName` or
/// `/participations`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValuePath {
    Id,
    Name,
    Description,
    Active,
    Property(String),
    Detail(String),
}

impl ValuePath {
    /// Parse a node path. Returns `None` for malformed paths; class membership of
    /// `Property` paths is checked separately by [`ValuePath::is_valid_for`].
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.strip_prefix('/')?;
        let mut parts = trimmed.split('/');
        let first = parts.next().filter(|p| !p.is_empty())?;
        let second = parts.next();
        if parts.next().is_some() {
            return None;
        }
        match (first, second) {
            ("details", Some(key)) if !key.is_empty() => Some(ValuePath::Detail(key.to_string())),
            (_, Some(_)) => None,
            ("id", None) | ("uid", None) => Some(ValuePath::Id),
            ("name", None) => Some(ValuePath::Name),
            ("description", None) => Some(ValuePath::Description),
            ("active", None) => Some(ValuePath::Active),
            ("details", None) => None,
            (property, None) => Some(ValuePath::Property(property.to_string())),
        }
    }

    pub fn is_valid_for(&self, class: ObjectClass) -> bool {
        match self {
            ValuePath::Property(name) => class.property(name).is_some(),
            _ => true,
        }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePath::Id => write!(f, "/id"),
            ValuePath::Name => write!(f, "/name"),
            ValuePath::Description => write!(f, "/description"),
            ValuePath::Active => write!(f, "/active"),
            ValuePath::Property(name) => write!(f, "/{name}"),
            ValuePath::Detail(key) => write!(f, "/details/{key}"),
        }
    }
}
