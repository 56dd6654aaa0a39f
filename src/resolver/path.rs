use std::fmt;
use std::str::FromStr;

use crate::error::PropertyResolverError;

/// One step of a property path: a node or pseudo-property name, optionally
/// indexing into a collection (`items[2]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    fn parse(text: &str, path: &str) -> Result<Self, PropertyResolverError> {
        let (name, index) = match text.find('[') {
            Some(open) => {
                let Some(digits) = text[open + 1..].strip_suffix(']') else {
                    return Err(PropertyResolverError::invalid_path(
                        path,
                        format!("unterminated index in '{text}'"),
                    ));
                };
                let index = digits.parse::<usize>().map_err(|_| {
                    PropertyResolverError::invalid_path(path, format!("invalid index in '{text}'"))
                })?;
                (&text[..open], Some(index))
            }
            None => (text, None),
        };

        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid {
            return Err(PropertyResolverError::invalid_path(
                path,
                format!("invalid segment '{text}'"),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            index,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A parsed, dot-separated property path such as `act.customer.entity.firstName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<Segment>,
}

impl PropertyPath {
    pub fn parse(path: &str) -> Result<Self, PropertyResolverError> {
        if path.trim().is_empty() {
            return Err(PropertyResolverError::invalid_path(path, "empty path"));
        }
        let segments = path
            .split('.')
            .map(|text| Segment::parse(text, path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The first segment.
    pub fn root(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path up to and including segment `end`, for error reporting.
    pub fn prefix(&self, end: usize) -> String {
        self.segments[..=end.min(self.segments.len() - 1)]
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl FromStr for PropertyPath {
    type Err = PropertyResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix(self.segments.len() - 1))
    }
}
