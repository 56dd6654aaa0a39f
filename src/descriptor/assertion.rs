use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static PATTERNS: OnceLock<papaya::HashMap<String, Regex>> = OnceLock::new();

/// The compiled form of a `regularExpression` assertion, anchored so that it
/// must match the whole value. Compiled once per distinct expression.
pub fn full_match_pattern(expression: &str) -> Result<Regex, regex::Error> {
    let patterns = PATTERNS.get_or_init(papaya::HashMap::new).pin();
    if let Some(pattern) = patterns.get(expression) {
        return Ok(pattern.clone());
    }
    let pattern = Regex::new(&format!("^(?:{expression})$"))?;
    patterns.insert(expression.to_string(), pattern.clone());
    Ok(pattern)
}

/// A validation rule or value source attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Assertion {
    /// String values must match `expression` in full.
    #[serde(rename_all = "camelCase")]
    RegularExpression {
        expression: String,
        error_message: Option<String>,
    },
    /// Numeric values must lie within the closed range.
    #[serde(rename_all = "camelCase")]
    NumericRange {
        min_value: Option<Decimal>,
        max_value: Option<Decimal>,
        error_message: Option<String>,
    },
    /// Codes stored inline on the archetype, `code -> name`.
    #[serde(rename_all = "camelCase")]
    LocalLookup {
        entries: IndexMap<String, String>,
        error_message: Option<String>,
    },
    /// Codes drawn from a shared lookup archetype.
    #[serde(rename_all = "camelCase")]
    RemoteLookup {
        source: String,
        error_message: Option<String>,
    },
    /// Allowed short names (wildcards permitted) for references and collection elements.
    #[serde(rename_all = "camelCase")]
    ArchetypeRange {
        short_names: Vec<String>,
        error_message: Option<String>,
    },
    /// Any other assertion, kept verbatim and not evaluated.
    #[serde(rename_all = "camelCase")]
    Other {
        name: String,
        properties: IndexMap<String, String>,
        error_message: Option<String>,
    },
}

/// Where a lookup node draws its codes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupSource<'a> {
    Local(&'a IndexMap<String, String>),
    Remote(&'a str),
}

impl Assertion {
    /// The assertion name as it appears in archetype XML.
    pub fn name(&self) -> &str {
        match self {
            Assertion::RegularExpression { .. } => "regularExpression",
            Assertion::NumericRange { .. } => "numericRange",
            Assertion::LocalLookup { .. } => "lookup.local",
            Assertion::RemoteLookup { .. } => "lookup",
            Assertion::ArchetypeRange { .. } => "archetypeRange",
            Assertion::Other { name, .. } => name,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Assertion::RegularExpression { error_message, .. }
            | Assertion::NumericRange { error_message, .. }
            | Assertion::LocalLookup { error_message, .. }
            | Assertion::RemoteLookup { error_message, .. }
            | Assertion::ArchetypeRange { error_message, .. }
            | Assertion::Other { error_message, .. } => error_message.as_deref(),
        }
    }

    pub fn lookup_source(&self) -> Option<LookupSource<'_>> {
        match self {
            Assertion::LocalLookup { entries, .. } => Some(LookupSource::Local(entries)),
            Assertion::RemoteLookup { source, .. } => Some(LookupSource::Remote(source)),
            _ => None,
        }
    }

    pub fn regular_expression(expression: impl Into<String>) -> Self {
        Assertion::RegularExpression {
            expression: expression.into(),
            error_message: None,
        }
    }

    pub fn numeric_range(min_value: Option<Decimal>, max_value: Option<Decimal>) -> Self {
        Assertion::NumericRange {
            min_value,
            max_value,
            error_message: None,
        }
    }

    pub fn local_lookup<I, C, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        Assertion::LocalLookup {
            entries: entries
                .into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
            error_message: None,
        }
    }

    pub fn remote_lookup(source: impl Into<String>) -> Self {
        Assertion::RemoteLookup {
            source: source.into(),
            error_message: None,
        }
    }

    pub fn archetype_range<I, S>(short_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Assertion::ArchetypeRange {
            short_names: short_names.into_iter().map(Into::into).collect(),
            error_message: None,
        }
    }
}
