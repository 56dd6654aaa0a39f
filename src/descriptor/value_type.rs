use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ArchetypeError, Result};
use crate::model::Value;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Semantic type tag of a node, derived from its declared class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    Reference,
    Object,
    Collection,
}

impl ValueType {
    pub fn from_class_name(class_name: &str) -> Self {
        let simple = class_name.rsplit('.').next().unwrap_or(class_name);
        match simple {
            "String" | "string" => ValueType::String,
            "Long" | "long" | "Integer" | "int" | "Short" | "short" => ValueType::Integer,
            "BigDecimal" | "Money" | "Double" | "double" | "Float" | "float" => {
                ValueType::Decimal
            }
            "Boolean" | "boolean" => ValueType::Boolean,
            "Date" | "Timestamp" => ValueType::Date,
            "IMObjectReference" | "Reference" => ValueType::Reference,
            "HashSet" | "Set" | "List" | "ArrayList" | "Collection" => ValueType::Collection,
            _ => ValueType::Object,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Decimal)
    }

    /// Convert `value` to this type. `node` names the target for error reporting.
    ///
    /// Null always coerces to null. Collections cannot be coerced; they are
    /// mutated element-wise through the bean collection accessors.
    pub fn coerce(&self, node: &str, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let fail = |value: &Value| {
            ArchetypeError::type_coercion(node.to_string(), self.to_string(), value.to_string())
        };
        let coerced = match (self, value) {
            (ValueType::String, Value::String(s)) => Value::String(s),
            (ValueType::String, v @ (Value::Integer(_) | Value::Decimal(_) | Value::Boolean(_))) => {
                Value::String(v.to_string())
            }
            (ValueType::String, Value::Date(d)) => Value::String(d.format(DATE_FORMATS[0]).to_string()),

            (ValueType::Integer, Value::Integer(i)) => Value::Integer(i),
            (ValueType::Integer, Value::Decimal(d)) => {
                match d.fract().is_zero().then(|| d.to_i64()).flatten() {
                    Some(i) => Value::Integer(i),
                    None => return Err(fail(&Value::Decimal(d))),
                }
            }
            (ValueType::Integer, v @ Value::String(_)) => {
                let parsed = v.as_str().and_then(|s| s.trim().parse::<i64>().ok());
                Value::Integer(parsed.ok_or_else(|| fail(&v))?)
            }

            (ValueType::Decimal, Value::Decimal(d)) => Value::Decimal(d),
            (ValueType::Decimal, Value::Integer(i)) => Value::Decimal(Decimal::from(i)),
            (ValueType::Decimal, v @ Value::String(_)) => {
                let parsed = v.as_str().and_then(|s| Decimal::from_str(s.trim()).ok());
                Value::Decimal(parsed.ok_or_else(|| fail(&v))?)
            }

            (ValueType::Boolean, Value::Boolean(b)) => Value::Boolean(b),
            (ValueType::Boolean, v @ Value::String(_)) => match v.as_str().map(str::trim) {
                Some("true") => Value::Boolean(true),
                Some("false") => Value::Boolean(false),
                _ => return Err(fail(&v)),
            },
            (ValueType::Boolean, v @ Value::Integer(_)) => match v.as_i64() {
                Some(0) => Value::Boolean(false),
                Some(1) => Value::Boolean(true),
                _ => return Err(fail(&v)),
            },

            (ValueType::Date, Value::Date(d)) => Value::Date(d),
            (ValueType::Date, v @ Value::String(_)) => {
                let parsed = v.as_str().and_then(|s| parse_date(s.trim()));
                Value::Date(parsed.ok_or_else(|| fail(&v))?)
            }

            (ValueType::Reference, Value::Reference(r)) => Value::Reference(r),
            (ValueType::Reference, Value::Object(o)) => Value::Reference(o.reference()),

            (ValueType::Object, Value::Object(o)) => Value::Object(o),
            (ValueType::Object, Value::Reference(r)) => Value::Reference(r),

            (ValueType::Collection, v) => {
                return Err(ArchetypeError::invalid_collection_operation(
                    node.to_string(),
                    format!("cannot assign a {} to a collection", v.type_name()),
                ));
            }
            (_, v) => return Err(fail(&v)),
        };
        Ok(coerced)
    }
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Reference => "reference",
            ValueType::Object => "object",
            ValueType::Collection => "collection",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectReference;

    #[test]
    fn test_from_class_name() {
        assert_eq!(ValueType::from_class_name("java.lang.String"), ValueType::String);
        assert_eq!(ValueType::from_class_name("java.lang.Long"), ValueType::Integer);
        assert_eq!(
            ValueType::from_class_name(
                "org.openvpms.component.business.domain.im.datatypes.quantity.Money"
            ),
            ValueType::Decimal
        );
        assert_eq!(ValueType::from_class_name("java.util.Date"), ValueType::Date);
        assert_eq!(ValueType::from_class_name("java.util.HashSet"), ValueType::Collection);
        assert_eq!(
            ValueType::from_class_name(
                "org.openvpms.component.business.domain.im.common.IMObjectReference"
            ),
            ValueType::Reference
        );
        assert_eq!(
            ValueType::from_class_name("org.openvpms.component.business.domain.im.party.Party"),
            ValueType::Object
        );
    }

    #[test]
    fn test_coerce_strings_and_numbers() {
        assert_eq!(
            ValueType::Integer.coerce("n", Value::from("42")).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            ValueType::String.coerce("n", Value::from(42)).unwrap(),
            Value::from("42")
        );
        assert_eq!(
            ValueType::Decimal.coerce("n", Value::from("1.50")).unwrap(),
            Value::Decimal(Decimal::from_str("1.50").unwrap())
        );
        assert_eq!(
            ValueType::Integer
                .coerce("n", Value::Decimal(Decimal::from(3)))
                .unwrap(),
            Value::Integer(3)
        );
        assert!(ValueType::Integer.coerce("n", Value::from("abc")).is_err());
        assert!(
            ValueType::Integer
                .coerce("n", Value::Decimal(Decimal::from_str("1.5").unwrap()))
                .is_err()
        );
    }

    #[test]
    fn test_coerce_booleans_and_dates() {
        assert_eq!(
            ValueType::Boolean.coerce("n", Value::from("true")).unwrap(),
            Value::Boolean(true)
        );
        assert!(ValueType::Boolean.coerce("n", Value::from(2)).is_err());

        let date = ValueType::Date.coerce("n", Value::from("2024-03-01")).unwrap();
        assert_eq!(date.to_string(), "2024-03-01 00:00:00");
    }

    #[test]
    fn test_coerce_references_and_null() {
        let reference = ObjectReference::new("party.customerperson", 1);
        assert_eq!(
            ValueType::Reference
                .coerce("n", Value::Reference(reference.clone()))
                .unwrap(),
            Value::Reference(reference)
        );
        assert_eq!(ValueType::Date.coerce("n", Value::Null).unwrap(), Value::Null);
        assert!(ValueType::Collection.coerce("n", Value::from("x")).is_err());
    }
}
