//! Conversions between Rust values and DynamoDB attribute values.
//!
//! Every storable type implements [`Attr`]. Numbers serialise as `N`
//! attributes holding decimal strings, temporal types as ISO-8601 `S`
//! strings, and `Option::None` as `{"NULL": true}`, matching what DynamoDB
//! expects on the wire.

use std::collections::{BTreeSet, HashMap, HashSet};

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::AttrError;

/// Conversion to and from a DynamoDB [`AttributeValue`].
pub trait Attr: Sized {
    /// Serialise into a typed attribute value.
    fn into_attr(self) -> AttributeValue;

    /// Parse from a typed attribute value.
    fn from_attr(value: AttributeValue) -> Result<Self, AttrError>;
}

/// One-way conversion into an attribute value.
///
/// Blanket-implemented for every [`Attr`] type, plus borrowed forms (`&str`)
/// that have no owned parse direction. Used for key arguments.
pub trait IntoAttr {
    fn into_attr_value(self) -> AttributeValue;
}

impl<T: Attr> IntoAttr for T {
    fn into_attr_value(self) -> AttributeValue {
        self.into_attr()
    }
}

impl IntoAttr for &str {
    fn into_attr_value(self) -> AttributeValue {
        AttributeValue::S(self.to_string())
    }
}

impl Attr for String {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::S(self)
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        match value {
            AttributeValue::S(s) => Ok(s),
            _ => Err(AttrError::Expected("S")),
        }
    }
}

impl Attr for bool {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::Bool(self)
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        match value {
            AttributeValue::Bool(b) => Ok(b),
            _ => Err(AttrError::Expected("BOOL")),
        }
    }
}

macro_rules! numeric_attr {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Attr for $ty {
                fn into_attr(self) -> AttributeValue {
                    AttributeValue::N(self.to_string())
                }

                fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
                    match value {
                        AttributeValue::N(n) => {
                            n.parse().map_err(|_| AttrError::InvalidNumber(n))
                        }
                        _ => Err(AttrError::Expected("N")),
                    }
                }
            }
        )*
    };
}

numeric_attr!(i16, i32, i64, u16, u32, u64, f32, f64);

impl Attr for Uuid {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::S(self.to_string())
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        let s = String::from_attr(value)?;
        Uuid::parse_str(&s).map_err(|e| AttrError::InvalidValue(format!("bad UUID {s}: {e}")))
    }
}

impl Attr for DateTime<Utc> {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::S(self.to_rfc3339())
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        let s = String::from_attr(value)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AttrError::InvalidValue(format!("bad datetime {s}: {e}")))
    }
}

impl Attr for NaiveDate {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::S(self.format("%Y-%m-%d").to_string())
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        let s = String::from_attr(value)?;
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| AttrError::InvalidValue(format!("bad date {s}: {e}")))
    }
}

impl Attr for NaiveDateTime {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::S(self.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        let s = String::from_attr(value)?;
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| AttrError::InvalidValue(format!("bad datetime {s}: {e}")))
    }
}

impl Attr for NaiveTime {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::S(self.format("%H:%M:%S%.f").to_string())
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        let s = String::from_attr(value)?;
        NaiveTime::parse_from_str(&s, "%H:%M:%S%.f")
            .map_err(|e| AttrError::InvalidValue(format!("bad time {s}: {e}")))
    }
}

impl<T: Attr> Attr for Option<T> {
    fn into_attr(self) -> AttributeValue {
        match self {
            Some(value) => value.into_attr(),
            None => AttributeValue::Null(true),
        }
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        match value {
            AttributeValue::Null(_) => Ok(None),
            other => T::from_attr(other).map(Some),
        }
    }
}

impl<T: Attr> Attr for Vec<T> {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::L(self.into_iter().map(Attr::into_attr).collect())
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        match value {
            AttributeValue::L(values) => values.into_iter().map(T::from_attr).collect(),
            _ => Err(AttrError::Expected("L")),
        }
    }
}

impl<T: Attr> Attr for HashMap<String, T> {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::M(self.into_iter().map(|(k, v)| (k, v.into_attr())).collect())
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        match value {
            AttributeValue::M(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_attr(v).map(|v| (k, v)))
                .collect(),
            _ => Err(AttrError::Expected("M")),
        }
    }
}

macro_rules! string_set_attr {
    ($($set:ident),* $(,)?) => {
        $(
            impl Attr for $set<String> {
                fn into_attr(self) -> AttributeValue {
                    AttributeValue::Ss(self.into_iter().collect())
                }

                fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
                    match value {
                        AttributeValue::Ss(values) => Ok(values.into_iter().collect()),
                        _ => Err(AttrError::Expected("SS")),
                    }
                }
            }
        )*
    };
}

string_set_attr!(HashSet, BTreeSet);

macro_rules! number_set_attr {
    ($($set:ident),* $(,)?) => {
        $(
            impl Attr for $set<i64> {
                fn into_attr(self) -> AttributeValue {
                    AttributeValue::Ns(self.into_iter().map(|n| n.to_string()).collect())
                }

                fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
                    match value {
                        AttributeValue::Ns(values) => values
                            .into_iter()
                            .map(|n| n.parse().map_err(|_| AttrError::InvalidNumber(n)))
                            .collect(),
                        _ => Err(AttrError::Expected("NS")),
                    }
                }
            }
        )*
    };
}

number_set_attr!(HashSet, BTreeSet);

impl Attr for Blob {
    fn into_attr(self) -> AttributeValue {
        AttributeValue::B(self)
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        match value {
            AttributeValue::B(blob) => Ok(blob),
            _ => Err(AttrError::Expected("B")),
        }
    }
}

/// Free-form JSON documents map onto `M`/`L`/`S`/`N`/`BOOL`/`NULL` attributes.
impl Attr for serde_json::Value {
    fn into_attr(self) -> AttributeValue {
        match self {
            serde_json::Value::Null => AttributeValue::Null(true),
            serde_json::Value::Bool(b) => AttributeValue::Bool(b),
            serde_json::Value::Number(n) => AttributeValue::N(n.to_string()),
            serde_json::Value::String(s) => AttributeValue::S(s),
            serde_json::Value::Array(values) => {
                AttributeValue::L(values.into_iter().map(Attr::into_attr).collect())
            }
            serde_json::Value::Object(entries) => AttributeValue::M(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_attr()))
                    .collect(),
            ),
        }
    }

    fn from_attr(value: AttributeValue) -> Result<Self, AttrError> {
        match value {
            AttributeValue::Null(_) => Ok(serde_json::Value::Null),
            AttributeValue::Bool(b) => Ok(serde_json::Value::Bool(b)),
            AttributeValue::S(s) => Ok(serde_json::Value::String(s)),
            AttributeValue::N(n) => n
                .parse::<serde_json::Number>()
                .map(serde_json::Value::Number)
                .map_err(|_| AttrError::InvalidNumber(n)),
            AttributeValue::L(values) => values
                .into_iter()
                .map(Self::from_attr)
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            AttributeValue::M(entries) => entries
                .into_iter()
                .map(|(k, v)| Self::from_attr(v).map(|v| (k, v)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(serde_json::Value::Object),
            AttributeValue::Ss(values) => Ok(serde_json::Value::Array(
                values.into_iter().map(serde_json::Value::String).collect(),
            )),
            AttributeValue::Ns(values) => values
                .into_iter()
                .map(|n| {
                    n.parse::<serde_json::Number>()
                        .map(serde_json::Value::Number)
                        .map_err(|_| AttrError::InvalidNumber(n))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            _ => Err(AttrError::Expected("JSON-compatible")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_string_round_trip() {
        let attr = "foo".to_string().into_attr();
        assert_eq!(attr, AttributeValue::S("foo".to_string()));
        assert_eq!(String::from_attr(attr).unwrap(), "foo");
    }

    #[test]
    fn test_integer_serialises_as_decimal_string() {
        assert_eq!(42i64.into_attr(), AttributeValue::N("42".to_string()));
        assert_eq!(
            i64::from_attr(AttributeValue::N("42".to_string())).unwrap(),
            42
        );
    }

    #[test]
    fn test_float_serialises_as_decimal_string() {
        assert_eq!(11.27f64.into_attr(), AttributeValue::N("11.27".to_string()));
        assert_eq!(
            f64::from_attr(AttributeValue::N("11.27".to_string())).unwrap(),
            11.27
        );
    }

    #[test]
    fn test_bad_number_is_rejected() {
        assert_eq!(
            i64::from_attr(AttributeValue::N("eek".to_string())),
            Err(AttrError::InvalidNumber("eek".to_string()))
        );
    }

    #[test]
    fn test_bool_round_trip() {
        assert_eq!(true.into_attr(), AttributeValue::Bool(true));
        assert_eq!(bool::from_attr(AttributeValue::Bool(false)).unwrap(), false);
    }

    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            bool::from_attr(AttributeValue::S("t".to_string())),
            Err(AttrError::Expected("BOOL"))
        );
        assert_eq!(
            String::from_attr(AttributeValue::N("1".to_string())),
            Err(AttrError::Expected("S"))
        );
    }

    #[test]
    fn test_none_serialises_as_null() {
        let attr = Option::<String>::None.into_attr();
        assert_eq!(attr, AttributeValue::Null(true));
        assert_eq!(Option::<String>::from_attr(attr).unwrap(), None);
    }

    #[test]
    fn test_some_round_trip() {
        let attr = Some(7i64).into_attr();
        assert_eq!(attr, AttributeValue::N("7".to_string()));
        assert_eq!(Option::<i64>::from_attr(attr).unwrap(), Some(7));
    }

    #[test]
    fn test_datetime_uses_rfc3339() {
        let dt = Utc.with_ymd_and_hms(1942, 11, 27, 11, 12, 13).unwrap();
        let attr = dt.into_attr();
        assert_eq!(
            attr,
            AttributeValue::S("1942-11-27T11:12:13+00:00".to_string())
        );
        assert_eq!(DateTime::<Utc>::from_attr(attr).unwrap(), dt);
    }

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let attr = date.into_attr();
        assert_eq!(attr, AttributeValue::S("2024-01-15".to_string()));
        assert_eq!(NaiveDate::from_attr(attr).unwrap(), date);
    }

    #[test]
    fn test_naive_datetime_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let attr = dt.into_attr();
        assert_eq!(attr, AttributeValue::S("2024-01-15T09:30:00".to_string()));
        assert_eq!(NaiveDateTime::from_attr(attr).unwrap(), dt);
    }

    #[test]
    fn test_uuid_round_trip() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();
        let attr = id.into_attr();
        assert_eq!(
            attr,
            AttributeValue::S("550e8400-e29b-41d4-a716-446655440001".to_string())
        );
        assert_eq!(Uuid::from_attr(attr).unwrap(), id);
    }

    #[test]
    fn test_string_set_round_trip() {
        let set: BTreeSet<String> = ["sci-fi", "fantasy"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let attr = set.clone().into_attr();
        match &attr {
            AttributeValue::Ss(values) => assert_eq!(values.len(), 2),
            other => panic!("expected SS, got {other:?}"),
        }
        assert_eq!(BTreeSet::<String>::from_attr(attr).unwrap(), set);
    }

    #[test]
    fn test_number_set_round_trip() {
        let set: BTreeSet<i64> = [1, 2, 3].into_iter().collect();
        let attr = set.clone().into_attr();
        assert_eq!(
            attr,
            AttributeValue::Ns(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
        assert_eq!(BTreeSet::<i64>::from_attr(attr).unwrap(), set);
    }

    #[test]
    fn test_list_round_trip() {
        let list = vec![1i64, 2, 3];
        let attr = list.clone().into_attr();
        assert_eq!(Vec::<i64>::from_attr(attr).unwrap(), list);
    }

    #[test]
    fn test_map_round_trip() {
        let mut map = HashMap::new();
        map.insert("pages".to_string(), 224i64);
        let attr = map.clone().into_attr();
        assert_eq!(HashMap::<String, i64>::from_attr(attr).unwrap(), map);
    }

    #[test]
    fn test_binary_round_trip() {
        let blob = Blob::new(vec![0xde, 0xad, 0xbe, 0xef]);
        let attr = blob.clone().into_attr();
        assert_eq!(Blob::from_attr(attr).unwrap(), blob);
    }

    #[test]
    fn test_json_document_round_trip() {
        let doc = json!({
            "title": "Mostly Harmless",
            "pages": 240,
            "fiction": true,
            "tags": ["sci-fi", "comedy"],
            "publisher": null,
        });
        let attr = doc.clone().into_attr();
        match &attr {
            AttributeValue::M(entries) => {
                assert_eq!(
                    entries.get("pages"),
                    Some(&AttributeValue::N("240".to_string()))
                );
                assert_eq!(entries.get("publisher"), Some(&AttributeValue::Null(true)));
            }
            other => panic!("expected M, got {other:?}"),
        }
        assert_eq!(serde_json::Value::from_attr(attr).unwrap(), doc);
    }
}
