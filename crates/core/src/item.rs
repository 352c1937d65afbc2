//! Helpers for working with DynamoDB items (attribute maps).

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::attr::Attr;
use crate::error::AttrError;

/// A DynamoDB item: attribute name to typed value.
pub type Item = HashMap<String, AttributeValue>;

/// Whether an attribute value is the NULL marker.
pub fn is_null(value: &AttributeValue) -> bool {
    matches!(value, AttributeValue::Null(_))
}

/// Get a required attribute, parsed to `T`.
///
/// Errors carry the attribute name, whether the attribute is missing or holds
/// an unexpected type.
pub fn get_attr<T: Attr>(item: &Item, name: &str) -> Result<T, AttrError> {
    let value = item
        .get(name)
        .ok_or_else(|| AttrError::MissingAttribute(name.to_string()))?;
    T::from_attr(value.clone()).map_err(|e| e.named(name))
}

/// Get an optional attribute, treating a missing attribute and the NULL
/// marker both as `None`.
pub fn get_opt_attr<T: Attr>(item: &Item, name: &str) -> Result<Option<T>, AttrError> {
    match item.get(name) {
        None => Ok(None),
        Some(value) if is_null(value) => Ok(None),
        Some(value) => T::from_attr(value.clone()).map(Some).map_err(|e| e.named(name)),
    }
}

/// Drop NULL attributes from an item, except those named in `keep`.
///
/// DynamoDB treats NULL as a special case; key attributes must always be
/// present so they are retained regardless of value.
pub fn strip_nulls(item: Item, keep: &[&str]) -> Item {
    item.into_iter()
        .filter(|(name, value)| !is_null(value) || keep.contains(&name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> Item {
        let mut item = Item::new();
        item.insert(
            "title".to_string(),
            AttributeValue::S("The Hitchhiker's Guide to the Galaxy".to_string()),
        );
        item.insert(
            "num_pages".to_string(),
            AttributeValue::N("224".to_string()),
        );
        item.insert("genre".to_string(), AttributeValue::Null(true));
        item
    }

    #[test]
    fn test_get_attr() {
        let item = sample_item();
        let title: String = get_attr(&item, "title").unwrap();
        assert_eq!(title, "The Hitchhiker's Guide to the Galaxy");
        let pages: i64 = get_attr(&item, "num_pages").unwrap();
        assert_eq!(pages, 224);
    }

    #[test]
    fn test_get_attr_missing() {
        let item = sample_item();
        let result: Result<String, _> = get_attr(&item, "isbn");
        assert_eq!(result, Err(AttrError::MissingAttribute("isbn".to_string())));
    }

    #[test]
    fn test_get_attr_wrong_type_names_attribute() {
        let item = sample_item();
        let result: Result<i64, _> = get_attr(&item, "title");
        assert_eq!(
            result.unwrap_err().to_string(),
            "attribute title: expected N attribute"
        );
    }

    #[test]
    fn test_get_opt_attr_treats_null_and_missing_as_none() {
        let item = sample_item();
        assert_eq!(get_opt_attr::<String>(&item, "genre").unwrap(), None);
        assert_eq!(get_opt_attr::<String>(&item, "publisher").unwrap(), None);
        assert_eq!(
            get_opt_attr::<i64>(&item, "num_pages").unwrap(),
            Some(224)
        );
    }

    #[test]
    fn test_strip_nulls() {
        let item = strip_nulls(sample_item(), &[]);
        assert!(!item.contains_key("genre"));
        assert!(item.contains_key("title"));
    }

    #[test]
    fn test_strip_nulls_keeps_key_attributes() {
        let mut raw = sample_item();
        raw.insert("isbn".to_string(), AttributeValue::Null(true));

        let item = strip_nulls(raw, &["isbn"]);

        assert!(item.contains_key("isbn"));
        assert!(!item.contains_key("genre"));
    }
}
