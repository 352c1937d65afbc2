//! Key values supplied by callers for item lookups.

use std::fmt::Display;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::attr::IntoAttr;
use crate::error::KeyError;
use crate::item::Item;
use crate::schema::TableSchema;

/// A key value (or hash/range pair) identifying a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Hash(AttributeValue),
    Pair(AttributeValue, AttributeValue),
}

impl Key {
    /// Key for a table with a single hash key.
    pub fn hash(value: impl IntoAttr) -> Self {
        Key::Hash(value.into_attr_value())
    }

    /// Key for a table with a hash/range key pair.
    pub fn pair(hash: impl IntoAttr, range: impl IntoAttr) -> Self {
        Key::Pair(hash.into_attr_value(), range.into_attr_value())
    }

    /// The hash value, and the range value when present.
    pub fn values(&self) -> (&AttributeValue, Option<&AttributeValue>) {
        match self {
            Key::Hash(hash) => (hash, None),
            Key::Pair(hash, range) => (hash, Some(range)),
        }
    }

    /// Format this key as an item for table `T`, checking that the supplied
    /// values match the table's key arity.
    pub fn to_item<T: TableSchema>(&self) -> Result<Item, KeyError> {
        let range_key = T::range_key();
        let mut item = Item::new();
        match self {
            Key::Hash(hash) => {
                if range_key.is_some() {
                    return Err(KeyError::MissingRangeKey { table: T::NAME });
                }
                item.insert(T::hash_key().name.to_string(), hash.clone());
            }
            Key::Pair(hash, range) => {
                let range_key = range_key.ok_or(KeyError::UnexpectedRangeKey { table: T::NAME })?;
                item.insert(T::hash_key().name.to_string(), hash.clone());
                item.insert(range_key.name.to_string(), range.clone());
            }
        }
        Ok(item)
    }
}

/// Join several values into a single multipart key string.
///
/// The storage analogue of a composite attribute: `composite_key(&[&"a", &1], ":")`
/// yields `"a:1"`.
pub fn composite_key(parts: &[&dyn Display], separator: &str) -> String {
    parts
        .iter()
        .map(|part| part.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
