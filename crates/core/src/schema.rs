//! The table schema abstraction.
//!
//! A type stored in DynamoDB implements [`TableSchema`] by hand: naming the
//! table, describing its key attributes and indexes, and converting itself to
//! and from an [`Item`]. Everything the session layer needs (table names with
//! prefixes, key extraction, null stripping) derives from those pieces.

use aws_sdk_dynamodb::types::ScalarAttributeType;

use crate::error::AttrError;
use crate::index::IndexDef;
use crate::item::{strip_nulls, Item};

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    S,
    N,
    B,
}

impl ScalarKind {
    /// The SDK attribute type descriptor.
    pub fn attribute_type(self) -> ScalarAttributeType {
        match self {
            ScalarKind::S => ScalarAttributeType::S,
            ScalarKind::N => ScalarAttributeType::N,
            ScalarKind::B => ScalarAttributeType::B,
        }
    }
}

/// A key attribute: name plus scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: &'static str,
    pub kind: ScalarKind,
}

impl KeyAttribute {
    pub const fn new(name: &'static str, kind: ScalarKind) -> Self {
        Self { name, kind }
    }
}

/// Provisioned throughput for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read: i64,
    pub write: i64,
}

impl Default for Throughput {
    fn default() -> Self {
        Self { read: 1, write: 1 }
    }
}

/// Description of a DynamoDB table and how a record maps onto its items.
pub trait TableSchema: Sized {
    /// Base table name, prior to any session prefix.
    const NAME: &'static str;

    /// Provisioned throughput used when creating the table.
    fn throughput() -> Throughput {
        Throughput::default()
    }

    /// The table's hash key attribute.
    fn hash_key() -> KeyAttribute;

    /// The table's range key attribute, when it has one.
    fn range_key() -> Option<KeyAttribute> {
        None
    }

    /// Secondary indexes defined on the table.
    fn indexes() -> Vec<IndexDef> {
        Vec::new()
    }

    /// Serialise this record into a full item, including NULL attributes.
    fn to_item(&self) -> Item;

    /// Parse a record from an item.
    fn from_item(item: &Item) -> Result<Self, AttrError>;

    /// Table name with an optional prefix applied as `<prefix>-<name>`.
    fn table_name(prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}-{}", Self::NAME),
            _ => Self::NAME.to_string(),
        }
    }

    /// Key attributes of the table (hash, then range when present).
    fn key_attributes() -> Vec<KeyAttribute> {
        let mut keys = vec![Self::hash_key()];
        if let Some(range) = Self::range_key() {
            keys.push(range);
        }
        keys
    }

    /// Names of the key attributes.
    fn key_names() -> Vec<&'static str> {
        Self::key_attributes().iter().map(|k| k.name).collect()
    }

    /// Extract this record's key attributes as an item.
    fn key(&self) -> Item {
        let mut item = self.to_item();
        let names = Self::key_names();
        item.retain(|name, _| names.contains(&name.as_str()));
        item
    }

    /// The item as written to storage: NULL attributes removed, key
    /// attributes always retained.
    fn storage_item(&self) -> Item {
        strip_nulls(self.to_item(), &Self::key_names())
    }
}
