//! Core types for mapping typed records onto DynamoDB tables.
//!
//! This crate is deliberately free of any client or networking concerns: it
//! holds the attribute codec ([`Attr`]), item helpers, the [`TableSchema`]
//! trait describing a table's shape, key handling, and secondary index
//! definitions. The `dynamap` crate layers the async session on top.

mod attr;
mod error;
mod index;
mod item;
mod key;
mod schema;

pub use attr::{Attr, IntoAttr};
pub use error::{AttrError, KeyError};
pub use index::{IndexDef, IndexKind, IndexProjection};
pub use item::{get_attr, get_opt_attr, is_null, strip_nulls, Item};
pub use key::{composite_key, Key};
pub use schema::{KeyAttribute, ScalarKind, TableSchema, Throughput};
