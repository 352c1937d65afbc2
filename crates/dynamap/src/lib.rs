//! Async DynamoDB session for typed table schemas.
//!
//! Records describe their table shape by implementing
//! [`TableSchema`] (from `dynamap_core`); the [`Session`] then provides item
//! operations, queries and scans with transparent pagination, chunked batch
//! writes, and table provisioning on top of `aws-sdk-dynamodb`.
//!
//! ```no_run
//! use dynamap::{
//!     get_attr, AttrError, Item, Key, KeyAttribute, ScalarKind, Session, TableSchema,
//! };
//! use aws_sdk_dynamodb::types::AttributeValue;
//!
//! struct Book {
//!     isbn: String,
//!     title: String,
//!     num_pages: i64,
//! }
//!
//! impl TableSchema for Book {
//!     const NAME: &'static str = "library.Book";
//!
//!     fn hash_key() -> KeyAttribute {
//!         KeyAttribute::new("isbn", ScalarKind::S)
//!     }
//!
//!     fn to_item(&self) -> Item {
//!         let mut item = Item::new();
//!         item.insert("isbn".into(), AttributeValue::S(self.isbn.clone()));
//!         item.insert("title".into(), AttributeValue::S(self.title.clone()));
//!         item.insert("num_pages".into(), AttributeValue::N(self.num_pages.to_string()));
//!         item
//!     }
//!
//!     fn from_item(item: &Item) -> Result<Self, AttrError> {
//!         Ok(Self {
//!             isbn: get_attr(item, "isbn")?,
//!             title: get_attr(item, "title")?,
//!             num_pages: get_attr(item, "num_pages")?,
//!         })
//!     }
//! }
//!
//! # async fn example() -> Result<(), dynamap::SessionError> {
//! let session = Session::from_env().await;
//! session.put_item(&Book {
//!     isbn: "0-345-39180-2".into(),
//!     title: "The Hitchhiker's Guide to the Galaxy".into(),
//!     num_pages: 224,
//! }).await?;
//!
//! let book: Option<Book> = session.get_item(Key::hash("0-345-39180-2")).await?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod error;
mod provision;
mod query;
mod session;

pub use batch::{BatchStats, BatchWriteOptions, MAX_BATCH_SIZE};
pub use error::{Result, SessionError};
pub use provision::ThroughputOverrides;
pub use query::{Page, Query, Scan};
pub use session::Session;

// Re-export the schema layer so consumers need only this crate.
pub use dynamap_core::{
    composite_key, get_attr, get_opt_attr, is_null, strip_nulls, Attr, AttrError, IndexDef,
    IndexKind, IndexProjection, IntoAttr, Item, Key, KeyAttribute, KeyError, ScalarKind,
    TableSchema, Throughput,
};
