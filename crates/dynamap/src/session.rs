//! DynamoDB session: a thin typed layer over the SDK client.

use aws_sdk_dynamodb::types::{AttributeAction, AttributeValueUpdate, ReturnValue};
use aws_sdk_dynamodb::Client;

use dynamap_core::{Item, Key, TableSchema};

use crate::error::{
    map_delete_item_error, map_get_item_error, map_put_item_error, map_update_item_error, Result,
};
use crate::query::{Query, Scan};

/// A DynamoDB session holding the client and an optional table-name prefix.
///
/// The prefix is applied to every table name as `<prefix>-<name>`, letting one
/// schema serve several environments.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), dynamap::SessionError> {
/// use dynamap::{Key, Session};
/// # use dynamap::{Item, TableSchema, KeyAttribute, ScalarKind, AttrError};
/// # struct Book;
/// # impl TableSchema for Book {
/// #     const NAME: &'static str = "library.Book";
/// #     fn hash_key() -> KeyAttribute { KeyAttribute::new("isbn", ScalarKind::S) }
/// #     fn to_item(&self) -> Item { Item::new() }
/// #     fn from_item(_: &Item) -> Result<Self, AttrError> { Ok(Book) }
/// # }
///
/// let session = Session::from_env().await;
/// let book: Option<Book> = session.get_item(Key::hash("0-345-39180-2")).await?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    client: Client,
    prefix: Option<String>,
}

impl Session {
    /// Create a session around an existing client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            prefix: None,
        }
    }

    /// Create a session with a table-name prefix.
    pub fn with_prefix(client: Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: Some(prefix.into()),
        }
    }

    /// Create a session from environment configuration.
    ///
    /// Uses the AWS SDK default credential chain and reads the table-name
    /// prefix from the `DYNAMAP_TABLE_PREFIX` environment variable.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        let prefix = std::env::var("DYNAMAP_TABLE_PREFIX").ok();

        Self { client, prefix }
    }

    /// The underlying SDK client, for operations this layer does not cover.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The table-name prefix, when set.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Full table name for schema `T` with the session prefix applied.
    pub fn table_name<T: TableSchema>(&self) -> String {
        T::table_name(self.prefix())
    }

    /// Write a complete record, with NULL attributes stripped.
    pub async fn put_item<T: TableSchema>(&self, item: &T) -> Result<()> {
        let table_name = self.table_name::<T>();

        self.client
            .put_item()
            .table_name(&table_name)
            .set_item(Some(item.storage_item()))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, &table_name))?;

        Ok(())
    }

    /// Fetch a record by key value (or hash/range pair).
    ///
    /// Returns `None` when no item exists under the key.
    pub async fn get_item<T: TableSchema>(&self, key: Key) -> Result<Option<T>> {
        let table_name = self.table_name::<T>();

        let result = self
            .client
            .get_item()
            .table_name(&table_name)
            .set_key(Some(key.to_item::<T>()?))
            .send()
            .await
            .map_err(|e| map_get_item_error(e, &table_name))?;

        match result.item {
            Some(item) => Ok(Some(T::from_item(&item)?)),
            None => Ok(None),
        }
    }

    /// Delete a record by key value (or hash/range pair).
    pub async fn delete_item<T: TableSchema>(&self, key: Key) -> Result<()> {
        let table_name = self.table_name::<T>();

        self.client
            .delete_item()
            .table_name(&table_name)
            .set_key(Some(key.to_item::<T>()?))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, &table_name))?;

        Ok(())
    }

    /// Update the named fields of a record as `PUT` attribute updates.
    ///
    /// An empty field list updates every non-key attribute. Key attributes
    /// are never updated, and NULL values are skipped.
    pub async fn update_item<T: TableSchema>(&self, item: &T, fields: &[&str]) -> Result<()> {
        let table_name = self.table_name::<T>();
        let updates = attribute_updates::<T>(item, fields);

        self.client
            .update_item()
            .table_name(&table_name)
            .set_key(Some(item.key()))
            .set_attribute_updates(Some(updates))
            .return_values(ReturnValue::None)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, &table_name))?;

        Ok(())
    }

    /// Apply an update expression to an item and return the new image.
    ///
    /// Useful for stamping a last-accessed date or bumping a counter while
    /// fetching. Returns `None` when a condition expression rejected the
    /// update (the DynamoDB signal for "item not found" here).
    pub async fn get_update_item<T: TableSchema>(
        &self,
        key: Key,
        update_expression: &str,
        values: Item,
    ) -> Result<Option<T>> {
        use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

        let table_name = self.table_name::<T>();

        let mut request = self
            .client
            .update_item()
            .table_name(&table_name)
            .set_key(Some(key.to_item::<T>()?))
            .update_expression(update_expression)
            .return_values(ReturnValue::AllNew);
        if !values.is_empty() {
            request = request.set_expression_attribute_values(Some(values));
        }

        let result = match request.send().await {
            Ok(result) => result,
            // A ConditionalCheckFailedException is raised when no item matches
            // and a condition expression was supplied.
            Err(err) if matches!(
                err.as_service_error(),
                Some(UpdateItemError::ConditionalCheckFailedException(_))
            ) =>
            {
                return Ok(None);
            }
            Err(err) => return Err(map_update_item_error(err, &table_name)),
        };

        match result.attributes {
            Some(item) => Ok(Some(T::from_item(&item)?)),
            None => Ok(None),
        }
    }

    /// Start a query against the table's key (or an index via
    /// [`Query::index`]).
    pub fn query<T: TableSchema>(&self, key: Key) -> Query<'_, T> {
        Query::new(self, key)
    }

    /// Start a scan over the table (or an index via [`Scan::index`]).
    pub fn scan<T: TableSchema>(&self) -> Scan<'_, T> {
        Scan::new(self)
    }
}

/// Build the `AttributeUpdates` map for [`Session::update_item`].
pub(crate) fn attribute_updates<T: TableSchema>(
    item: &T,
    fields: &[&str],
) -> std::collections::HashMap<String, AttributeValueUpdate> {
    let key_names = T::key_names();
    item.to_item()
        .into_iter()
        .filter(|(name, value)| {
            !key_names.contains(&name.as_str())
                && (fields.is_empty() || fields.contains(&name.as_str()))
                && !dynamap_core::is_null(value)
        })
        .map(|(name, value)| {
            let update = AttributeValueUpdate::builder()
                .value(value)
                .action(AttributeAction::Put)
                .build();
            (name, update)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{canned_response, replay_session, sample_book, Book};
    use aws_sdk_dynamodb::types::AttributeValue;

    #[test]
    fn test_attribute_updates_single_field() {
        let updates = attribute_updates::<Book>(&sample_book(), &["title"]);

        assert_eq!(updates.len(), 1);
        let update = updates.get("title").unwrap();
        assert_eq!(update.action(), Some(&AttributeAction::Put));
        assert_eq!(
            update.value(),
            Some(&AttributeValue::S(
                "The Hitchhiker's Guide to the Galaxy".to_string()
            ))
        );
    }

    #[test]
    fn test_attribute_updates_multiple_fields() {
        let updates = attribute_updates::<Book>(&sample_book(), &["title", "num_pages"]);

        assert_eq!(updates.len(), 2);
        assert_eq!(
            updates.get("num_pages").unwrap().value(),
            Some(&AttributeValue::N("224".to_string()))
        );
    }

    #[test]
    fn test_attribute_updates_all_fields_excludes_key_and_nulls() {
        // genre is None on the sample book and isbn is the hash key; neither
        // may appear in the update map.
        let updates = attribute_updates::<Book>(&sample_book(), &[]);

        assert!(!updates.contains_key("isbn"));
        assert!(!updates.contains_key("genre"));
        assert!(updates.contains_key("title"));
        assert!(updates.contains_key("num_pages"));
        assert!(updates.contains_key("rrp"));
        assert!(updates.contains_key("fiction"));
    }

    #[test]
    fn test_attribute_updates_never_touches_key_even_when_named() {
        let updates = attribute_updates::<Book>(&sample_book(), &["isbn", "title"]);

        assert!(!updates.contains_key("isbn"));
        assert!(updates.contains_key("title"));
    }

    #[tokio::test]
    async fn test_get_update_item_returns_new_image() {
        let body = r#"{"Attributes":{"isbn":{"S":"0-345-39180-2"},"title":{"S":"So Long, and Thanks for All the Fish"},"num_pages":{"N":"192"},"rrp":{"N":"7.19"},"fiction":{"BOOL":true}}}"#;
        let session = replay_session(vec![canned_response(200, body)]);

        let book: Option<Book> = session
            .get_update_item(
                Key::hash("0-345-39180-2"),
                "SET title = :title",
                Item::from([(
                    ":title".to_string(),
                    AttributeValue::S("So Long, and Thanks for All the Fish".to_string()),
                )]),
            )
            .await
            .unwrap();

        let book = book.unwrap();
        assert_eq!(book.title, "So Long, and Thanks for All the Fish");
        assert_eq!(book.num_pages, 192);
    }

    #[tokio::test]
    async fn test_get_update_item_condition_failure_means_absent() {
        let body = r#"{"__type":"com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException","message":"The conditional request failed"}"#;
        let session = replay_session(vec![canned_response(400, body)]);

        let book: Option<Book> = session
            .get_update_item(
                Key::hash("0-345-39180-2"),
                "SET last_accessed = :now",
                Item::new(),
            )
            .await
            .unwrap();

        assert!(book.is_none());
    }
}
