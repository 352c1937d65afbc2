//! Query and scan builders with transparent pagination.
//!
//! Both builders execute either a single page ([`Query::page`]) or an async
//! stream of records that follows `LastEvaluatedKey` across pages
//! ([`Query::items`]), in the manner the table or a secondary index defines.

use std::collections::HashMap;
use std::marker::PhantomData;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnConsumedCapacity, Select};
use tokio_stream::{Stream, StreamExt};

use dynamap_core::{IndexDef, Item, Key, KeyError, TableSchema};

use crate::error::{map_query_error, map_scan_error, Result};
use crate::session::Session;

/// A single page of query or scan results.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matching items in this page.
    pub count: i32,
    /// Number of items evaluated before filtering.
    pub scanned: i32,
    /// Key to resume from, present when more pages exist.
    pub last_evaluated_key: Option<Item>,
}

/// Read options shared by queries and scans.
#[derive(Debug, Clone, Default)]
struct ReadOptions {
    index: Option<IndexDef>,
    limit: Option<i32>,
    select: Option<Select>,
    consistent: Option<bool>,
    consumed_capacity: Option<ReturnConsumedCapacity>,
    start_key: Option<Item>,
}

/// Build the key condition expression for a query against the table key or
/// an index key.
pub(crate) fn key_condition<T: TableSchema>(
    key: &Key,
    index: Option<&IndexDef>,
) -> std::result::Result<(String, HashMap<String, String>, Item), KeyError> {
    let (hash_attr, range_attr) = match index {
        Some(index) => (index.hash_key.clone(), index.range_key.clone()),
        None => (T::hash_key(), T::range_key()),
    };
    let (hash_value, range_value) = key.values();

    let mut names = HashMap::from([("#hk".to_string(), hash_attr.name.to_string())]);
    let mut values = Item::from([(":hv".to_string(), hash_value.clone())]);
    let mut expression = "#hk = :hv".to_string();

    if let Some(range_value) = range_value {
        let range_attr = range_attr.ok_or_else(|| match index {
            Some(index) => KeyError::UnexpectedIndexRangeKey {
                table: T::NAME,
                index: index.name,
            },
            None => KeyError::UnexpectedRangeKey { table: T::NAME },
        })?;
        names.insert("#rk".to_string(), range_attr.name.to_string());
        values.insert(":rv".to_string(), range_value.clone());
        expression.push_str(" AND #rk = :rv");
    }

    Ok((expression, names, values))
}

macro_rules! read_options_methods {
    () => {
        /// Run against a secondary index instead of the table key.
        pub fn index(mut self, index: IndexDef) -> Self {
            self.options.index = Some(index);
            self
        }

        /// Maximum number of items DynamoDB evaluates per page. Evaluation
        /// stops at the limit and the page carries a `last_evaluated_key` to
        /// resume from.
        pub fn limit(mut self, limit: i32) -> Self {
            self.options.limit = Some(limit);
            self
        }

        /// Which attributes to return (all, projected, count, or specific).
        pub fn select(mut self, select: Select) -> Self {
            self.options.select = Some(select);
            self
        }

        /// Use strongly consistent reads. Not supported on global secondary
        /// indexes.
        pub fn consistent(mut self, consistent: bool) -> Self {
            self.options.consistent = Some(consistent);
            self
        }

        /// Level of consumed-capacity detail returned in each response.
        pub fn consumed_capacity(mut self, level: ReturnConsumedCapacity) -> Self {
            self.options.consumed_capacity = Some(level);
            self
        }

        /// Resume from a previous page's `last_evaluated_key`.
        pub fn start_at(mut self, key: Item) -> Self {
            self.options.start_key = Some(key);
            self
        }
    };
}

/// A query operation against a table or index.
pub struct Query<'a, T> {
    session: &'a Session,
    key: Key,
    options: ReadOptions,
    _table: PhantomData<T>,
}

impl<'a, T: TableSchema> Query<'a, T> {
    pub(crate) fn new(session: &'a Session, key: Key) -> Self {
        Self {
            session,
            key,
            options: ReadOptions::default(),
            _table: PhantomData,
        }
    }

    read_options_methods!();

    /// Execute and return a single page.
    pub async fn page(&self) -> Result<Page<T>> {
        self.execute(self.options.start_key.clone()).await
    }

    /// Execute as a stream of records, following pagination transparently.
    pub fn items(self) -> impl Stream<Item = Result<T>> + 'a
    where
        T: 'a,
    {
        async_stream::try_stream! {
            let mut start_key = self.options.start_key.clone();
            let mut pages = 0u32;
            let mut count = 0i64;
            let mut scanned = 0i64;

            loop {
                tracing::debug!(page = pages, "fetching query page");
                let page = self.execute(start_key.take()).await?;
                pages += 1;
                count += page.count as i64;
                scanned += page.scanned as i64;
                let last_evaluated_key = page.last_evaluated_key;

                for item in page.items {
                    yield item;
                }

                match last_evaluated_key {
                    Some(key) => start_key = Some(key),
                    None => {
                        tracing::debug!(records = count, scanned, pages, "query complete");
                        break;
                    }
                }
            }
        }
    }

    /// Execute and collect every record across all pages.
    pub async fn all(self) -> Result<Vec<T>> {
        collect(self.items()).await
    }

    async fn execute(&self, start_key: Option<Item>) -> Result<Page<T>> {
        let table_name = self.session.table_name::<T>();
        let (expression, names, values) =
            key_condition::<T>(&self.key, self.options.index.as_ref())?;

        let mut request = self
            .session
            .client()
            .query()
            .table_name(&table_name)
            .key_condition_expression(expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .set_limit(self.options.limit)
            .set_select(self.options.select.clone())
            .set_consistent_read(self.options.consistent)
            .set_return_consumed_capacity(self.options.consumed_capacity.clone())
            .set_exclusive_start_key(start_key);
        if let Some(index) = &self.options.index {
            request = request.index_name(index.name);
        }

        let result = request
            .send()
            .await
            .map_err(|e| map_query_error(e, &table_name))?;

        parse_page(
            result.items.unwrap_or_default(),
            result.count,
            result.scanned_count,
            result.last_evaluated_key,
        )
    }
}

/// A scan operation over a table or index.
pub struct Scan<'a, T> {
    session: &'a Session,
    options: ReadOptions,
    _table: PhantomData<T>,
}

impl<'a, T: TableSchema> Scan<'a, T> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self {
            session,
            options: ReadOptions::default(),
            _table: PhantomData,
        }
    }

    read_options_methods!();

    /// Execute and return a single page.
    pub async fn page(&self) -> Result<Page<T>> {
        self.execute(self.options.start_key.clone()).await
    }

    /// Execute as a stream of records, following pagination transparently.
    pub fn items(self) -> impl Stream<Item = Result<T>> + 'a
    where
        T: 'a,
    {
        async_stream::try_stream! {
            let mut start_key = self.options.start_key.clone();
            let mut pages = 0u32;
            let mut count = 0i64;
            let mut scanned = 0i64;

            loop {
                tracing::debug!(page = pages, "fetching scan page");
                let page = self.execute(start_key.take()).await?;
                pages += 1;
                count += page.count as i64;
                scanned += page.scanned as i64;
                let last_evaluated_key = page.last_evaluated_key;

                for item in page.items {
                    yield item;
                }

                match last_evaluated_key {
                    Some(key) => start_key = Some(key),
                    None => {
                        tracing::debug!(records = count, scanned, pages, "scan complete");
                        break;
                    }
                }
            }
        }
    }

    /// Execute and collect every record across all pages.
    pub async fn all(self) -> Result<Vec<T>> {
        collect(self.items()).await
    }

    async fn execute(&self, start_key: Option<Item>) -> Result<Page<T>> {
        let table_name = self.session.table_name::<T>();

        let mut request = self
            .session
            .client()
            .scan()
            .table_name(&table_name)
            .set_limit(self.options.limit)
            .set_select(self.options.select.clone())
            .set_consistent_read(self.options.consistent)
            .set_return_consumed_capacity(self.options.consumed_capacity.clone())
            .set_exclusive_start_key(start_key);
        if let Some(index) = &self.options.index {
            request = request.index_name(index.name);
        }

        let result = request
            .send()
            .await
            .map_err(|e| map_scan_error(e, &table_name))?;

        parse_page(
            result.items.unwrap_or_default(),
            result.count,
            result.scanned_count,
            result.last_evaluated_key,
        )
    }
}

fn parse_page<T: TableSchema>(
    items: Vec<HashMap<String, AttributeValue>>,
    count: i32,
    scanned: i32,
    last_evaluated_key: Option<Item>,
) -> Result<Page<T>> {
    let items = items
        .iter()
        .map(T::from_item)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        count,
        scanned,
        last_evaluated_key,
    })
}

async fn collect<T>(stream: impl Stream<Item = Result<T>>) -> Result<Vec<T>> {
    tokio::pin!(stream);
    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item?);
    }
    Ok(items)
}
