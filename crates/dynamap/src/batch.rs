//! Chunked batch writes with retry of unprocessed items.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};

use dynamap_core::TableSchema;

use crate::error::{map_batch_write_error, Result, SessionError};
use crate::session::Session;

/// DynamoDB's limit on request items per `BatchWriteItem` call.
pub const MAX_BATCH_SIZE: usize = 25;

/// Options for [`Session::batch_write`].
#[derive(Debug, Clone)]
pub struct BatchWriteOptions {
    /// Items per batch; capped at [`MAX_BATCH_SIZE`].
    pub batch_size: usize,
    /// Delay before retrying unprocessed items.
    pub backoff: Duration,
    /// Retries of unprocessed items per batch before giving up.
    pub retry_limit: u32,
}

impl Default for BatchWriteOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            backoff: Duration::from_secs(5),
            retry_limit: 5,
        }
    }
}

/// Statistics from a completed batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStats {
    pub items: usize,
    pub batches: usize,
    pub retries: u32,
}

impl Session {
    /// Write many records in batches of up to 25 request items.
    ///
    /// Unprocessed items returned by DynamoDB are retried after a backoff
    /// delay, up to `retry_limit` attempts per batch (retry limits are
    /// usually hit when provisioned throughput is exceeded).
    pub async fn batch_write<T, I>(&self, items: I, options: BatchWriteOptions) -> Result<BatchStats>
    where
        T: TableSchema,
        I: IntoIterator<Item = T>,
    {
        let table_name = self.table_name::<T>();
        let batch_size = options.batch_size.clamp(1, MAX_BATCH_SIZE);
        let mut stats = BatchStats::default();

        let mut pending: Vec<WriteRequest> = Vec::with_capacity(batch_size);
        for item in items {
            pending.push(put_request(&item)?);
            if pending.len() == batch_size {
                let batch = std::mem::take(&mut pending);
                stats.items += batch.len();
                self.write_batch(&table_name, batch, &options, &mut stats)
                    .await?;
            }
        }
        if !pending.is_empty() {
            stats.items += pending.len();
            self.write_batch(&table_name, pending, &options, &mut stats)
                .await?;
        }

        tracing::info!(
            records = stats.items,
            batches = stats.batches,
            "batch write complete"
        );
        Ok(stats)
    }

    async fn write_batch(
        &self,
        table_name: &str,
        requests: Vec<WriteRequest>,
        options: &BatchWriteOptions,
        stats: &mut BatchStats,
    ) -> Result<()> {
        tracing::info!(batch = stats.batches, "loading batch");
        stats.batches += 1;

        let mut batch = HashMap::from([(table_name.to_string(), requests)]);
        let mut retry = 0u32;

        loop {
            let result = self
                .client()
                .batch_write_item()
                .set_request_items(Some(batch))
                .send()
                .await
                .map_err(map_batch_write_error)?;

            let unprocessed = result.unprocessed_items.unwrap_or_default();
            if unprocessed.values().all(Vec::is_empty) {
                return Ok(());
            }

            retry += 1;
            stats.retries += 1;
            if retry > options.retry_limit {
                return Err(SessionError::BatchRetryLimit { retries: retry - 1 });
            }

            let remaining: usize = unprocessed.values().map(Vec::len).sum();
            tracing::warn!(
                remaining,
                backoff_secs = options.backoff.as_secs(),
                retry,
                retry_limit = options.retry_limit,
                "unprocessed items returned, backing off"
            );
            tokio::time::sleep(options.backoff).await;
            batch = unprocessed;
        }
    }
}

fn put_request<T: TableSchema>(item: &T) -> Result<WriteRequest> {
    let put = PutRequest::builder()
        .set_item(Some(item.storage_item()))
        .build()
        .map_err(|e| SessionError::BuildRequest(e.to_string()))?;
    Ok(WriteRequest::builder().put_request(put).build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{canned_response, replay_session, sample_book};

    const UNPROCESSED: &str = r#"{"UnprocessedItems":{"library.Book":[{"PutRequest":{"Item":{"isbn":{"S":"0-345-39180-2"}}}}]}}"#;

    fn fast_retries(retry_limit: u32) -> BatchWriteOptions {
        BatchWriteOptions {
            batch_size: MAX_BATCH_SIZE,
            backoff: Duration::ZERO,
            retry_limit,
        }
    }

    #[test]
    fn test_default_options() {
        let options = BatchWriteOptions::default();
        assert_eq!(options.batch_size, MAX_BATCH_SIZE);
        assert_eq!(options.backoff, Duration::from_secs(5));
        assert_eq!(options.retry_limit, 5);
    }

    #[test]
    fn test_put_request_strips_nulls() {
        let request = put_request(&sample_book()).unwrap();

        let item = request.put_request().unwrap().item();
        assert!(item.contains_key("isbn"));
        assert!(!item.contains_key("genre"));
    }

    #[tokio::test]
    async fn test_batch_write_retries_unprocessed_items_then_succeeds() {
        let session = replay_session(vec![
            canned_response(200, UNPROCESSED),
            canned_response(200, "{}"),
        ]);

        let stats = session
            .batch_write(vec![sample_book()], fast_retries(2))
            .await
            .unwrap();

        assert_eq!(
            stats,
            BatchStats {
                items: 1,
                batches: 1,
                retries: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_batch_write_fails_once_retry_limit_exhausted() {
        // Initial call plus two retries, each returning the item unprocessed.
        let session = replay_session(vec![
            canned_response(200, UNPROCESSED),
            canned_response(200, UNPROCESSED),
            canned_response(200, UNPROCESSED),
        ]);

        let result = session
            .batch_write(vec![sample_book()], fast_retries(2))
            .await;

        assert!(matches!(
            result,
            Err(SessionError::BatchRetryLimit { retries: 2 })
        ));
    }
}
