//! Session error type and AWS SDK error mapping.
//!
//! Each DynamoDB operation gets its own mapping function so the interesting
//! service errors (conditional check failures, resource conflicts,
//! throttling) surface as dedicated variants.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use thiserror::Error;

use dynamap_core::{AttrError, KeyError};

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("table already exists: {0}")]
    TableAlreadyExists(String),
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("table {0} did not become active in time")]
    TableNotActive(String),
    #[error("batch write retry limit reached after {retries} retries")]
    BatchRetryLimit { retries: u32 },
    #[error("condition failed for {0}")]
    ConditionFailed(String),
    #[error("throughput exceeded, please retry")]
    ThroughputExceeded,
    #[error("request limit exceeded, please retry")]
    RequestLimitExceeded,
    #[error(transparent)]
    Attr(#[from] AttrError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("failed to build request: {0}")]
    BuildRequest(String),
    #[error("{op} failed: {message}")]
    Sdk { op: &'static str, message: String },
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

fn sdk_error(op: &'static str, err: impl Debug) -> SessionError {
    SessionError::Sdk {
        op,
        message: format!("{err:?}"),
    }
}

/// Map a CreateTable SDK error to SessionError.
pub fn map_create_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<CreateTableError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        CreateTableError::ResourceInUseException(_) => {
            SessionError::TableAlreadyExists(table_name.to_string())
        }
        CreateTableError::LimitExceededException(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("CreateTable", err),
    }
}

/// Map a DeleteTable SDK error to SessionError.
pub fn map_delete_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteTableError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        DeleteTableError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        DeleteTableError::LimitExceededException(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("DeleteTable", err),
    }
}

/// Map a DescribeTable SDK error to SessionError.
pub fn map_describe_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DescribeTableError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        DescribeTableError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        err => sdk_error("DescribeTable", err),
    }
}

/// Map a PutItem SDK error to SessionError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        PutItemError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        PutItemError::ConditionalCheckFailedException(_) => {
            SessionError::ConditionFailed(table_name.to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            SessionError::ThroughputExceeded
        }
        PutItemError::RequestLimitExceeded(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("PutItem", err),
    }
}

/// Map a GetItem SDK error to SessionError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            SessionError::ThroughputExceeded
        }
        GetItemError::RequestLimitExceeded(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("GetItem", err),
    }
}

/// Map a DeleteItem SDK error to SessionError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        DeleteItemError::ConditionalCheckFailedException(_) => {
            SessionError::ConditionFailed(table_name.to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            SessionError::ThroughputExceeded
        }
        DeleteItemError::RequestLimitExceeded(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("DeleteItem", err),
    }
}

/// Map an UpdateItem SDK error to SessionError.
///
/// Conditional check failures are not mapped here; operations that treat them
/// as "item absent" (see `Session::get_update_item`) inspect the service
/// error themselves.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        UpdateItemError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        UpdateItemError::ConditionalCheckFailedException(_) => {
            SessionError::ConditionFailed(table_name.to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            SessionError::ThroughputExceeded
        }
        UpdateItemError::RequestLimitExceeded(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("UpdateItem", err),
    }
}

/// Map a Query SDK error to SessionError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => SessionError::ThroughputExceeded,
        QueryError::RequestLimitExceeded(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("Query", err),
    }
}

/// Map a Scan SDK error to SessionError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
    table_name: &str,
) -> SessionError {
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => {
            SessionError::TableNotFound(table_name.to_string())
        }
        ScanError::ProvisionedThroughputExceededException(_) => SessionError::ThroughputExceeded,
        ScanError::RequestLimitExceeded(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("Scan", err),
    }
}

/// Map a BatchWriteItem SDK error to SessionError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
) -> SessionError {
    match err.into_service_error() {
        BatchWriteItemError::ProvisionedThroughputExceededException(_) => {
            SessionError::ThroughputExceeded
        }
        BatchWriteItemError::RequestLimitExceeded(_) => SessionError::RequestLimitExceeded,
        err => sdk_error("BatchWriteItem", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_already_exists_display() {
        let error = SessionError::TableAlreadyExists("library.Book".to_string());
        assert_eq!(error.to_string(), "table already exists: library.Book");
    }

    #[test]
    fn test_batch_retry_limit_display() {
        let error = SessionError::BatchRetryLimit { retries: 5 };
        assert_eq!(
            error.to_string(),
            "batch write retry limit reached after 5 retries"
        );
    }

    #[test]
    fn test_attr_error_is_transparent() {
        let error = SessionError::from(AttrError::MissingAttribute("isbn".to_string()));
        assert_eq!(error.to_string(), "missing attribute: isbn");
    }

    #[test]
    fn test_key_error_is_transparent() {
        let error = SessionError::from(KeyError::MissingRangeKey {
            table: "library.Book",
        });
        assert_eq!(
            error.to_string(),
            "table library.Book uses a hash/range key pair, a single key value was supplied"
        );
    }
}
