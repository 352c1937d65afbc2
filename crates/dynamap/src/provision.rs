//! Table provisioning: key schemas, attribute definitions, and index
//! construction for `CreateTable`.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, KeyType, LocalSecondaryIndex,
    Projection, ProjectionType, ProvisionedThroughput, TableStatus,
};

use dynamap_core::{IndexDef, IndexKind, IndexProjection, KeyAttribute, TableSchema, Throughput};

use crate::error::{
    map_create_table_error, map_delete_table_error, map_describe_table_error, Result, SessionError,
};
use crate::session::Session;

/// Call-time throughput overrides for [`Session::create_table`].
///
/// `table` overrides the schema's capacity; `indexes` overrides individual
/// global indexes by name.
#[derive(Debug, Clone, Default)]
pub struct ThroughputOverrides {
    pub table: Option<Throughput>,
    pub indexes: HashMap<String, Throughput>,
}

impl ThroughputOverrides {
    pub fn table(read: i64, write: i64) -> Self {
        Self {
            table: Some(Throughput { read, write }),
            indexes: HashMap::new(),
        }
    }

    pub fn with_index(mut self, name: impl Into<String>, read: i64, write: i64) -> Self {
        self.indexes
            .insert(name.into(), Throughput { read, write });
        self
    }
}

impl Session {
    /// Create the table for schema `T`.
    ///
    /// Assembles the key schema, attribute definitions (table and index keys,
    /// deduplicated), provisioned throughput, and any secondary indexes. A
    /// table that already exists surfaces as
    /// [`SessionError::TableAlreadyExists`].
    pub async fn create_table<T: TableSchema>(
        &self,
        overrides: ThroughputOverrides,
    ) -> Result<()> {
        let table_name = self.table_name::<T>();
        let table_throughput = overrides.table.unwrap_or_else(T::throughput);

        let mut request = self
            .client()
            .create_table()
            .table_name(&table_name)
            .set_key_schema(Some(key_schema(&T::key_attributes())?))
            .set_attribute_definitions(Some(attribute_definitions::<T>()?))
            .provisioned_throughput(provisioned_throughput(table_throughput)?);

        for index in T::indexes() {
            match index.kind {
                IndexKind::Global => {
                    let index_throughput = overrides
                        .indexes
                        .get(index.name)
                        .copied()
                        .unwrap_or(Throughput {
                            read: index.read_capacity.unwrap_or(table_throughput.read),
                            write: index.write_capacity.unwrap_or(table_throughput.write),
                        });
                    request =
                        request.global_secondary_indexes(global_index(&index, index_throughput)?);
                }
                IndexKind::Local => {
                    request = request.local_secondary_indexes(local_index(&index)?);
                }
            }
        }

        request
            .send()
            .await
            .map_err(|e| map_create_table_error(e, &table_name))?;

        tracing::info!(table = %table_name, "created table");
        Ok(())
    }

    /// Delete the table for schema `T`.
    pub async fn delete_table<T: TableSchema>(&self) -> Result<()> {
        let table_name = self.table_name::<T>();

        self.client()
            .delete_table()
            .table_name(&table_name)
            .send()
            .await
            .map_err(|e| map_delete_table_error(e, &table_name))?;

        tracing::info!(table = %table_name, "deleted table");
        Ok(())
    }

    /// Poll `DescribeTable` until the table for schema `T` reports `ACTIVE`.
    ///
    /// Checks once per second; gives up with
    /// [`SessionError::TableNotActive`] when `timeout` elapses.
    pub async fn wait_for_table_active<T: TableSchema>(&self, timeout: Duration) -> Result<()> {
        let table_name = self.table_name::<T>();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let result = self
                .client()
                .describe_table()
                .table_name(&table_name)
                .send()
                .await
                .map_err(|e| map_describe_table_error(e, &table_name))?;

            let status = result.table.and_then(|t| t.table_status);
            if status == Some(TableStatus::Active) {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(SessionError::TableNotActive(table_name));
            }

            tracing::debug!(table = %table_name, status = ?status, "waiting for table");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

fn build_error(err: impl std::fmt::Display) -> SessionError {
    SessionError::BuildRequest(err.to_string())
}

/// Key schema elements for a hash key plus optional range key.
pub(crate) fn key_schema(keys: &[KeyAttribute]) -> Result<Vec<KeySchemaElement>> {
    keys.iter()
        .enumerate()
        .map(|(position, key)| {
            let key_type = if position == 0 {
                KeyType::Hash
            } else {
                KeyType::Range
            };
            KeySchemaElement::builder()
                .attribute_name(key.name)
                .key_type(key_type)
                .build()
                .map_err(build_error)
        })
        .collect()
}

/// Attribute definitions covering the table key and every index key, each
/// attribute defined once.
pub(crate) fn attribute_definitions<T: TableSchema>() -> Result<Vec<AttributeDefinition>> {
    let mut attributes = T::key_attributes();
    for index in T::indexes() {
        for key in index.key_attributes() {
            if !attributes.iter().any(|a| a.name == key.name) {
                attributes.push(key);
            }
        }
    }

    attributes
        .into_iter()
        .map(|attribute| {
            AttributeDefinition::builder()
                .attribute_name(attribute.name)
                .attribute_type(attribute.kind.attribute_type())
                .build()
                .map_err(build_error)
        })
        .collect()
}

fn provisioned_throughput(throughput: Throughput) -> Result<ProvisionedThroughput> {
    ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read)
        .write_capacity_units(throughput.write)
        .build()
        .map_err(build_error)
}

pub(crate) fn projection(index: &IndexDef) -> Projection {
    let builder = match &index.projection {
        IndexProjection::All => Projection::builder().projection_type(ProjectionType::All),
        IndexProjection::KeysOnly => {
            Projection::builder().projection_type(ProjectionType::KeysOnly)
        }
        IndexProjection::Include { .. } => Projection::builder()
            .projection_type(ProjectionType::Include)
            .set_non_key_attributes(Some(
                index
                    .projected_attributes()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            )),
    };
    builder.build()
}

pub(crate) fn global_index(
    index: &IndexDef,
    throughput: Throughput,
) -> Result<GlobalSecondaryIndex> {
    GlobalSecondaryIndex::builder()
        .index_name(index.name)
        .set_key_schema(Some(key_schema(&index.key_attributes())?))
        .projection(projection(index))
        .provisioned_throughput(provisioned_throughput(throughput)?)
        .build()
        .map_err(build_error)
}

pub(crate) fn local_index(index: &IndexDef) -> Result<LocalSecondaryIndex> {
    LocalSecondaryIndex::builder()
        .index_name(index.name)
        .set_key_schema(Some(key_schema(&index.key_attributes())?))
        .projection(projection(index))
        .build()
        .map_err(build_error)
}
