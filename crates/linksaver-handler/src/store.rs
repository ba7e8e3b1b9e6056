//! Estimate storage behind a trait so the dispatcher can be tested without
//! a live table.

use crate::convert::{item_to_json, json_map_to_item};
use anyhow::{Context, Result};
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use linksaver_common::defaults::{BATCH_WRITE_CHUNK, PARTITION_KEY};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Resubmission attempts for unprocessed batch-write entries before giving up
const BATCH_RETRY_LIMIT: u32 = 5;

/// Base delay between batch-write resubmissions, doubled per attempt
const BATCH_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Storage operations the dispatcher needs.
pub trait EstimateStore: Send + Sync {
    /// Return every record in the table.
    fn list(&self) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Upsert one record by its `id` field.
    fn put(&self, record: &Map<String, Value>) -> impl Future<Output = Result<()>> + Send;

    /// Delete one record by id. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete every record. Returns the number of records removed.
    fn clear(&self) -> impl Future<Output = Result<usize>> + Send;
}

/// DynamoDB-backed estimate store.
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// Scan the whole table, following pagination.
    async fn scan_all(
        &self,
        projection: Option<&str>,
    ) -> Result<Vec<std::collections::HashMap<String, AttributeValue>>> {
        let mut items = Vec::new();
        let mut start_key = None;

        loop {
            let mut request = self.client.scan().table_name(&self.table_name);
            if let Some(attr) = projection {
                request = request.projection_expression(attr);
            }
            if let Some(key) = start_key {
                request = request.set_exclusive_start_key(Some(key));
            }

            let page = request.send().await.context("Failed to scan table")?;
            items.extend(page.items().iter().cloned());

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }
}

impl EstimateStore for DynamoStore {
    async fn list(&self) -> Result<Vec<Value>> {
        let items = self.scan_all(None).await?;
        debug!(count = items.len(), "Scanned estimates");
        Ok(items.iter().map(item_to_json).collect())
    }

    async fn put(&self, record: &Map<String, Value>) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(json_map_to_item(record)))
            .send()
            .await
            .context("Failed to put estimate")?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
            .send()
            .await
            .context("Failed to delete estimate")?;
        Ok(())
    }

    async fn clear(&self) -> Result<usize> {
        let keys = self.scan_all(Some(PARTITION_KEY)).await?;
        let total = keys.len();

        for chunk in keys.chunks(BATCH_WRITE_CHUNK) {
            let mut requests = chunk
                .iter()
                .filter_map(|item| item.get(PARTITION_KEY).cloned())
                .map(|id| {
                    let delete = DeleteRequest::builder()
                        .key(PARTITION_KEY, id)
                        .build()
                        .context("Failed to build delete request")?;
                    Ok(WriteRequest::builder().delete_request(delete).build())
                })
                .collect::<Result<Vec<_>>>()?;

            // A batch write may process only part of the batch and return
            // the rest in UnprocessedItems; resubmit until none remain.
            let mut attempts = 0u32;
            while !requests.is_empty() {
                let output = self
                    .client
                    .batch_write_item()
                    .request_items(&self.table_name, requests)
                    .send()
                    .await
                    .context("Failed to batch-delete estimates")?;

                requests = unprocessed_for_table(&output, &self.table_name);
                if requests.is_empty() {
                    break;
                }

                attempts += 1;
                if attempts >= BATCH_RETRY_LIMIT {
                    anyhow::bail!(
                        "Batch delete left {} entries unprocessed after {} attempts",
                        requests.len(),
                        attempts
                    );
                }
                debug!(
                    remaining = requests.len(),
                    attempt = attempts,
                    "Resubmitting unprocessed batch deletes"
                );
                tokio::time::sleep(BATCH_RETRY_DELAY * 2u32.pow(attempts - 1)).await;
            }
        }

        debug!(count = total, "Cleared estimates table");
        Ok(total)
    }
}

/// Write requests the provider returned unprocessed for one table.
fn unprocessed_for_table(output: &BatchWriteItemOutput, table_name: &str) -> Vec<WriteRequest> {
    output
        .unprocessed_items()
        .and_then(|items| items.get(table_name))
        .cloned()
        .unwrap_or_default()
}
