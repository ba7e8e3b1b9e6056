//! DynamoDB estimates table provisioning

use crate::aws::context::AwsContext;
use crate::aws::provision::Provisioned;
use crate::wait::{wait_for_resource, WaitConfig};
use anyhow::{Context, Result};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
    Tag,
};
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use linksaver_common::defaults::PARTITION_KEY;
use linksaver_common::names::ResourceNames;
use linksaver_common::tags::{
    format_created_at, TAG_CREATED_AT, TAG_RUN_SUFFIX, TAG_TOOL, TAG_TOOL_VALUE,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

fn tag(key: &str, value: &str) -> Result<Tag> {
    Tag::builder()
        .key(key)
        .value(value)
        .build()
        .context("Failed to build DynamoDB tag")
}

/// DynamoDB client for the estimates table
pub struct TableClient {
    client: Client,
}

impl TableClient {
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.dynamodb_client(),
        }
    }

    /// Create the single-key, on-demand estimates table and block until it
    /// reports active.
    ///
    /// An existing table with this run's name is `Reused`; it is still
    /// waited on, since a concurrent creator may not have finished.
    pub async fn create_estimates_table(
        &self,
        names: &ResourceNames,
        cancel: Option<&CancellationToken>,
    ) -> Result<Provisioned<()>> {
        let table_name = names.table();
        info!(table = %table_name, "Creating DynamoDB table");

        let created_at = format_created_at(Utc::now());
        let result = self
            .client
            .create_table()
            .table_name(&table_name)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(PARTITION_KEY)
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .context("Failed to build attribute definition")?,
            )
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name(PARTITION_KEY)
                    .key_type(KeyType::Hash)
                    .build()
                    .context("Failed to build key schema")?,
            )
            .billing_mode(BillingMode::PayPerRequest)
            .tags(tag(TAG_TOOL, TAG_TOOL_VALUE)?)
            .tags(tag(TAG_RUN_SUFFIX, names.suffix().as_str())?)
            .tags(tag(TAG_CREATED_AT, &created_at)?)
            .send()
            .await;

        let outcome = match result {
            Ok(_) => Provisioned::Created(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_in_use_exception()) =>
            {
                warn!(table = %table_name, "Table already exists, reusing it");
                Provisioned::Reused(())
            }
            Err(err) => return Err(err).context("Failed to create DynamoDB table"),
        };

        debug!(table = %table_name, "Waiting for table to become active");
        self.wait_until_active(&table_name, cancel).await?;
        info!(table = %table_name, "DynamoDB table is active");

        Ok(outcome)
    }

    /// Poll DescribeTable until the provider reports the table usable.
    async fn wait_until_active(
        &self,
        table_name: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        let client = self.client.clone();
        let table_name_owned = table_name.to_string();

        wait_for_resource(
            WaitConfig::with_timeout(Duration::from_secs(300)),
            cancel,
            || {
                let c = client.clone();
                let t = table_name_owned.clone();
                async move {
                    match c.describe_table().table_name(&t).send().await {
                        Ok(resp) => Ok(resp
                            .table()
                            .and_then(|table| table.table_status())
                            .is_some_and(|status| *status == TableStatus::Active)),
                        Err(_) => Ok(false), // Not visible yet
                    }
                }
            },
            "DynamoDB table",
        )
        .await
        .context("Waiting for DynamoDB table to become active")
    }

    /// Delete the table. For tests and manual cleanup.
    pub async fn delete_estimates_table(&self, names: &ResourceNames) -> Result<()> {
        let table_name = names.table();
        info!(table = %table_name, "Deleting DynamoDB table");
        self.client
            .delete_table()
            .table_name(&table_name)
            .send()
            .await
            .context("Failed to delete DynamoDB table")?;
        Ok(())
    }

    /// Check whether the table exists (in any state)
    pub async fn table_exists(&self, table_name: &str) -> bool {
        self.client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .is_ok()
    }
}
