//! IAM execution role and table policy for the handler function

use crate::aws::account::AccountId;
use crate::aws::context::AwsContext;
use crate::aws::provision::Provisioned;
use crate::wait::settle_delay;
use anyhow::{Context, Result};
use aws_sdk_iam::types::Tag;
use aws_sdk_iam::Client;
use chrono::Utc;
use linksaver_common::names::ResourceNames;
use linksaver_common::tags::{
    format_created_at, TAG_CREATED_AT, TAG_RUN_SUFFIX, TAG_TOOL, TAG_TOOL_VALUE,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed settling delay after role creation. IAM is eventually consistent
/// and exposes nothing to poll for "visible to Lambda".
const IAM_SETTLE_DELAY: Duration = Duration::from_secs(10);

/// The trust policy allowing Lambda to assume the role
const LAMBDA_ASSUME_ROLE_POLICY: &str = r#"{
    "Version": "2012-10-17",
    "Statement": [
        {
            "Effect": "Allow",
            "Principal": {
                "Service": "lambda.amazonaws.com"
            },
            "Action": "sts:AssumeRole"
        }
    ]
}"#;

/// Generate the inline policy for the handler.
///
/// Exactly the four data-plane actions the dispatcher issues, scoped to
/// the one table this run creates.
fn table_access_policy(table_arn: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "EstimatesTableAccess",
                "Effect": "Allow",
                "Action": [
                    "dynamodb:Scan",
                    "dynamodb:PutItem",
                    "dynamodb:DeleteItem",
                    "dynamodb:BatchWriteItem"
                ],
                "Resource": table_arn
            }
        ]
    })
    .to_string()
}

fn tag(key: &str, value: &str) -> Result<Tag> {
    Tag::builder()
        .key(key)
        .value(value)
        .build()
        .context("Failed to build IAM tag")
}

/// IAM client for managing the handler's execution role
pub struct IamClient {
    client: Client,
}

impl IamClient {
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }

    /// Create the execution role with the Lambda trust policy and attach
    /// the inline table policy.
    ///
    /// If the role already exists its ARN is reconstructed from the run's
    /// names and returned as `Reused`; the policy is left untouched and the
    /// settling delay is skipped. Any other failure aborts.
    pub async fn create_handler_role(
        &self,
        names: &ResourceNames,
        region: &str,
        account: &AccountId,
        cancel: Option<&CancellationToken>,
    ) -> Result<Provisioned<String>> {
        let role_name = names.role();
        info!(role_name = %role_name, "Creating IAM role for handler");

        let created_at = format_created_at(Utc::now());
        let result = self
            .client
            .create_role()
            .role_name(&role_name)
            .assume_role_policy_document(LAMBDA_ASSUME_ROLE_POLICY)
            .description("Allows the linksaver handler to access its estimates table")
            .tags(tag(TAG_TOOL, TAG_TOOL_VALUE)?)
            .tags(tag(TAG_RUN_SUFFIX, names.suffix().as_str())?)
            .tags(tag(TAG_CREATED_AT, &created_at)?)
            .send()
            .await;

        let role_arn = match result {
            Ok(resp) => resp
                .role()
                .map(|role| role.arn().to_string())
                .context("CreateRole returned no role")?,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_entity_already_exists_exception()) =>
            {
                warn!(role_name = %role_name, "IAM role already exists, reusing it");
                return Ok(Provisioned::Reused(names.role_arn(account.as_str())));
            }
            Err(err) => return Err(err).context("Failed to create IAM role"),
        };

        debug!(role_name = %role_name, "IAM role created");

        let policy_document = table_access_policy(&names.table_arn(region, account.as_str()));
        self.client
            .put_role_policy()
            .role_name(&role_name)
            .policy_name(names.policy())
            .policy_document(policy_document)
            .send()
            .await
            .context("Failed to attach inline table policy to role")?;

        debug!(role_name = %role_name, policy_name = %names.policy(), "Inline policy attached");

        // Lambda rejects roles it cannot see yet; give IAM time to propagate
        settle_delay(IAM_SETTLE_DELAY, cancel, "IAM role propagation").await?;

        info!(role_name = %role_name, role_arn = %role_arn, "IAM role ready");
        Ok(Provisioned::Created(role_arn))
    }

    /// Delete the role and its inline policy. Best-effort, for tests and
    /// manual cleanup; missing pieces are logged and skipped.
    pub async fn delete_handler_role(&self, names: &ResourceNames) -> Result<()> {
        let role_name = names.role();
        info!(role_name = %role_name, "Deleting IAM role");

        if let Err(e) = self
            .client
            .delete_role_policy()
            .role_name(&role_name)
            .policy_name(names.policy())
            .send()
            .await
        {
            debug!(error = ?e, "Failed to delete role policy (may already be deleted)");
        }

        if let Err(e) = self.client.delete_role().role_name(&role_name).send().await {
            warn!(error = ?e, role_name = %role_name, "Failed to delete IAM role");
        } else {
            info!(role_name = %role_name, "IAM role deleted");
        }

        Ok(())
    }

    /// Check whether the role exists
    pub async fn role_exists(&self, role_name: &str) -> bool {
        self.client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .is_ok()
    }
}
