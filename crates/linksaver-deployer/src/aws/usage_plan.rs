//! API key and usage plan provisioning
//!
//! Keys and usage plans live in the REST control plane even when the
//! gateway itself is a v2 HTTP API, so this stage uses the
//! `aws-sdk-apigateway` client.

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_apigateway::types::{ApiStage, QuotaPeriodType, QuotaSettings, ThrottleSettings};
use aws_sdk_apigateway::Client;
use linksaver_common::defaults::{MONTHLY_QUOTA, THROTTLE_BURST, THROTTLE_RATE_PER_SEC};
use linksaver_common::names::ResourceNames;
use tracing::{debug, info};

/// The implicit stage HTTP APIs deploy to
const DEFAULT_STAGE: &str = "$default";

/// A provisioned key and plan. `key_value` is the only secret in the
/// deployment and is surfaced to the operator exactly once.
#[derive(Debug, Clone)]
pub struct ApiAccess {
    pub key_id: String,
    pub key_value: String,
    pub plan_id: String,
}

/// API Gateway control-plane client for keys and usage plans
pub struct AccessClient {
    client: Client,
}

impl AccessClient {
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.apigateway_client(),
        }
    }

    /// Create an enabled API key and a throttled, quota-limited usage plan
    /// bound to the API's default stage, then associate the two.
    ///
    /// Any step failing aborts the run; no partial cleanup.
    pub async fn create_key_and_plan(
        &self,
        names: &ResourceNames,
        api_id: &str,
    ) -> Result<ApiAccess> {
        info!(api_id = %api_id, "Creating API key and usage plan");

        let key = self
            .client
            .create_api_key()
            .name(names.api_key())
            .description("API key for the linksaver client integration")
            .enabled(true)
            .send()
            .await
            .context("Failed to create API key")?;

        let key_id = key
            .id()
            .map(str::to_string)
            .context("CreateApiKey returned no id")?;
        let key_value = key
            .value()
            .map(str::to_string)
            .context("CreateApiKey returned no key value")?;
        debug!(key_id = %key_id, "API key created");

        let plan = self
            .client
            .create_usage_plan()
            .name(names.usage_plan())
            .description("Limits usage of the linksaver estimates API")
            .throttle(
                ThrottleSettings::builder()
                    .rate_limit(THROTTLE_RATE_PER_SEC)
                    .burst_limit(THROTTLE_BURST)
                    .build(),
            )
            .quota(
                QuotaSettings::builder()
                    .limit(MONTHLY_QUOTA)
                    .period(QuotaPeriodType::Month)
                    .build(),
            )
            .api_stages(
                ApiStage::builder()
                    .api_id(api_id)
                    .stage(DEFAULT_STAGE)
                    .build(),
            )
            .send()
            .await
            .context("Failed to create usage plan")?;

        let plan_id = plan
            .id()
            .map(str::to_string)
            .context("CreateUsagePlan returned no id")?;
        debug!(plan_id = %plan_id, "Usage plan created");

        self.client
            .create_usage_plan_key()
            .usage_plan_id(&plan_id)
            .key_id(&key_id)
            .key_type("API_KEY")
            .send()
            .await
            .context("Failed to associate API key with usage plan")?;

        info!(key_id = %key_id, plan_id = %plan_id, "API key associated with usage plan");
        Ok(ApiAccess {
            key_id,
            key_value,
            plan_id,
        })
    }

    /// Delete the key and plan. For tests and manual cleanup.
    pub async fn delete_key_and_plan(&self, access: &ApiAccess) -> Result<()> {
        self.client
            .delete_usage_plan_key()
            .usage_plan_id(&access.plan_id)
            .key_id(&access.key_id)
            .send()
            .await
            .context("Failed to detach API key from usage plan")?;
        self.client
            .delete_usage_plan()
            .usage_plan_id(&access.plan_id)
            .send()
            .await
            .context("Failed to delete usage plan")?;
        self.client
            .delete_api_key()
            .api_key(&access.key_id)
            .send()
            .await
            .context("Failed to delete API key")?;
        info!(key_id = %access.key_id, plan_id = %access.plan_id, "API key and usage plan deleted");
        Ok(())
    }
}
