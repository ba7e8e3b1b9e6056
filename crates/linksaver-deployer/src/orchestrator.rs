//! The five-stage deployment pipeline
//!
//! Strictly sequential: each stage's identifier feeds the next. Stages
//! 1-3 treat "already exists" as a benign outcome and continue with a
//! reconstructed reference; gateway and access-control failures always
//! abort. Nothing is rolled back on failure.

use crate::aws::{
    get_current_account_id, package_artifact, AccessClient, AwsContext, GatewayClient, IamClient,
    LambdaClient, Provisioned, TableClient,
};
use crate::config::DeployConfig;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Everything the operator needs from a completed deployment
#[derive(Debug)]
pub struct DeployOutputs {
    /// Base URL of the estimates endpoint (ends in `/estimates`)
    pub endpoint_url: String,
    /// The secret API key, surfaced exactly once
    pub api_key: String,
    pub api_key_id: String,
    pub usage_plan_id: String,
    pub api_id: String,
    pub role_arn: String,
    pub function_arn: String,
    pub table_name: String,
}

/// Run the full provisioning sequence.
#[instrument(skip_all, fields(region = %config.region, suffix = %config.names.suffix()))]
pub async fn deploy(config: &DeployConfig, cancel: &CancellationToken) -> Result<DeployOutputs> {
    // Read and package the artifact before touching any cloud resource so
    // a bad path fails with nothing to clean up.
    let archive = package_artifact(&config.artifact)?;

    let aws = AwsContext::with_profile(&config.region, config.profile.as_deref()).await;
    let account = get_current_account_id(aws.sdk_config())
        .await
        .context("Credential validation failed")?;

    // Stage 1: execution identity and table policy
    info!("Stage 1/5: IAM role and table policy");
    let iam = IamClient::from_context(&aws);
    let role_arn = match iam
        .create_handler_role(&config.names, &config.region, &account, Some(cancel))
        .await?
    {
        Provisioned::Created(arn) => arn,
        Provisioned::Reused(arn) => {
            warn!(role_arn = %arn, "Continuing with reconstructed role reference");
            arn
        }
    };

    // Stage 2: the estimates table
    info!("Stage 2/5: DynamoDB table");
    let tables = TableClient::from_context(&aws);
    tables
        .create_estimates_table(&config.names, Some(cancel))
        .await?;

    // Stage 3: the handler function
    info!("Stage 3/5: Lambda function");
    let lambda = LambdaClient::from_context(&aws);
    let function = lambda
        .create_handler_function(
            &config.names,
            &role_arn,
            archive,
            &config.region,
            &account,
            Some(cancel),
        )
        .await?;
    if let Provisioned::Created(_) = &function {
        if let Some(cap) = config.reserved_concurrency {
            lambda
                .set_reserved_concurrency(&config.names.function(), cap)
                .await?;
        }
    } else {
        warn!("Continuing with reconstructed function reference");
    }
    let function_arn = function.into_inner();

    // Stage 4: the routed front door
    info!("Stage 4/5: API gateway");
    let gateway = GatewayClient::from_context(&aws);
    let api = gateway.create_http_api(&config.names, &function_arn).await?;
    lambda
        .allow_gateway_invoke(&config.names, &config.region, &account, &api.api_id)
        .await?;

    // Stage 5: access control
    info!("Stage 5/5: API key and usage plan");
    let access = AccessClient::from_context(&aws);
    let api_access = access.create_key_and_plan(&config.names, &api.api_id).await?;

    info!(api_id = %api.api_id, "Deployment complete");
    Ok(DeployOutputs {
        endpoint_url: api.estimates_url(),
        api_key: api_access.key_value,
        api_key_id: api_access.key_id,
        usage_plan_id: api_access.plan_id,
        api_id: api.api_id,
        role_arn,
        function_arn,
        table_name: config.names.table(),
    })
}
