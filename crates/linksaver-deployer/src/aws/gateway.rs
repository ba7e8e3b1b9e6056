//! HTTP API gateway provisioning (route-based design)
//!
//! Creates the HTTP API with a permissive CORS configuration, one proxy
//! integration targeting the handler function, and one key-protected route
//! per verb/path pair. HTTP APIs are live as soon as routes exist; there is
//! no separate publish step.

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_apigatewayv2::types::{Cors, IntegrationType, ProtocolType};
use aws_sdk_apigatewayv2::Client;
use linksaver_common::defaults::{ESTIMATES_PATH, ROUTE_KEYS};
use linksaver_common::names::ResourceNames;
use linksaver_common::tags::{TAG_RUN_SUFFIX, TAG_TOOL, TAG_TOOL_VALUE};
use tracing::{debug, info};

/// A provisioned HTTP API
#[derive(Debug, Clone)]
pub struct HttpApi {
    pub api_id: String,
    /// Base endpoint as reported by the provider (no trailing slash)
    pub endpoint: String,
}

impl HttpApi {
    /// The stable base URL the client integration uses.
    pub fn estimates_url(&self) -> String {
        format!("{}{}", self.endpoint, ESTIMATES_PATH)
    }
}

/// API Gateway v2 client for the routed front door
pub struct GatewayClient {
    client: Client,
}

impl GatewayClient {
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.apigatewayv2_client(),
        }
    }

    /// Create the API, the proxy integration, and every route.
    ///
    /// All routes require an API key. Any step failing aborts the run; no
    /// partial-gateway rollback is attempted.
    pub async fn create_http_api(
        &self,
        names: &ResourceNames,
        function_arn: &str,
    ) -> Result<HttpApi> {
        let api_name = names.api();
        info!(api = %api_name, "Creating HTTP API");

        let cors = Cors::builder()
            .allow_origins("*")
            .allow_methods("GET")
            .allow_methods("POST")
            .allow_methods("DELETE")
            .allow_methods("OPTIONS")
            .allow_headers("Content-Type")
            .allow_headers("x-api-key")
            .build();

        let api = self
            .client
            .create_api()
            .name(&api_name)
            .protocol_type(ProtocolType::Http)
            .cors_configuration(cors)
            .tags(TAG_TOOL, TAG_TOOL_VALUE)
            .tags(TAG_RUN_SUFFIX, names.suffix().as_str())
            .send()
            .await
            .context("Failed to create HTTP API")?;

        let api_id = api
            .api_id()
            .map(str::to_string)
            .context("CreateApi returned no API id")?;
        let endpoint = api
            .api_endpoint()
            .map(str::to_string)
            .context("CreateApi returned no endpoint")?;
        debug!(api_id = %api_id, endpoint = %endpoint, "HTTP API created");

        let integration = self
            .client
            .create_integration()
            .api_id(&api_id)
            .integration_type(IntegrationType::AwsProxy)
            .integration_uri(function_arn)
            .payload_format_version("2.0")
            .send()
            .await
            .context("Failed to create Lambda proxy integration")?;

        let integration_id = integration
            .integration_id()
            .map(str::to_string)
            .context("CreateIntegration returned no integration id")?;
        debug!(integration_id = %integration_id, "Proxy integration created");

        for route_key in ROUTE_KEYS {
            self.client
                .create_route()
                .api_id(&api_id)
                .route_key(route_key)
                .target(format!("integrations/{integration_id}"))
                .api_key_required(true)
                .send()
                .await
                .with_context(|| format!("Failed to create route '{route_key}'"))?;
            debug!(route = %route_key, "Route created");
        }

        info!(api_id = %api_id, routes = ROUTE_KEYS.len(), "HTTP API routes configured");
        Ok(HttpApi { api_id, endpoint })
    }

    /// Delete the API. For tests and manual cleanup.
    pub async fn delete_api(&self, api_id: &str) -> Result<()> {
        info!(api_id = %api_id, "Deleting HTTP API");
        self.client
            .delete_api()
            .api_id(api_id)
            .send()
            .await
            .context("Failed to delete HTTP API")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_url_appends_the_path() {
        let api = HttpApi {
            api_id: "abc123".into(),
            endpoint: "https://abc123.execute-api.us-east-2.amazonaws.com".into(),
        };
        assert_eq!(
            api.estimates_url(),
            "https://abc123.execute-api.us-east-2.amazonaws.com/estimates"
        );
        assert!(api.estimates_url().ends_with("/estimates"));
    }
}
