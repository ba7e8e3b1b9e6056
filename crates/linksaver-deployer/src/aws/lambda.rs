//! Lambda function provisioning
//!
//! Packages the locally built handler binary into a single-entry zip held
//! in memory, creates the function, waits for it to become active, and
//! grants the gateway invoke rights.

use crate::aws::account::AccountId;
use crate::aws::context::AwsContext;
use crate::aws::provision::Provisioned;
use crate::wait::{wait_for_resource, WaitConfig};
use anyhow::{Context, Result};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, Runtime, State};
use aws_sdk_lambda::Client;
use linksaver_common::defaults::{HANDLER_TIMEOUT_SECS, TABLE_NAME_ENV};
use linksaver_common::names::ResourceNames;
use linksaver_common::tags::{TAG_RUN_SUFFIX, TAG_TOOL, TAG_TOOL_VALUE};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entry name the provided.al2023 runtime executes
const BOOTSTRAP_ENTRY: &str = "bootstrap";

/// Package a prebuilt handler binary as an in-memory deployment archive.
///
/// One entry named `bootstrap`, executable, deflate-compressed.
pub fn package_artifact(binary_path: &Path) -> Result<Vec<u8>> {
    let binary = std::fs::read(binary_path)
        .with_context(|| format!("Failed to read handler artifact '{}'", binary_path.display()))?;

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(BOOTSTRAP_ENTRY, options)
        .context("Failed to start bootstrap entry in deployment archive")?;
    zip.write_all(&binary)
        .context("Failed to write bootstrap entry")?;
    let cursor = zip
        .finish()
        .context("Failed to finish deployment archive")?;

    debug!(
        binary_bytes = binary.len(),
        archive_bytes = cursor.get_ref().len(),
        "Handler artifact packaged"
    );
    Ok(cursor.into_inner())
}

/// Lambda client for the handler function
pub struct LambdaClient {
    client: Client,
}

impl LambdaClient {
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.lambda_client(),
        }
    }

    /// Create the handler function bound to the execution role and the
    /// table name, then block until the provider reports it active.
    ///
    /// If the function already exists its ARN is reconstructed and
    /// returned as `Reused` without waiting. Other failures abort.
    pub async fn create_handler_function(
        &self,
        names: &ResourceNames,
        role_arn: &str,
        archive: Vec<u8>,
        region: &str,
        account: &AccountId,
        cancel: Option<&CancellationToken>,
    ) -> Result<Provisioned<String>> {
        let function_name = names.function();
        info!(function = %function_name, "Creating Lambda function");

        let result = self
            .client
            .create_function()
            .function_name(&function_name)
            .runtime(Runtime::Providedal2023)
            .role(role_arn)
            .handler(BOOTSTRAP_ENTRY)
            .code(FunctionCode::builder().zip_file(Blob::new(archive)).build())
            .timeout(HANDLER_TIMEOUT_SECS)
            .environment(
                Environment::builder()
                    .variables(TABLE_NAME_ENV, names.table())
                    .build(),
            )
            .tags(TAG_TOOL, TAG_TOOL_VALUE)
            .tags(TAG_RUN_SUFFIX, names.suffix().as_str())
            .send()
            .await;

        let function_arn = match result {
            Ok(resp) => resp
                .function_arn()
                .map(str::to_string)
                .context("CreateFunction returned no ARN")?,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_conflict_exception()) =>
            {
                warn!(function = %function_name, "Lambda function already exists, reusing it");
                return Ok(Provisioned::Reused(
                    names.function_arn(region, account.as_str()),
                ));
            }
            Err(err) => return Err(err).context("Failed to create Lambda function"),
        };

        debug!(function = %function_name, "Waiting for function to become active");
        self.wait_until_active(&function_name, cancel).await?;
        info!(function = %function_name, function_arn = %function_arn, "Lambda function is active");

        Ok(Provisioned::Created(function_arn))
    }

    /// Poll the function state until Active. A Failed state aborts with the
    /// provider's reason.
    async fn wait_until_active(
        &self,
        function_name: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        let client = self.client.clone();
        let name = function_name.to_string();

        wait_for_resource(
            WaitConfig::with_timeout(Duration::from_secs(120)),
            cancel,
            || {
                let c = client.clone();
                let n = name.clone();
                async move {
                    let resp = c
                        .get_function_configuration()
                        .function_name(&n)
                        .send()
                        .await
                        .context("Failed to read function configuration")?;
                    match resp.state() {
                        Some(State::Active) => Ok(true),
                        Some(State::Failed) => anyhow::bail!(
                            "Function entered failed state: {}",
                            resp.state_reason().unwrap_or("no reason given")
                        ),
                        _ => Ok(false),
                    }
                }
            },
            "Lambda function",
        )
        .await
        .context("Waiting for Lambda function to become active")
    }

    /// Cap simultaneous invocations of the function (cost guard).
    pub async fn set_reserved_concurrency(&self, function_name: &str, cap: i32) -> Result<()> {
        self.client
            .put_function_concurrency()
            .function_name(function_name)
            .reserved_concurrent_executions(cap)
            .send()
            .await
            .context("Failed to set reserved concurrency")?;
        info!(function = %function_name, cap, "Reserved concurrency set");
        Ok(())
    }

    /// Grant the gateway permission to invoke the function for any route
    /// and stage of the given API.
    pub async fn allow_gateway_invoke(
        &self,
        names: &ResourceNames,
        region: &str,
        account: &AccountId,
        api_id: &str,
    ) -> Result<()> {
        self.client
            .add_permission()
            .function_name(names.function())
            .statement_id(names.invoke_statement_id())
            .action("lambda:InvokeFunction")
            .principal("apigateway.amazonaws.com")
            .source_arn(names.execute_api_arn(region, account.as_str(), api_id))
            .send()
            .await
            .context("Failed to grant gateway invoke permission")?;
        info!(function = %names.function(), api_id = %api_id, "Gateway granted invoke permission");
        Ok(())
    }

    /// Delete the function. For tests and manual cleanup.
    pub async fn delete_handler_function(&self, names: &ResourceNames) -> Result<()> {
        let function_name = names.function();
        info!(function = %function_name, "Deleting Lambda function");
        self.client
            .delete_function()
            .function_name(&function_name)
            .send()
            .await
            .context("Failed to delete Lambda function")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn packaged_archive_has_one_bootstrap_entry() {
        let dir = std::env::temp_dir().join("linksaver-package-test");
        std::fs::create_dir_all(&dir).unwrap();
        let binary_path = dir.join("handler-binary");
        std::fs::write(&binary_path, b"#!ELF fake handler").unwrap();

        let archive = package_artifact(&binary_path).unwrap();
        // Zip local file header magic
        assert_eq!(&archive[..4], b"PK\x03\x04");

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        assert_eq!(zip.len(), 1);
        let mut entry = zip.by_index(0).unwrap();
        assert_eq!(entry.name(), BOOTSTRAP_ENTRY);
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"#!ELF fake handler");
    }

    #[test]
    fn missing_artifact_is_reported_with_path() {
        let err = package_artifact(Path::new("/nonexistent/handler")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/handler"));
    }
}
