//! Deployment configuration
//!
//! Resolved once at process start and injected into every provisioner;
//! nothing downstream reads ambient environment state.

use anyhow::{bail, Result};
use linksaver_common::names::ResourceNames;
use std::path::PathBuf;

/// Configuration for one deployment run
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// AWS region, resolved before any provisioner runs
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub profile: Option<String>,
    /// Path to the prebuilt handler binary
    pub artifact: PathBuf,
    /// Reserved concurrency cap for the handler; `None` leaves it uncapped
    pub reserved_concurrency: Option<i32>,
    /// Every resource name for this run
    pub names: ResourceNames,
}

/// Resolve the deployment region, preferring an explicit flag over the
/// ambient provider chain (env vars, profile config).
///
/// Fails fast when no region can be determined: every later stage needs it
/// for ARN construction.
pub async fn resolve_region(flag: Option<String>) -> Result<String> {
    if let Some(region) = flag {
        return Ok(region);
    }

    let provider = aws_config::meta::region::RegionProviderChain::default_provider();
    match provider.region().await {
        Some(region) => Ok(region.as_ref().to_string()),
        None => bail!(
            "AWS region could not be determined. Pass --region or configure one \
             via AWS_REGION / your AWS profile."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_region_wins() {
        let region = resolve_region(Some("eu-west-1".to_string())).await.unwrap();
        assert_eq!(region, "eu-west-1");
    }
}
