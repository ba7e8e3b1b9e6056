//! Provisioning integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_deploy_integration -- --ignored
//! ```
//!
//! Each test creates its own suffixed resources and deletes them before
//! finishing, so runs are safe against a shared account.

mod aws_test_helpers;

use aws_test_helpers::*;
use linksaver_deployer::aws::{
    get_current_account_id, AccessClient, ApiAccess, AwsContext, GatewayClient, IamClient,
    LambdaClient, Provisioned, TableClient,
};
use linksaver_deployer::config::DeployConfig;
use linksaver_deployer::orchestrator;
use tokio_util::sync::CancellationToken;

/// Test IAM role create/reuse/delete lifecycle
///
/// This test verifies:
/// 1. Role creation with the Lambda trust policy and inline table policy
/// 2. The propagation wait completing
/// 3. A second create reporting `Reused` with the same ARN
/// 4. Clean deletion of the policy and role
#[tokio::test]
#[ignore]
async fn test_create_and_delete_role() {
    let region = get_test_region();
    let ctx = AwsContext::new(&region).await;
    let account = get_current_account_id(ctx.sdk_config())
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");

    let names = test_names();
    let client = IamClient::from_context(&ctx);

    let created = client
        .create_handler_role(&names, &region, &account, None)
        .await
        .expect("Should create role and attach policy");
    let role_arn = match created {
        Provisioned::Created(arn) => arn,
        Provisioned::Reused(_) => panic!("Fresh suffix should never report Reused"),
    };
    assert!(
        role_arn.ends_with(&names.role()),
        "Role ARN should end with the role name, got: {}",
        role_arn
    );
    assert!(client.role_exists(&names.role()).await);

    // A second create against the same names must be benign and must
    // reconstruct the identical ARN
    let reused = client
        .create_handler_role(&names, &region, &account, None)
        .await
        .expect("Second create should succeed as a reuse");
    match reused {
        Provisioned::Reused(arn) => assert_eq!(arn, role_arn),
        Provisioned::Created(_) => panic!("Existing role should report Reused"),
    }

    client
        .delete_handler_role(&names)
        .await
        .expect("Should delete policy and role");

    // IAM deletions can take a moment to become visible
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    assert!(
        !client.role_exists(&names.role()).await,
        "Role should not exist after deletion"
    );
}

/// Test DynamoDB table create/reuse/delete lifecycle
///
/// This test verifies:
/// 1. Table creation with on-demand billing and the single string key
/// 2. The active-status wait completing
/// 3. A second create reporting `Reused` (and still waiting on active)
/// 4. Clean deletion
#[tokio::test]
#[ignore]
async fn test_create_and_delete_table() {
    let region = get_test_region();
    let ctx = AwsContext::new(&region).await;
    let names = test_names();
    let client = TableClient::from_context(&ctx);

    let created = client
        .create_estimates_table(&names, None)
        .await
        .expect("Should create table and see it become active");
    assert!(
        !created.is_reused(),
        "Fresh suffix should never report Reused"
    );
    assert!(client.table_exists(&names.table()).await);

    let reused = client
        .create_estimates_table(&names, None)
        .await
        .expect("Second create should succeed as a reuse");
    assert!(reused.is_reused(), "Existing table should report Reused");

    client
        .delete_estimates_table(&names)
        .await
        .expect("Should delete table");
}

/// End-to-end deploy smoke test
///
/// Runs the full five-stage pipeline against a placeholder artifact (the
/// control plane accepts any zip payload; the binary is only validated at
/// invoke time), verifies the outputs, then tears everything down in
/// reverse order.
#[tokio::test]
#[ignore]
async fn test_full_deploy_and_teardown() {
    let region = get_test_region();
    let names = test_names();

    let dir = std::env::temp_dir().join(format!("linksaver-e2e-{}", names.suffix()));
    std::fs::create_dir_all(&dir).expect("Should create temp dir");
    let artifact = dir.join("bootstrap");
    std::fs::write(&artifact, b"\x7fELF placeholder").expect("Should write placeholder artifact");

    let config = DeployConfig {
        region: region.clone(),
        profile: None,
        artifact,
        reserved_concurrency: Some(1),
        names: names.clone(),
    };
    let cancel = CancellationToken::new();
    let outputs = orchestrator::deploy(&config, &cancel)
        .await
        .expect("Full deployment should succeed");

    assert!(
        outputs.endpoint_url.ends_with("/estimates"),
        "Endpoint URL should end with /estimates, got: {}",
        outputs.endpoint_url
    );
    assert!(!outputs.api_key.is_empty(), "API key should be non-empty");
    assert_eq!(outputs.table_name, names.table());

    // Teardown in reverse creation order
    let ctx = AwsContext::new(&region).await;
    AccessClient::from_context(&ctx)
        .delete_key_and_plan(&ApiAccess {
            key_id: outputs.api_key_id.clone(),
            key_value: outputs.api_key.clone(),
            plan_id: outputs.usage_plan_id.clone(),
        })
        .await
        .expect("Should delete key and plan");
    GatewayClient::from_context(&ctx)
        .delete_api(&outputs.api_id)
        .await
        .expect("Should delete HTTP API");
    LambdaClient::from_context(&ctx)
        .delete_handler_function(&names)
        .await
        .expect("Should delete function");
    TableClient::from_context(&ctx)
        .delete_estimates_table(&names)
        .await
        .expect("Should delete table");
    IamClient::from_context(&ctx)
        .delete_handler_role(&names)
        .await
        .expect("Should delete role");
}
