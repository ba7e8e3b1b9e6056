//! AWS client modules for the deployer
//!
//! Thin wrappers around the AWS SDK clients, one per provisioning stage:
//! - IAM: execution role and table policy
//! - DynamoDB: the estimates table
//! - Lambda: the handler function
//! - API Gateway v2: the routed HTTP front door
//! - API Gateway (REST control plane): API keys and usage plans
//! - STS: account ID lookup

pub mod account;
pub mod context;
pub mod dynamodb;
pub mod error;
pub mod gateway;
pub mod iam;
pub mod lambda;
pub mod provision;
pub mod usage_plan;

pub use account::{get_current_account_id, AccountId};
pub use context::AwsContext;
pub use dynamodb::TableClient;
pub use error::{classify_aws_error, extract_error_details, AwsError, ErrorDetails};
pub use gateway::{GatewayClient, HttpApi};
pub use iam::IamClient;
pub use lambda::{package_artifact, LambdaClient};
pub use provision::Provisioned;
pub use usage_plan::{AccessClient, ApiAccess};
