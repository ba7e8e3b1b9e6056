//! linksaver-deployer - provisions the serverless estimates backend
//!
//! A linear orchestrator that creates, in order: an IAM execution role with
//! a table-scoped policy, a DynamoDB table, the handler Lambda function, an
//! HTTP API gateway with key-protected routes, and an API key bound to a
//! usage plan. Each stage passes its identifier to the next; "already
//! exists" is a distinct outcome, not a failure.

pub mod aws;
pub mod config;
pub mod orchestrator;
pub mod wait;
