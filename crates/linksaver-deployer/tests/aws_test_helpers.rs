//! Shared utilities for AWS integration tests
//!
//! Provides region detection and per-test resource names.

use linksaver_common::names::{ResourceNames, RunSuffix};

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-2
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-2".to_string())
}

/// Generate a fresh set of resource names for one test.
///
/// Each test gets its own random suffix so resources never collide across
/// test runs or with real deployments.
pub fn test_names() -> ResourceNames {
    ResourceNames::new("linksaver-test", RunSuffix::generate())
}
