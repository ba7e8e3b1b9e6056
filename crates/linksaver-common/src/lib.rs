//! linksaver-common - Shared types and constants
//!
//! Types used by both the deployer and the Lambda handler, without any
//! AWS SDK dependencies to keep the handler artifact lean.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values and route keys
//! - [`estimate`]: The estimate record contract and validation
//! - [`names`]: Run-scoped resource naming and ARN reconstruction
//! - [`tags`]: AWS resource tag constants for discovery

pub mod defaults;
pub mod estimate;
pub mod names;
pub mod tags;

pub use estimate::{missing_fields, validate_estimate, EstimateError, REQUIRED_FIELDS};
pub use names::{ResourceNames, RunSuffix};
