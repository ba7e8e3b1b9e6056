//! Default configuration values shared between the deployer and handler
//!
//! These constants keep the control-plane setup and the handler's runtime
//! expectations in one place.

/// Default base name for all provisioned resources
pub const DEFAULT_BASE_NAME: &str = "linksaver";

/// Environment variable the handler reads the table name from
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";

/// DynamoDB partition key attribute
pub const PARTITION_KEY: &str = "id";

/// Handler timeout in seconds
pub const HANDLER_TIMEOUT_SECS: i32 = 15;

/// Default reserved concurrency cap for the handler function
pub const DEFAULT_RESERVED_CONCURRENCY: i32 = 2;

/// Usage plan steady-state rate limit (requests per second)
pub const THROTTLE_RATE_PER_SEC: f64 = 10.0;

/// Usage plan burst limit
pub const THROTTLE_BURST: i32 = 5;

/// Usage plan monthly request quota
pub const MONTHLY_QUOTA: i32 = 5000;

/// Resource path served by the gateway
pub const ESTIMATES_PATH: &str = "/estimates";

/// Route keys bound to the handler integration, all requiring an API key
pub const ROUTE_KEYS: [&str; 4] = [
    "GET /estimates",
    "POST /estimates",
    "DELETE /estimates",
    "DELETE /estimates/{id}",
];

/// DynamoDB batch-write limit per request
pub const BATCH_WRITE_CHUNK: usize = 25;
