//! AWS resource tag constants
//!
//! All linksaver-created AWS resources that support tagging carry these
//! tags so leftover resources from aborted runs can be found by hand.
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `linksaver:tool` | Static identifier ("linksaver") |
//! | `linksaver:run-suffix` | Run-scoped name suffix |
//! | `linksaver:created-at` | RFC 3339 creation timestamp |

/// Tag key for tool identification - all linksaver resources have this
pub const TAG_TOOL: &str = "linksaver:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "linksaver";

/// Tag key for the run suffix embedded in resource names
pub const TAG_RUN_SUFFIX: &str = "linksaver:run-suffix";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "linksaver:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}
