//! Run-scoped resource naming
//!
//! Every resource created by a deployment embeds one random suffix so
//! repeated runs do not collide. The IAM policy's table ARN must match the
//! table name exactly or the attached policy denies all table operations,
//! so all names and reconstructed ARNs derive from a single [`ResourceNames`]
//! value built once per run.

use rand::Rng;
use std::fmt;

/// Characters used for run suffixes (lowercase alphanumeric)
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the run suffix
const SUFFIX_LEN: usize = 6;

/// A run-scoped random suffix embedded in every resource name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSuffix(String);

impl RunSuffix {
    /// Generate a fresh random suffix.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
            .collect();
        RunSuffix(suffix)
    }

    /// Reuse a suffix from a previous run (for re-running against the same
    /// resource set).
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.len() != SUFFIX_LEN || !s.bytes().all(|b| SUFFIX_CHARSET.contains(&b)) {
            return Err(format!(
                "suffix must be {SUFFIX_LEN} lowercase alphanumeric characters, got '{s}'"
            ));
        }
        Ok(RunSuffix(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names for every resource in one deployment, derived from a base name
/// and a run suffix.
#[derive(Debug, Clone)]
pub struct ResourceNames {
    base: String,
    suffix: RunSuffix,
}

impl ResourceNames {
    pub fn new(base: &str, suffix: RunSuffix) -> Self {
        Self {
            base: base.to_string(),
            suffix,
        }
    }

    pub fn suffix(&self) -> &RunSuffix {
        &self.suffix
    }

    pub fn table(&self) -> String {
        format!("{}-estimates-{}", self.base, self.suffix)
    }

    pub fn role(&self) -> String {
        format!("{}-handler-role-{}", self.base, self.suffix)
    }

    pub fn policy(&self) -> String {
        format!("{}-table-policy-{}", self.base, self.suffix)
    }

    pub fn function(&self) -> String {
        format!("{}-handler-{}", self.base, self.suffix)
    }

    pub fn api(&self) -> String {
        format!("{}-api-{}", self.base, self.suffix)
    }

    pub fn api_key(&self) -> String {
        format!("{}-key-{}", self.base, self.suffix)
    }

    pub fn usage_plan(&self) -> String {
        format!("{}-usage-plan-{}", self.base, self.suffix)
    }

    /// Statement id for the gateway's invoke permission on the function
    pub fn invoke_statement_id(&self) -> String {
        format!("apigateway-invoke-{}", self.suffix)
    }

    /// Reconstruct the table ARN without a control-plane call.
    pub fn table_arn(&self, region: &str, account: &str) -> String {
        format!(
            "arn:aws:dynamodb:{region}:{account}:table/{}",
            self.table()
        )
    }

    /// Reconstruct the role ARN without a control-plane call.
    pub fn role_arn(&self, account: &str) -> String {
        format!("arn:aws:iam::{account}:role/{}", self.role())
    }

    /// Reconstruct the function ARN without a control-plane call.
    pub fn function_arn(&self, region: &str, account: &str) -> String {
        format!(
            "arn:aws:lambda:{region}:{account}:function:{}",
            self.function()
        )
    }

    /// Source ARN granting the gateway invoke rights for any route and stage.
    pub fn execute_api_arn(&self, region: &str, account: &str, api_id: &str) -> String {
        format!("arn:aws:execute-api:{region}:{account}:{api_id}/*/*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> ResourceNames {
        ResourceNames::new("linksaver", RunSuffix::parse("ab12cd").unwrap())
    }

    #[test]
    fn generated_suffix_is_well_formed() {
        let suffix = RunSuffix::generate();
        assert_eq!(suffix.as_str().len(), SUFFIX_LEN);
        assert!(suffix
            .as_str()
            .bytes()
            .all(|b| SUFFIX_CHARSET.contains(&b)));
        // Parsing its own output must succeed
        assert_eq!(RunSuffix::parse(suffix.as_str()).unwrap(), suffix);
    }

    #[test]
    fn parse_rejects_bad_suffixes() {
        assert!(RunSuffix::parse("short").is_err());
        assert!(RunSuffix::parse("toolong1").is_err());
        assert!(RunSuffix::parse("UPPER1").is_err());
        assert!(RunSuffix::parse("ab-12c").is_err());
    }

    #[test]
    fn names_embed_the_suffix() {
        let n = names();
        for name in [
            n.table(),
            n.role(),
            n.policy(),
            n.function(),
            n.api(),
            n.api_key(),
            n.usage_plan(),
            n.invoke_statement_id(),
        ] {
            assert!(name.ends_with("ab12cd"), "missing suffix in {name}");
        }
    }

    #[test]
    fn table_arn_matches_table_name() {
        let n = names();
        let arn = n.table_arn("us-east-2", "123456789012");
        assert_eq!(
            arn,
            format!(
                "arn:aws:dynamodb:us-east-2:123456789012:table/{}",
                n.table()
            )
        );
    }

    #[test]
    fn reconstructed_arns() {
        let n = names();
        assert_eq!(
            n.role_arn("123456789012"),
            "arn:aws:iam::123456789012:role/linksaver-handler-role-ab12cd"
        );
        assert_eq!(
            n.function_arn("us-east-2", "123456789012"),
            "arn:aws:lambda:us-east-2:123456789012:function:linksaver-handler-ab12cd"
        );
        assert_eq!(
            n.execute_api_arn("us-east-2", "123456789012", "api123"),
            "arn:aws:execute-api:us-east-2:123456789012:api123/*/*"
        );
    }
}
