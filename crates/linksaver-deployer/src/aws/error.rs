//! AWS error classification
//!
//! The provisioners detect their benign-conflict cases through the SDK's
//! typed error accessors; this module classifies everything else for the
//! failure report the operator sees.

use thiserror::Error;

/// AWS error categories
#[derive(Debug, Error)]
pub enum AwsError {
    /// Target resource already exists (benign in create operations)
    #[error("Resource already exists")]
    AlreadyExists,

    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled)
    }
}

/// "Already exists" error codes across the services this tool touches
const ALREADY_EXISTS_CODES: &[&str] = &[
    "EntityAlreadyExists",       // IAM
    "ResourceInUseException",    // DynamoDB
    "ResourceConflictException", // Lambda
    "ConflictException",         // API Gateway
];

/// "Not found" error codes
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchEntity",              // IAM
    "ResourceNotFoundException", // DynamoDB, Lambda
    "NotFoundException",         // API Gateway
];

/// Throttling error codes
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists,
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Error details surfaced in the failure banner
#[derive(Debug)]
pub struct ErrorDetails {
    pub code: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Extract code, message, and a suggestion from an error chain.
///
/// AWS SDK operation errors carry their code in the Debug representation;
/// scanning it avoids downcasting through every operation type.
pub fn extract_error_details(error: &anyhow::Error) -> ErrorDetails {
    let debug_str = format!("{:?}", error);
    let code = extract_error_code(&debug_str);
    let suggestion = code.as_deref().and_then(suggestion_for_code);

    ErrorDetails {
        code,
        message: error.to_string(),
        suggestion,
    }
}

/// All known error codes, for extraction from debug strings
const ALL_KNOWN_CODES: &[&str] = &[
    // Already exists
    "EntityAlreadyExists",
    "ResourceInUseException",
    "ResourceConflictException",
    "ConflictException",
    // Not found
    "NoSuchEntity",
    "ResourceNotFoundException",
    "NotFoundException",
    // Throttling
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "Throttling",
    // Limits and access
    "LimitExceededException",
    "AccessDeniedException",
    "AccessDenied",
    "UnrecognizedClientException",
    "ExpiredTokenException",
    "InvalidParameterValueException",
    "MalformedPolicyDocument",
];

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    for code in ALL_KNOWN_CODES {
        if debug_str.contains(code) {
            return Some((*code).to_string());
        }
    }

    // Try to extract any code from a `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

/// Error code to user-facing suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "LimitExceededException",
        "Request a service limit increase via the AWS Service Quotas console.",
    ),
    (
        "AccessDeniedException",
        "The active credentials lack permission for this operation.",
    ),
    (
        "AccessDenied",
        "The active credentials lack permission for this operation.",
    ),
    (
        "UnrecognizedClientException",
        "Credentials were not recognized. Check AWS_PROFILE or your access keys.",
    ),
    (
        "ExpiredTokenException",
        "The session token has expired. Refresh your credentials.",
    ),
    (
        "MalformedPolicyDocument",
        "The generated policy document was rejected; report this as a bug.",
    ),
    (
        "ThrottlingException",
        "AWS API rate limit hit. Re-run the deployment in a moment.",
    ),
    (
        "TooManyRequestsException",
        "AWS API rate limit hit. Re-run the deployment in a moment.",
    ),
];

fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_codes() {
        for code in ALREADY_EXISTS_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                matches!(err, AwsError::AlreadyExists),
                "expected AlreadyExists for {code}"
            );
        }
    }

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                matches!(err, AwsError::NotFound { .. }),
                "expected NotFound for {code}"
            );
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_retryable(), "expected retryable for {code}");
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomethingNew"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn extract_known_codes_from_debug_string() {
        for code in ALL_KNOWN_CODES {
            let debug_str = format!("SdkError {{ code: Some(\"{code}\"), message: \"fail\" }}");
            assert!(
                extract_error_code(&debug_str).is_some(),
                "failed to extract from string containing {code}"
            );
        }
    }

    #[test]
    fn extract_code_from_code_field() {
        let debug_str = r#"SdkError { code: Some("SomeRandomCode"), message: "fail" }"#;
        assert_eq!(
            extract_error_code(debug_str).as_deref(),
            Some("SomeRandomCode")
        );
    }

    #[test]
    fn extract_none_from_unrelated_string() {
        assert!(extract_error_code("connection refused").is_none());
    }

    #[test]
    fn details_carry_suggestions() {
        let error = anyhow::anyhow!(r#"service error: code: Some("AccessDeniedException")"#);
        let details = extract_error_details(&error);
        assert_eq!(details.code.as_deref(), Some("AccessDeniedException"));
        assert!(details.suggestion.is_some());

        for (code, _) in SUGGESTIONS {
            assert!(suggestion_for_code(code).is_some());
        }
        assert!(suggestion_for_code("SomeUnknownCode").is_none());
    }
}
