//! Non-fatal diagnostics raised while loading options and policies.

/// A problem found in user supplied configuration.
///
/// None of these stop sanitizing: the offending value is ignored and the
/// default is kept.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigWarning {
    /// Unknown option, or an option value of the wrong shape.
    #[error("invalid option {option}: {reason}")]
    InvalidConfiguration {
        /// The option key as supplied.
        option: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A policy entry with an unsupported value type.
    #[error("malformed policy entry {tag}: {reason}")]
    MalformedPolicy {
        /// The tag key of the entry.
        tag: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ConfigWarning {
    pub(crate) fn invalid_option(option: &str, reason: impl Into<String>) -> Self {
        ConfigWarning::InvalidConfiguration {
            option: option.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_policy(tag: &str, reason: impl Into<String>) -> Self {
        ConfigWarning::MalformedPolicy {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

/// Describe the json type of a value for diagnostics.
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let warning = ConfigWarning::invalid_option("tagOpen", "expected a string, got number");
        assert_eq!(
            warning.to_string(),
            "invalid option tagOpen: expected a string, got number"
        );

        let warning = ConfigWarning::malformed_policy("a", "unsupported attribute value number");
        assert_eq!(
            warning.to_string(),
            "malformed policy entry a: unsupported attribute value number"
        );
    }

    #[test]
    fn test_json_type() {
        assert_eq!(json_type(&serde_json::json!(null)), "null");
        assert_eq!(json_type(&serde_json::json!([1])), "array");
        assert_eq!(json_type(&serde_json::json!({"a": 1})), "object");
    }
}
