//! Domain-level error taxonomy for the traffic light engine.
//!
//! Only two conditions are fatal to an invocation: an unresolvable cloud
//! provider and a latest version tag that is not a numeric triple. Both are
//! carried inside a [`crate::Decision`] rather than returned as `Err`, so the
//! calling pipeline can render a distinct failure status instead of crashing.
//! Skips (no owner matched, approval missing) are not errors at all.

use serde::{Deserialize, Serialize};

/// A vocabulary token (cloud provider, CI tool, ...) did not match any known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind}: '{value}'")]
pub struct ParseEnumError {
    /// Vocabulary the value was parsed against (e.g. `"cloud provider"`).
    pub kind: &'static str,
    /// The raw input.
    pub value: String,
}

/// Fatal decision states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionError {
    #[error("no cloud provider tag in the commit message and no default cloud provider configured")]
    CloudUnresolved,

    #[error("latest version tag '{tag}' is not a vMAJOR.MINOR.PATCH triple")]
    MalformedTag { tag: String },

    #[error("version component overflow while bumping '{version}'")]
    VersionOverflow { version: String },
}

impl DecisionError {
    /// Stable machine-readable code for flat key/value output.
    pub fn code(&self) -> &'static str {
        match self {
            DecisionError::CloudUnresolved => "cloud_unresolved",
            DecisionError::MalformedTag { .. } => "malformed_tag",
            DecisionError::VersionOverflow { .. } => "version_overflow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enum_error_display() {
        let err = ParseEnumError {
            kind: "cloud provider",
            value: "gcp".to_string(),
        };
        assert_eq!(err.to_string(), "unrecognized cloud provider: 'gcp'");
    }

    #[test]
    fn test_decision_error_codes_are_distinct() {
        let errors = [
            DecisionError::CloudUnresolved,
            DecisionError::MalformedTag {
                tag: "vX".to_string(),
            },
            DecisionError::VersionOverflow {
                version: "1.2.3".to_string(),
            },
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_malformed_tag_message_names_tag() {
        let err = DecisionError::MalformedTag {
            tag: "release-7".to_string(),
        };
        assert!(err.to_string().contains("release-7"));
    }

    #[test]
    fn test_decision_error_serializes_with_kind() {
        let json = serde_json::to_value(DecisionError::CloudUnresolved).expect("serialize");
        assert_eq!(json["kind"], "cloud_unresolved");
    }
}
