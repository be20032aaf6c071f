//! Routing vocabularies and the structured result of parsing a message.
//!
//! Every vocabulary parses case-insensitively and treats `-` and `_` as the
//! same character, so `[GH-Actions]` and `[gh_actions]` name the same tool.

use serde::{Deserialize, Serialize};

use super::error::ParseEnumError;

/// Lowercase, trim, and fold `-`/whitespace into `_`.
pub(crate) fn normalize_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' | '\t' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Macro for closed, case-insensitive vocabularies.
// Generates: enum, ALL, as_str(), FromStr, Display, and string serde.
// ---------------------------------------------------------------------------
macro_rules! vocabulary {
    (
        $(#[$attr:meta])*
        $name:ident ($kind:literal) {
            $(
                $(#[$vattr:meta])*
                $variant:ident => $canonical:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vattr])* $variant, )+
        }

        impl $name {
            /// Every value of this vocabulary, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical lowercase spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $canonical, )+
                }
            }

            pub(crate) fn from_normalized(token: &str) -> Option<Self> {
                match token {
                    $( $canonical $(| $alias)* => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_normalized(&normalize_token(s)).ok_or_else(|| ParseEnumError {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

vocabulary! {
    /// Source-hosting platform the module repository lives on.
    RepoPlatform ("repository platform") {
        Github => "github",
        Gitlab => "gitlab",
        Bitbucket => "bitbucket",
        AzureRepos => "azure_repos" | "azure_devops",
        CodeCommit => "codecommit" | "aws_codecommit",
    }
}

vocabulary! {
    /// Target cloud provider for the infrastructure module.
    CloudProvider ("cloud provider") {
        Azure => "azure",
        Aws => "aws",
        Civo => "civo",
        Oci => "oci",
    }
}

vocabulary! {
    /// A CI platform participating in the traffic light convention.
    CiTool ("CI tool") {
        /// Azure DevOps Pipelines.
        Ado => "ado" | "azure_pipelines",
        /// GitHub Actions.
        GhActions => "gh_actions" | "github_actions",
        /// AWS CodePipeline.
        AwsPipeline => "aws_pipeline" | "codepipeline",
        /// OCI DevOps build pipelines.
        OciPipeline => "oci_pipeline",
    }
}

vocabulary! {
    /// What the commit author asks the owning pipeline to do.
    Action ("action") {
        Build => "build",
        Release => "release",
    }
}

vocabulary! {
    /// Semantic version component to increment on publish.
    VersionBump ("version bump") {
        Major => "major",
        Minor => "minor",
        Patch => "patch",
    }
}

impl Default for VersionBump {
    fn default() -> Self {
        VersionBump::Patch
    }
}

// ---------------------------------------------------------------------------
// Parse results
// ---------------------------------------------------------------------------

/// Tags parsed from an approval message: `[APPROVED] [BUMP] [ci-tool] <text>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTags {
    /// `true` only when the literal `[APPROVED]` token is present.
    pub approved: bool,
    /// Requested bump; `patch` when absent or unrecognized.
    pub bump: VersionBump,
    /// CI tool the approval is addressed to.
    pub ci_tool: Option<CiTool>,
}

/// Routing tags parsed from one commit message.
///
/// At most one value per category. The first occurrence of a category wins;
/// later tags of the same category are listed in [`CommitTags::conflicts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTags {
    pub repo_platform: Option<RepoPlatform>,
    pub cloud_provider: Option<CloudProvider>,
    pub ci_tool: Option<CiTool>,
    pub action: Option<Action>,
    /// Present when the message carries the `[APPROVED]` token.
    pub approval: Option<ApprovalTags>,
    /// Bracketed tokens that matched no vocabulary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
    /// Tags ignored because their category was already filled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
}

impl CommitTags {
    /// `true` when no routing tag at all was recognized.
    pub fn is_untagged(&self) -> bool {
        self.repo_platform.is_none()
            && self.cloud_provider.is_none()
            && self.ci_tool.is_none()
            && self.action.is_none()
    }
}
