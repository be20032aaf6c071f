//! Per-invocation input supplied by the calling CI platform.

use serde::{Deserialize, Serialize};

use super::tags::{CiTool, CloudProvider};

/// Git ref prefix stripped before comparing branch names.
const HEADS_PREFIX: &str = "refs/heads/";

/// Configured policy shared by every platform evaluating the same repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Platform that owns untagged commits when
    /// [`Policy::treat_untagged_as_default`] is set.
    pub default_ci_tool: Option<CiTool>,
    /// Route messages without a CI tool tag to [`Policy::default_ci_tool`].
    pub treat_untagged_as_default: bool,
    /// Branch names treated as the release branch.
    pub main_branches: Vec<String>,
    /// Publish additionally requires the literal `[APPROVED]` token in the
    /// merge message. Off by default: an approval naming this tool suffices.
    pub require_approved_token: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            default_ci_tool: None,
            treat_untagged_as_default: false,
            main_branches: vec!["main".to_string(), "master".to_string()],
            require_approved_token: false,
        }
    }
}

impl Policy {
    /// Whether `branch_ref` (bare name or `refs/heads/...`) is a main branch.
    pub fn is_main_branch(&self, branch_ref: &str) -> bool {
        let name = branch_ref.trim();
        let name = name.strip_prefix(HEADS_PREFIX).unwrap_or(name);
        self.main_branches.iter().any(|b| b == name)
    }
}

/// Everything the engine needs to know about one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Identity of the platform running this invocation.
    pub ci_tool: CiTool,
    /// Fallback when the commit carries no cloud tag.
    pub default_cloud_provider: Option<CloudProvider>,
    /// Branch being built (`main`, `feature/x`, `refs/heads/main`, ...).
    pub branch_ref: String,
    /// Message of the triggering commit.
    pub commit_message: String,
    /// Merge/approval message; only meaningful on main-branch runs.
    pub merge_message: Option<String>,
    /// Outcome of plan/test when re-evaluating after they ran.
    pub prior_stages_succeeded: bool,
    pub policy: Policy,
}

impl InvocationContext {
    /// Create a context with the default policy, no default cloud, and no
    /// merge message.
    pub fn new(
        ci_tool: CiTool,
        branch_ref: impl Into<String>,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            ci_tool,
            default_cloud_provider: None,
            branch_ref: branch_ref.into(),
            commit_message: commit_message.into(),
            merge_message: None,
            prior_stages_succeeded: true,
            policy: Policy::default(),
        }
    }

    pub fn with_default_cloud(mut self, cloud: CloudProvider) -> Self {
        self.default_cloud_provider = Some(cloud);
        self
    }

    pub fn with_merge_message(mut self, message: impl Into<String>) -> Self {
        self.merge_message = Some(message.into());
        self
    }

    pub fn with_prior_stages_succeeded(mut self, succeeded: bool) -> Self {
        self.prior_stages_succeeded = succeeded;
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether this invocation runs on a main branch under the configured policy.
    pub fn on_main_branch(&self) -> bool {
        self.policy.is_main_branch(&self.branch_ref)
    }
}
