//! Release pull request content handed to the PR-creating collaborator.

use serde::{Deserialize, Serialize};

use super::tags::{CiTool, CloudProvider, VersionBump};

/// Title and body of the release pull request opened from a feature branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleasePullRequest {
    pub title: String,
    pub body: String,
}

impl ReleasePullRequest {
    /// Render the release PR for `cloud`, instructing the reviewer how to
    /// approve it so that `ci_tool` publishes on merge.
    pub fn render(cloud: CloudProvider, ci_tool: CiTool) -> Self {
        Self {
            title: format!("Release: {} module updates", cloud),
            body: format!(
                "Approve with: {}",
                approval_line(VersionBump::Patch, ci_tool)
            ),
        }
    }
}

/// The approval prefix a merge message must start with, e.g.
/// `[APPROVED] [PATCH] [gh_actions]`.
pub fn approval_line(bump: VersionBump, ci_tool: CiTool) -> String {
    format!(
        "[APPROVED] [{}] [{}]",
        bump.as_str().to_ascii_uppercase(),
        ci_tool
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_pr_template() {
        let pr = ReleasePullRequest::render(CloudProvider::Aws, CiTool::GhActions);
        assert_eq!(pr.title, "Release: aws module updates");
        assert_eq!(pr.body, "Approve with: [APPROVED] [PATCH] [gh_actions]");
    }

    #[test]
    fn test_approval_line_uppercases_bump() {
        assert_eq!(
            approval_line(VersionBump::Major, CiTool::Ado),
            "[APPROVED] [MAJOR] [ado]"
        );
    }
}
