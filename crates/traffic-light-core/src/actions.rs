//! Delegated actions for eligible stages.
//!
//! The engine never runs anything. An [`ActionPlan`] names, in order, the
//! external steps a calling pipeline performs for a [`Decision`], with the
//! command line where one is platform-independent.

use serde::{Deserialize, Serialize};

use crate::domain::{Decision, Stage};

/// An external step performed by the calling pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DelegatedAction {
    /// terraform fmt -check -recursive
    TerraformFmt,

    /// terraform init -input=false -backend=false
    TerraformInit,

    /// terraform validate
    TerraformValidate,

    /// terraform plan -input=false
    TerraformPlan,

    /// checkov --directory . --quiet
    CheckovScan,

    /// Source-hosting API call using `Decision::release_pr`.
    CreatePullRequest,

    /// Platform-specific bot identity for tag commits.
    ConfigureGitIdentity,

    /// git tag <next_tag>
    CreateTag,

    /// git push origin <next_tag>
    PushTag,
}

impl DelegatedAction {
    /// Get the action name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            DelegatedAction::TerraformFmt => "terraform_fmt",
            DelegatedAction::TerraformInit => "terraform_init",
            DelegatedAction::TerraformValidate => "terraform_validate",
            DelegatedAction::TerraformPlan => "terraform_plan",
            DelegatedAction::CheckovScan => "checkov_scan",
            DelegatedAction::CreatePullRequest => "create_pull_request",
            DelegatedAction::ConfigureGitIdentity => "configure_git_identity",
            DelegatedAction::CreateTag => "create_tag",
            DelegatedAction::PushTag => "push_tag",
        }
    }

    /// Actions performed for `stage`, in order.
    pub fn for_stage(stage: Stage) -> &'static [DelegatedAction] {
        match stage {
            Stage::Plan => &[
                DelegatedAction::TerraformFmt,
                DelegatedAction::TerraformInit,
                DelegatedAction::TerraformValidate,
                DelegatedAction::TerraformPlan,
            ],
            Stage::Test => &[DelegatedAction::CheckovScan],
            Stage::CreatePr => &[DelegatedAction::CreatePullRequest],
            Stage::Publish => &[
                DelegatedAction::ConfigureGitIdentity,
                DelegatedAction::CreateTag,
                DelegatedAction::PushTag,
            ],
        }
    }

    /// Command line for this action, or `None` when it is an API call or
    /// platform-specific. `tag` is required for tag actions.
    pub fn command(&self, tag: Option<&str>) -> Option<Vec<String>> {
        let argv = |args: &[&str]| -> Option<Vec<String>> {
            Some(args.iter().map(|a| a.to_string()).collect())
        };
        match self {
            DelegatedAction::TerraformFmt => argv(&["terraform", "fmt", "-check", "-recursive"]),
            DelegatedAction::TerraformInit => {
                argv(&["terraform", "init", "-input=false", "-backend=false"])
            }
            DelegatedAction::TerraformValidate => argv(&["terraform", "validate"]),
            DelegatedAction::TerraformPlan => argv(&["terraform", "plan", "-input=false"]),
            DelegatedAction::CheckovScan => argv(&["checkov", "--directory", ".", "--quiet"]),
            DelegatedAction::CreatePullRequest | DelegatedAction::ConfigureGitIdentity => None,
            DelegatedAction::CreateTag => tag.and_then(|t| argv(&["git", "tag", t])),
            DelegatedAction::PushTag => tag.and_then(|t| argv(&["git", "push", "origin", t])),
        }
    }
}

/// One planned step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionStep {
    pub stage: Stage,
    pub action: DelegatedAction,
    pub command: Option<Vec<String>>,
}

/// Ordered external steps for a decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionPlan {
    pub steps: Vec<ActionStep>,
}

impl ActionPlan {
    /// Plan the eligible stages of `decision`. Fatal outcomes have already
    /// cleared the stages they block, so the plan always agrees with
    /// `decision.stages`.
    pub fn for_decision(decision: &Decision) -> Self {
        let tag = decision.next_tag();
        let steps = Stage::ALL
            .iter()
            .filter(|stage| decision.stages.get(**stage))
            .flat_map(|stage| {
                DelegatedAction::for_stage(*stage)
                    .iter()
                    .map(|action| ActionStep {
                        stage: *stage,
                        action: *action,
                        command: action.command(tag.as_deref()),
                    })
            })
            .collect();
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Comma-separated action names, for flat output.
    pub fn names(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.action.name())
            .collect::<Vec<_>>()
            .join(",")
    }
}
