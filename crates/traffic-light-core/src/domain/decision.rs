//! The decision record produced once per invocation.
//!
//! A [`Decision`] is immutable output: the engine never persists it, and two
//! invocations with identical inputs produce identical records (including
//! [`Decision::input_digest`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::DecisionError;
use super::release::ReleasePullRequest;
use super::tags::{CiTool, CloudProvider, VersionBump};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// A pipeline stage whose eligibility the engine computes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plan,
    Test,
    CreatePr,
    Publish,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Plan, Stage::Test, Stage::CreatePr, Stage::Publish];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Test => "test",
            Stage::CreatePr => "create_pr",
            Stage::Publish => "publish",
        }
    }
}

/// Eligibility of each stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageSet {
    pub plan: bool,
    pub test: bool,
    pub create_pr: bool,
    pub publish: bool,
}

impl StageSet {
    /// No stage eligible.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, stage: Stage) -> bool {
        match stage {
            Stage::Plan => self.plan,
            Stage::Test => self.test,
            Stage::CreatePr => self.create_pr,
            Stage::Publish => self.publish,
        }
    }

    pub fn set(&mut self, stage: Stage, eligible: bool) {
        match stage {
            Stage::Plan => self.plan = eligible,
            Stage::Test => self.test = eligible,
            Stage::CreatePr => self.create_pr = eligible,
            Stage::Publish => self.publish = eligible,
        }
    }

    /// Whether any stage is eligible.
    pub fn any(&self) -> bool {
        Stage::ALL.iter().any(|s| self.get(*s))
    }
}

// ---------------------------------------------------------------------------
// Explanations
// ---------------------------------------------------------------------------

/// A single condition a stage depends on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageRule {
    /// This platform owns the commit.
    OwnerMatched,
    /// The commit carries `[release]`.
    ReleaseAction,
    /// The branch is not a main branch.
    NotMainBranch,
    /// Plan and test succeeded earlier in this pipeline.
    PriorStagesSucceeded,
    /// The branch is a main branch.
    MainBranch,
    /// The merge message carries `[APPROVED]`.
    ApprovedToken,
    /// The merge message's CI tool tag names this platform.
    ApprovalForThisTool,
    /// A cloud provider came from a tag or the configured default. Recorded
    /// only when it fails, for every stage it clears.
    CloudResolved,
    /// The latest release tag could be bumped. Recorded only when it fails.
    VersionPlanned,
}

/// Outcome of one rule for one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateReason {
    pub stage: Stage,
    pub rule: StageRule,
    pub satisfied: bool,
    /// Human-readable explanation.
    pub detail: String,
}

/// Why this platform does or does not own the commit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ownership {
    /// The commit's CI tool tag names this platform.
    Tagged,
    /// The commit's CI tool tag names another platform.
    TaggedForOther { ci_tool: CiTool },
    /// Untagged commit routed to this platform as the configured default.
    UntaggedDefault,
    /// Untagged commit routed to a different default platform.
    UntaggedOtherDefault { default_ci_tool: CiTool },
    /// Untagged commit, default routing enabled but no default configured.
    UntaggedNoDefault,
    /// Untagged commit, default routing disabled.
    Untagged,
}

impl Ownership {
    /// Whether this verdict lets the invocation proceed.
    pub fn owned(&self) -> bool {
        matches!(self, Ownership::Tagged | Ownership::UntaggedDefault)
    }

    pub fn describe(&self, ci_tool: CiTool) -> String {
        match self {
            Ownership::Tagged => format!("commit is tagged for {}", ci_tool),
            Ownership::TaggedForOther { ci_tool: other } => {
                format!("commit is tagged for {}, not {}", other, ci_tool)
            }
            Ownership::UntaggedDefault => {
                format!("untagged commit routed to default CI tool {}", ci_tool)
            }
            Ownership::UntaggedOtherDefault { default_ci_tool } => format!(
                "untagged commit routed to default CI tool {}, not {}",
                default_ci_tool, ci_tool
            ),
            Ownership::UntaggedNoDefault => {
                "untagged commit and no default CI tool configured".to_string()
            }
            Ownership::Untagged => "commit carries no CI tool tag".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Overall state of a decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// At least one stage is eligible.
    Proceed,
    /// Nothing to do; see [`Decision::reasons`].
    Skip,
    /// A configuration or tag-history error; the pipeline should alert.
    Fatal,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Proceed => "proceed",
            DecisionStatus::Skip => "skip",
            DecisionStatus::Fatal => "fatal",
        }
    }
}

/// The machine-readable record a calling pipeline acts on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub status: DecisionStatus,
    /// Whether plan/test run for this platform.
    pub should_run: bool,
    /// Platform this decision was computed for.
    pub ci_tool: CiTool,
    pub cloud_provider: Option<CloudProvider>,
    pub stages: StageSet,
    pub version_bump: Option<VersionBump>,
    /// Next version without the `v` prefix (e.g. `1.3.0`).
    pub next_version: Option<String>,
    pub ownership: Ownership,
    /// One entry per evaluated stage rule.
    pub reasons: Vec<GateReason>,
    /// Release PR content when `create_pr` is eligible.
    pub release_pr: Option<ReleasePullRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognized_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_conflicts: Vec<String>,
    pub error: Option<DecisionError>,
    /// SHA-256 (hex) of the normalized inputs.
    pub input_digest: String,
}

impl Decision {
    pub fn is_fatal(&self) -> bool {
        self.status == DecisionStatus::Fatal
    }

    /// Tag to create and push on publish (e.g. `v1.3.0`).
    pub fn next_tag(&self) -> Option<String> {
        self.next_version.as_ref().map(|v| format!("v{}", v))
    }

    /// Rules that blocked `stage`.
    pub fn blocking_reasons(&self, stage: Stage) -> impl Iterator<Item = &GateReason> {
        self.reasons
            .iter()
            .filter(move |r| r.stage == stage && !r.satisfied)
    }

    /// One-line explanation of the overall outcome.
    pub fn summary(&self) -> String {
        if let Some(err) = &self.error {
            return format!("fatal: {}", err);
        }
        let eligible: Vec<&str> = Stage::ALL
            .iter()
            .filter(|s| self.stages.get(**s))
            .map(|s| s.name())
            .collect();
        if eligible.is_empty() {
            format!("skip: {}", self.ownership.describe(self.ci_tool))
        } else {
            format!("proceed: {}", eligible.join(", "))
        }
    }

    /// Flat key/value view for pipeline conditionals. Absent values map to
    /// the empty string; booleans to `true`/`false`.
    pub fn to_flat_map(&self) -> BTreeMap<&'static str, String> {
        let opt = |v: Option<String>| v.unwrap_or_default();
        let mut map = BTreeMap::new();
        map.insert("status", self.status.as_str().to_string());
        map.insert("should_run", self.should_run.to_string());
        map.insert("ci_tool", self.ci_tool.to_string());
        map.insert(
            "cloud_provider",
            opt(self.cloud_provider.map(|c| c.to_string())),
        );
        for stage in Stage::ALL {
            map.insert(stage.name(), self.stages.get(stage).to_string());
        }
        map.insert(
            "version_bump",
            opt(self.version_bump.map(|b| b.to_string())),
        );
        map.insert("next_version", opt(self.next_version.clone()));
        map.insert("next_tag", opt(self.next_tag()));
        map.insert(
            "pr_title",
            opt(self.release_pr.as_ref().map(|pr| pr.title.clone())),
        );
        map.insert(
            "pr_body",
            opt(self.release_pr.as_ref().map(|pr| pr.body.clone())),
        );
        map.insert(
            "error",
            opt(self.error.as_ref().map(|e| e.code().to_string())),
        );
        map.insert(
            "error_message",
            opt(self.error.as_ref().map(|e| e.to_string())),
        );
        map.insert("summary", self.summary());
        map.insert("input_digest", self.input_digest.clone());
        map
    }
}
