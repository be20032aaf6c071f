//! Traffic Light Core Library
//!
//! The decision engine behind the multi-platform CI/CD "traffic light"
//! convention: several CI platforms share one repository of infrastructure
//! module pipelines, and each of them asks this engine whether it owns a
//! commit, which cloud it targets, which stages are eligible, and which
//! version to publish.
//!
//! The engine is pure: [`decide`] takes an [`InvocationContext`] and the
//! latest version tag and returns a [`Decision`]. Terraform, scanners, the
//! source-hosting API, and git pushes are external collaborators that act on
//! the decision (see [`ActionPlan`]).

pub mod actions;
pub mod cloud;
pub mod domain;
pub mod obs;
pub mod orchestrator;
pub mod ownership;
pub mod parser;
pub mod stage_gate;
pub mod telemetry;
pub mod version;

pub use domain::{
    approval_line, Action, ApprovalTags, CiTool, CloudProvider, CommitTags, Decision,
    DecisionError, DecisionStatus, GateReason, InvocationContext, Ownership, ParseEnumError,
    Policy, ReleasePullRequest, RepoPlatform, Stage, StageRule, StageSet, VersionBump,
};

pub use actions::{ActionPlan, ActionStep, DelegatedAction};
pub use cloud::resolve_cloud;
pub use orchestrator::{decide, input_digest};
pub use ownership::{resolve_ownership, should_run};
pub use parser::{parse, parse_approval};
pub use stage_gate::{gate, rules_for, GateOutcome};
pub use telemetry::init_tracing;
pub use version::{next_version, select_latest_tag, SemVer, VersionError};

/// Traffic light version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
