//! Domain models for the traffic light engine.
//!
//! Canonical definitions for the core entities:
//! - `CommitTags` / `ApprovalTags`: structured parse of a message
//! - `InvocationContext`: what the calling platform supplies
//! - `Decision`: the record the calling platform acts on
//! - `ReleasePullRequest`: content for the delegated PR creation

pub mod context;
pub mod decision;
pub mod error;
pub mod release;
pub mod tags;

// Re-export main types and errors
pub use context::{InvocationContext, Policy};
pub use decision::{
    Decision, DecisionStatus, GateReason, Ownership, Stage, StageRule, StageSet,
};
pub use error::{DecisionError, ParseEnumError};
pub use release::{approval_line, ReleasePullRequest};
pub use tags::{Action, ApprovalTags, CiTool, CloudProvider, CommitTags, RepoPlatform, VersionBump};
