//! Structured observability hooks for the decision sequence.
//!
//! This module provides:
//! - An invocation-scoped tracing span via the `DecisionSpan` RAII guard
//! - Emission functions for each step: tags parsed, ownership resolved,
//!   stages gated, version planned, decision produced
//!
//! Events carry an `event = "..."` field so log pipelines can filter on the
//! step without parsing messages. Emission never affects the decision.

use tracing::{debug, info, warn};

use crate::domain::{CiTool, CommitTags, Decision, Ownership, StageSet};

/// RAII guard that enters a span tagged with the platform and branch for the
/// duration of one `decide` call.
pub struct DecisionSpan {
    _span: tracing::span::EnteredSpan,
}

impl DecisionSpan {
    pub fn enter(ci_tool: CiTool, branch_ref: &str) -> Self {
        let span = tracing::info_span!("traffic_light.decide", ci_tool = %ci_tool, branch = %branch_ref);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: message parsed into routing tags.
pub fn emit_tags_parsed(tags: &CommitTags) {
    debug!(
        event = "tags.parsed",
        repo = ?tags.repo_platform,
        cloud = ?tags.cloud_provider,
        ci_tool = ?tags.ci_tool,
        action = ?tags.action,
        untagged = tags.is_untagged(),
    );
    if !tags.unrecognized.is_empty() {
        debug!(event = "tags.unrecognized", tokens = ?tags.unrecognized);
    }
    if !tags.conflicts.is_empty() {
        warn!(event = "tags.conflict", ignored = ?tags.conflicts);
    }
}

/// Emit event: ownership verdict for this platform.
pub fn emit_ownership_resolved(ci_tool: CiTool, ownership: &Ownership) {
    info!(
        event = "ownership.resolved",
        owned = ownership.owned(),
        reason = %ownership.describe(ci_tool),
    );
}

/// Emit event: stage eligibility computed.
pub fn emit_stage_gated(stages: &StageSet) {
    info!(
        event = "stages.gated",
        plan = stages.plan,
        test = stages.test,
        create_pr = stages.create_pr,
        publish = stages.publish,
    );
}

/// Emit event: next version computed for publish.
pub fn emit_version_planned(latest_tag: Option<&str>, next_version: &str) {
    info!(
        event = "version.planned",
        latest_tag = latest_tag.unwrap_or("<none>"),
        next_version = %next_version,
    );
}

/// Emit event: final decision. Fatal decisions are logged at error level.
pub fn emit_decision(decision: &Decision) {
    match &decision.error {
        Some(err) => tracing::error!(
            event = "decision.fatal",
            error = %err,
            input_digest = %decision.input_digest,
        ),
        None => info!(
            event = "decision.made",
            status = decision.status.as_str(),
            summary = %decision.summary(),
            input_digest = %decision.input_digest,
        ),
    }
}
