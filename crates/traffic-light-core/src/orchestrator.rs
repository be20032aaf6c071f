//! Decision orchestration: the single entry point callers use.
//!
//! [`decide`] runs parse → ownership → cloud → stage gate → version plan once,
//! in that order, and folds every outcome (including fatal ones) into a
//! [`Decision`]. It is deterministic and side-effect free apart from tracing
//! events.

use sha2::{Digest, Sha256};

use crate::cloud::resolve_cloud;
use crate::domain::{
    Decision, DecisionError, DecisionStatus, GateReason, InvocationContext, ReleasePullRequest,
    Stage, StageRule, StageSet,
};
use crate::obs;
use crate::parser::parse;
use crate::stage_gate::gate;
use crate::version::next_version;

/// Compute the decision for one invocation.
///
/// `latest_tag` is the newest `v*` tag from the external tag listing (see
/// [`crate::select_latest_tag`]); `None` means no release exists yet.
pub fn decide(ctx: &InvocationContext, latest_tag: Option<&str>) -> Decision {
    let _span = obs::DecisionSpan::enter(ctx.ci_tool, &ctx.branch_ref);

    let tags = parse(&ctx.commit_message);
    obs::emit_tags_parsed(&tags);

    let outcome = gate(&tags, ctx, ctx.prior_stages_succeeded);
    obs::emit_ownership_resolved(ctx.ci_tool, &outcome.ownership);

    let cloud = resolve_cloud(&tags, ctx);
    let mut stages = outcome.stages;
    let mut should_run = outcome.ownership.owned();
    let mut error = None;
    let mut version_bump = None;
    let mut planned_version = None;
    let mut reasons = outcome.reasons;

    if cloud.is_none() {
        // Fatal to the whole invocation.
        error = Some(DecisionError::CloudUnresolved);
        stages = StageSet::none();
        should_run = false;
        reasons.extend(Stage::ALL.iter().map(|stage| GateReason {
            stage: *stage,
            rule: StageRule::CloudResolved,
            satisfied: false,
            detail: "no cloud tag and no default cloud provider".to_string(),
        }));
    } else if stages.publish {
        match next_version(latest_tag, &outcome.approval) {
            Ok(version) => {
                obs::emit_version_planned(latest_tag, &version);
                version_bump = Some(outcome.approval.bump);
                planned_version = Some(version);
            }
            Err(err) => {
                // Fatal to publish only; plan/test eligibility stands.
                reasons.push(GateReason {
                    stage: Stage::Publish,
                    rule: StageRule::VersionPlanned,
                    satisfied: false,
                    detail: err.to_string(),
                });
                error = Some(err.into());
                stages.publish = false;
            }
        }
    }
    obs::emit_stage_gated(&stages);

    let release_pr = match cloud {
        Some(c) if stages.create_pr => Some(ReleasePullRequest::render(c, ctx.ci_tool)),
        _ => None,
    };

    let status = if error.is_some() {
        DecisionStatus::Fatal
    } else if stages.any() {
        DecisionStatus::Proceed
    } else {
        DecisionStatus::Skip
    };

    let decision = Decision {
        status,
        should_run,
        ci_tool: ctx.ci_tool,
        cloud_provider: cloud,
        stages,
        version_bump,
        next_version: planned_version,
        ownership: outcome.ownership,
        reasons,
        release_pr,
        unrecognized_tags: tags.unrecognized,
        tag_conflicts: tags.conflicts,
        error,
        input_digest: input_digest(ctx, latest_tag),
    };
    obs::emit_decision(&decision);
    decision
}

/// SHA-256 over the normalized inputs, NUL-separated so field boundaries
/// cannot shift.
pub fn input_digest(ctx: &InvocationContext, latest_tag: Option<&str>) -> String {
    let policy = &ctx.policy;
    let default_cloud = ctx.default_cloud_provider.map(|c| c.as_str()).unwrap_or("");
    let default_tool = policy.default_ci_tool.map(|t| t.as_str()).unwrap_or("");
    let main_branches = policy.main_branches.join(",");

    let fields: [&str; 11] = [
        ctx.ci_tool.as_str(),
        default_cloud,
        &ctx.branch_ref,
        &ctx.commit_message,
        ctx.merge_message.as_deref().unwrap_or(""),
        if ctx.prior_stages_succeeded { "1" } else { "0" },
        default_tool,
        if policy.treat_untagged_as_default { "1" } else { "0" },
        &main_branches,
        if policy.require_approved_token { "1" } else { "0" },
        latest_tag.unwrap_or(""),
    ];

    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CiTool, CloudProvider, Ownership};

    fn base(branch: &str, message: &str) -> InvocationContext {
        InvocationContext::new(CiTool::GhActions, branch, message)
            .with_default_cloud(CloudProvider::Azure)
    }

    #[test]
    fn test_cloud_unresolved_is_fatal() {
        let ctx = InvocationContext::new(CiTool::GhActions, "feature/x", "[gh_actions] [build] x");
        let decision = decide(&ctx, None);
        assert_eq!(decision.status, DecisionStatus::Fatal);
        assert_eq!(decision.error, Some(DecisionError::CloudUnresolved));
        assert!(!decision.should_run);
        assert!(!decision.stages.any());
        assert_eq!(decision.ownership, Ownership::Tagged);

        for stage in Stage::ALL {
            assert!(
                decision
                    .blocking_reasons(stage)
                    .any(|r| r.rule == StageRule::CloudResolved),
                "{:?} cleared without a cloud reason",
                stage
            );
        }
    }

    #[test]
    fn test_malformed_tag_blocks_publish_only() {
        let ctx = base("main", "[gh_actions] [build] merge")
            .with_merge_message("[APPROVED] [PATCH] [gh_actions] ok");
        let decision = decide(&ctx, Some("release-1"));
        assert_eq!(decision.status, DecisionStatus::Fatal);
        assert!(matches!(
            decision.error,
            Some(DecisionError::MalformedTag { .. })
        ));
        assert!(!decision.stages.publish);
        assert!(decision.stages.plan);
        assert!(decision.next_version.is_none());

        let blocked: Vec<_> = decision.blocking_reasons(Stage::Publish).collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].rule, StageRule::VersionPlanned);
        assert!(blocked[0].detail.contains("release-1"));
        assert_eq!(decision.blocking_reasons(Stage::Plan).count(), 0);
    }

    #[test]
    fn test_skip_when_other_tool_owns() {
        let decision = decide(&base("feature/x", "[ado] [build] x"), None);
        assert_eq!(decision.status, DecisionStatus::Skip);
        assert!(!decision.should_run);
        assert!(decision.error.is_none());
        assert_eq!(decision.cloud_provider, Some(CloudProvider::Azure));
    }

    #[test]
    fn test_release_pr_rendered_for_create_pr() {
        let decision = decide(&base("feature/y", "[aws] [gh_actions] [release] y"), None);
        let pr = decision.release_pr.expect("release pr");
        assert_eq!(pr.title, "Release: aws module updates");
        assert_eq!(pr.body, "Approve with: [APPROVED] [PATCH] [gh_actions]");
    }

    #[test]
    fn test_unrecognized_tags_surface() {
        let decision = decide(&base("feature/x", "[gh_actions] [wip] x"), None);
        assert_eq!(decision.unrecognized_tags, vec!["wip".to_string()]);
    }

    #[test]
    fn test_input_digest_changes_with_inputs() {
        let a = base("feature/x", "[gh_actions] x");
        let b = base("feature/x", "[gh_actions] y");
        assert_eq!(input_digest(&a, None), input_digest(&a, None));
        assert_ne!(input_digest(&a, None), input_digest(&b, None));
        assert_ne!(input_digest(&a, None), input_digest(&a, Some("v1.0.0")));
        assert_eq!(input_digest(&a, None).len(), 64);
    }

    #[test]
    fn test_digest_field_boundaries() {
        let a = base("ab", "c");
        let b = base("a", "bc");
        assert_ne!(input_digest(&a, None), input_digest(&b, None));
    }
}
