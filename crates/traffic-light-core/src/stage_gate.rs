//! Stage gate rules engine.
//!
//! Derives the eligibility of each [`Stage`] from parsed tags, the branch,
//! the merge message, and the outcome of earlier stages. Every rule of every
//! stage is evaluated (no short-circuit) and recorded as a [`GateReason`], so
//! a caller can always tell which rule produced a skip.
//!
//! - plan, test: owner matched
//! - create_pr: owner matched, `[release]`, not a main branch, prior stages ok
//! - publish: main branch, approval names this tool (plus `[APPROVED]` when
//!   the policy requires it)
//!
//! `create_pr` and `publish` are exclusive through the branch rules alone.

use crate::domain::{
    Action, ApprovalTags, CommitTags, GateReason, InvocationContext, Ownership, Policy, Stage,
    StageRule, StageSet,
};
use crate::ownership::resolve_ownership;
use crate::parser::parse_approval;

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// Rules `stage` depends on under `policy`, in evaluation order.
pub fn rules_for(stage: Stage, policy: &Policy) -> Vec<StageRule> {
    match stage {
        Stage::Plan | Stage::Test => vec![StageRule::OwnerMatched],
        Stage::CreatePr => vec![
            StageRule::OwnerMatched,
            StageRule::ReleaseAction,
            StageRule::NotMainBranch,
            StageRule::PriorStagesSucceeded,
        ],
        Stage::Publish => {
            let mut rules = vec![StageRule::MainBranch];
            if policy.require_approved_token {
                rules.push(StageRule::ApprovedToken);
            }
            rules.push(StageRule::ApprovalForThisTool);
            rules
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of gating one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub stages: StageSet,
    pub ownership: Ownership,
    /// Approval parse of the merge message (defaults when absent).
    pub approval: ApprovalTags,
    pub reasons: Vec<GateReason>,
}

struct GateInput<'a> {
    tags: &'a CommitTags,
    ctx: &'a InvocationContext,
    ownership: Ownership,
    approval: &'a ApprovalTags,
    on_main: bool,
    prior_stages_succeeded: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute stage eligibility for one invocation.
pub fn gate(
    tags: &CommitTags,
    ctx: &InvocationContext,
    prior_stages_succeeded: bool,
) -> GateOutcome {
    let approval = ctx
        .merge_message
        .as_deref()
        .map(parse_approval)
        .unwrap_or_default();

    let input = GateInput {
        tags,
        ctx,
        ownership: resolve_ownership(tags, ctx),
        approval: &approval,
        on_main: ctx.on_main_branch(),
        prior_stages_succeeded,
    };

    let mut stages = StageSet::none();
    let mut reasons = Vec::new();

    for stage in Stage::ALL {
        let mut eligible = true;
        for rule in rules_for(stage, &ctx.policy) {
            let reason = check_rule(stage, rule, &input);
            eligible &= reason.satisfied;
            reasons.push(reason);
        }
        stages.set(stage, eligible);
    }

    GateOutcome {
        stages,
        ownership: input.ownership,
        approval,
        reasons,
    }
}

fn check_rule(stage: Stage, rule: StageRule, input: &GateInput<'_>) -> GateReason {
    let ctx = input.ctx;
    let (satisfied, detail) = match rule {
        StageRule::OwnerMatched => (
            input.ownership.owned(),
            input.ownership.describe(ctx.ci_tool),
        ),

        StageRule::ReleaseAction => match input.tags.action {
            Some(Action::Release) => (true, "commit requests a release".to_string()),
            Some(other) => (false, format!("commit action is [{}], not [release]", other)),
            None => (false, "commit carries no [release] tag".to_string()),
        },

        StageRule::NotMainBranch => {
            if input.on_main {
                (false, format!("'{}' is a main branch", ctx.branch_ref))
            } else {
                (true, format!("'{}' is not a main branch", ctx.branch_ref))
            }
        }

        StageRule::PriorStagesSucceeded => {
            if input.prior_stages_succeeded {
                (true, "plan and test succeeded".to_string())
            } else {
                (false, "plan or test failed".to_string())
            }
        }

        StageRule::MainBranch => {
            if input.on_main {
                (true, format!("'{}' is a main branch", ctx.branch_ref))
            } else {
                (false, format!("'{}' is not a main branch", ctx.branch_ref))
            }
        }

        StageRule::ApprovedToken => {
            if input.approval.approved {
                (true, "merge message carries [APPROVED]".to_string())
            } else if ctx.merge_message.is_none() {
                (false, "no merge message supplied".to_string())
            } else {
                (false, "merge message lacks [APPROVED]".to_string())
            }
        }

        StageRule::ApprovalForThisTool => match input.approval.ci_tool {
            Some(tool) if tool == ctx.ci_tool => {
                (true, format!("approval is addressed to {}", tool))
            }
            Some(tool) => (
                false,
                format!("approval is addressed to {}, not {}", tool, ctx.ci_tool),
            ),
            None if ctx.merge_message.is_none() => {
                (false, "no merge message supplied".to_string())
            }
            None => (false, "approval names no CI tool".to_string()),
        },

        // Never listed by `rules_for`; `decide` records these after gating.
        StageRule::CloudResolved | StageRule::VersionPlanned => {
            (true, "evaluated after gating".to_string())
        }
    };

    GateReason {
        stage,
        rule,
        satisfied,
        detail,
    }
}
