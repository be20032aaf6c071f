//! Ownership resolution: which CI platform acts on a commit.
//!
//! Every platform evaluates the same message with its own identity. For a
//! message with one CI tool tag exactly one identity is owned; this holds
//! across platforms only because each of them runs this same function on the
//! same parse, which the engine cannot observe from inside one invocation.

use crate::domain::{CommitTags, InvocationContext, Ownership};

/// Resolve ownership of `tags` for the platform described by `ctx`.
pub fn resolve_ownership(tags: &CommitTags, ctx: &InvocationContext) -> Ownership {
    match tags.ci_tool {
        Some(tool) if tool == ctx.ci_tool => Ownership::Tagged,
        Some(tool) => Ownership::TaggedForOther { ci_tool: tool },
        None if !ctx.policy.treat_untagged_as_default => Ownership::Untagged,
        None => match ctx.policy.default_ci_tool {
            Some(default) if default == ctx.ci_tool => Ownership::UntaggedDefault,
            Some(default) => Ownership::UntaggedOtherDefault {
                default_ci_tool: default,
            },
            None => Ownership::UntaggedNoDefault,
        },
    }
}

/// Whether the platform described by `ctx` owns the commit.
pub fn should_run(tags: &CommitTags, ctx: &InvocationContext) -> bool {
    resolve_ownership(tags, ctx).owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CiTool, Policy};
    use crate::parser::parse;

    fn ctx(tool: CiTool) -> InvocationContext {
        InvocationContext::new(tool, "feature/x", "")
    }

    #[test]
    fn test_matching_tool_runs() {
        let tags = parse("[gh_actions] [build] fix");
        assert_eq!(
            resolve_ownership(&tags, &ctx(CiTool::GhActions)),
            Ownership::Tagged
        );
        assert!(should_run(&tags, &ctx(CiTool::GhActions)));
    }

    #[test]
    fn test_other_tool_skips() {
        let tags = parse("[gh_actions] [build] fix");
        assert_eq!(
            resolve_ownership(&tags, &ctx(CiTool::Ado)),
            Ownership::TaggedForOther {
                ci_tool: CiTool::GhActions
            }
        );
        assert!(!should_run(&tags, &ctx(CiTool::Ado)));
    }

    #[test]
    fn test_untagged_without_default_policy_never_runs() {
        let tags = parse("chore: docs");
        for tool in CiTool::ALL {
            assert_eq!(resolve_ownership(&tags, &ctx(*tool)), Ownership::Untagged);
        }
    }

    #[test]
    fn test_untagged_routed_to_default() {
        let tags = parse("[aws] chore: docs");
        let policy = Policy {
            default_ci_tool: Some(CiTool::Ado),
            treat_untagged_as_default: true,
            ..Policy::default()
        };

        let ado = ctx(CiTool::Ado).with_policy(policy.clone());
        let gha = ctx(CiTool::GhActions).with_policy(policy);

        assert_eq!(resolve_ownership(&tags, &ado), Ownership::UntaggedDefault);
        assert_eq!(
            resolve_ownership(&tags, &gha),
            Ownership::UntaggedOtherDefault {
                default_ci_tool: CiTool::Ado
            }
        );
    }

    #[test]
    fn test_untagged_default_policy_without_default_tool() {
        let tags = parse("chore: docs");
        let policy = Policy {
            treat_untagged_as_default: true,
            ..Policy::default()
        };
        let c = ctx(CiTool::Ado).with_policy(policy);
        assert_eq!(resolve_ownership(&tags, &c), Ownership::UntaggedNoDefault);
    }

    #[test]
    fn test_default_tool_ignored_when_policy_disabled() {
        let tags = parse("chore: docs");
        let policy = Policy {
            default_ci_tool: Some(CiTool::Ado),
            treat_untagged_as_default: false,
            ..Policy::default()
        };
        let c = ctx(CiTool::Ado).with_policy(policy);
        assert!(!should_run(&tags, &c));
    }
}
