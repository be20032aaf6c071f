//! Tag parser for routing and approval messages.
//!
//! Two grammars share one tokenizer:
//!
//! - routing: `[repo] [cloud] [ci-tool] [action] <description>`
//! - approval: `[APPROVED] [MAJOR|MINOR|PATCH] [ci-tool] <description>`
//!
//! Tokens are the contents of single bracket pairs, matched anywhere in the
//! message, in any order, case-insensitively. Parsing never fails: unknown
//! tokens are collected, and a message with no routing token is "untagged".

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::tags::normalize_token;
use crate::domain::{
    Action, ApprovalTags, CiTool, CloudProvider, CommitTags, RepoPlatform, VersionBump,
};

const APPROVED_TOKEN: &str = "approved";

/// A recognized bracket token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Repo(RepoPlatform),
    Cloud(CloudProvider),
    Tool(CiTool),
    Action(Action),
    Approved,
    Bump(VersionBump),
}

static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("bracket pattern is valid"));

/// Raw contents of every `[...]` pair in `message`, in order of appearance.
fn bracket_tokens(message: &str) -> impl Iterator<Item = &str> {
    BRACKET_RE
        .captures_iter(message)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
}

fn classify(raw: &str) -> Option<Token> {
    let token = normalize_token(raw);
    if token == APPROVED_TOKEN {
        return Some(Token::Approved);
    }
    RepoPlatform::from_normalized(&token)
        .map(Token::Repo)
        .or_else(|| CloudProvider::from_normalized(&token).map(Token::Cloud))
        .or_else(|| CiTool::from_normalized(&token).map(Token::Tool))
        .or_else(|| Action::from_normalized(&token).map(Token::Action))
        .or_else(|| VersionBump::from_normalized(&token).map(Token::Bump))
}

/// Fill `slot` if empty; otherwise record `raw` as a conflict.
fn fill<T>(slot: &mut Option<T>, value: T, raw: &str, conflicts: &mut Vec<String>) {
    if slot.is_none() {
        *slot = Some(value);
    } else {
        conflicts.push(raw.to_string());
    }
}

/// Parse routing tags from a commit message.
///
/// When the message also carries `[APPROVED]`, [`CommitTags::approval`] holds
/// the approval-grammar parse of the same message.
pub fn parse(message: &str) -> CommitTags {
    let mut tags = CommitTags::default();
    let mut approved = false;

    for raw in bracket_tokens(message) {
        match classify(raw) {
            Some(Token::Repo(v)) => fill(&mut tags.repo_platform, v, raw, &mut tags.conflicts),
            Some(Token::Cloud(v)) => fill(&mut tags.cloud_provider, v, raw, &mut tags.conflicts),
            Some(Token::Tool(v)) => fill(&mut tags.ci_tool, v, raw, &mut tags.conflicts),
            Some(Token::Action(v)) => fill(&mut tags.action, v, raw, &mut tags.conflicts),
            Some(Token::Approved) => approved = true,
            // Approval-grammar vocabulary; handled by parse_approval.
            Some(Token::Bump(_)) => {}
            None => tags.unrecognized.push(raw.to_string()),
        }
    }

    if approved {
        tags.approval = Some(parse_approval(message));
    }
    tags
}

/// Parse an approval message.
///
/// `approved` is set only by the literal `[APPROVED]` token. The bump is the
/// first recognized bump token, defaulting to patch.
pub fn parse_approval(message: &str) -> ApprovalTags {
    let mut approval = ApprovalTags::default();
    let mut bump = None;

    for raw in bracket_tokens(message) {
        match classify(raw) {
            Some(Token::Approved) => approval.approved = true,
            Some(Token::Bump(b)) if bump.is_none() => bump = Some(b),
            Some(Token::Tool(t)) if approval.ci_tool.is_none() => approval.ci_tool = Some(t),
            _ => {}
        }
    }

    approval.bump = bump.unwrap_or_default();
    approval
}
