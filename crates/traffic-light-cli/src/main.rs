//! Traffic Light - multi-platform CI/CD decision CLI
//!
//! The `traffic-light` command is called by every CI platform's pipeline
//! template at the start of a run. It reads the commit message, branch and
//! platform identity, and prints whether this platform owns the commit and
//! which stages it may run.
//!
//! ## Commands
//!
//! - `decide`: Full decision for one pipeline invocation
//! - `parse`: Show the routing and approval tags found in a message
//! - `next-version`: Compute the next release version from the latest tag
//!
//! Logs go to stderr; stdout carries only the result. A fatal decision exits
//! with status 2, usage and configuration errors with status 1.

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

use traffic_light_core::{
    decide, next_version, parse, parse_approval, select_latest_tag, ActionPlan, ApprovalTags,
    CiTool, CloudProvider, CommitTags, Decision, InvocationContext, VersionBump,
};

mod config;
mod output;

use config::{resolve_policy, FileConfig, PolicyOverrides};
use output::OutputFormat;

/// Exit status for a fatal decision.
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "traffic-light")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-platform CI/CD ownership and release decisions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (default: ./traffic-light.toml when present)
    #[arg(long, global = true, env = "TRAFFIC_LIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide ownership, cloud, stage eligibility and version for one invocation
    Decide(DecideArgs),

    /// Show the tags parsed from a commit or approval message
    Parse {
        /// Message to parse
        #[arg(short, long, env = "TRAFFIC_LIGHT_COMMIT_MESSAGE")]
        message: String,
    },

    /// Compute the next release version
    NextVersion {
        #[command(flatten)]
        tags: TagSource,

        /// Bump to apply (overrides the approval message)
        #[arg(long)]
        bump: Option<VersionBump>,

        /// Approval message to read the bump from
        #[arg(short, long, env = "TRAFFIC_LIGHT_MERGE_MESSAGE")]
        message: Option<String>,
    },
}

#[derive(Args)]
struct DecideArgs {
    /// CI tool running this invocation
    #[arg(long, env = "TRAFFIC_LIGHT_CI_TOOL")]
    ci_tool: CiTool,

    /// Cloud provider used when the commit carries no cloud tag
    #[arg(long, env = "TRAFFIC_LIGHT_DEFAULT_CLOUD")]
    default_cloud: Option<CloudProvider>,

    /// Branch being built (`refs/heads/` prefix accepted)
    #[arg(long, env = "TRAFFIC_LIGHT_BRANCH_REF")]
    branch: String,

    /// Head commit message
    #[arg(long, env = "TRAFFIC_LIGHT_COMMIT_MESSAGE")]
    commit_message: String,

    /// Merged pull request message carrying the approval tags
    #[arg(long, env = "TRAFFIC_LIGHT_MERGE_MESSAGE")]
    merge_message: Option<String>,

    /// Earlier stages of this run failed
    #[arg(
        long,
        env = "TRAFFIC_LIGHT_PRIOR_STAGES_FAILED",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    prior_stages_failed: bool,

    #[command(flatten)]
    tags: TagSource,

    /// CI tool that owns untagged commits
    #[arg(long, env = "TRAFFIC_LIGHT_DEFAULT_CI_TOOL")]
    default_ci_tool: Option<CiTool>,

    /// Run untagged commits on the default CI tool
    #[arg(
        long,
        env = "TRAFFIC_LIGHT_TREAT_UNTAGGED_AS_DEFAULT",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    treat_untagged_as_default: Option<bool>,

    /// Main branch name (repeatable; default: main, master)
    #[arg(
        long = "main-branch",
        env = "TRAFFIC_LIGHT_MAIN_BRANCHES",
        value_delimiter = ','
    )]
    main_branches: Vec<String>,

    /// Also require the [APPROVED] token in the merge message to publish
    #[arg(
        long,
        env = "TRAFFIC_LIGHT_REQUIRE_APPROVED",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    require_approved: Option<bool>,

    /// Stdout format
    #[arg(long, value_enum, default_value = "env")]
    format: OutputFormat,

    /// Also append `key=value` lines to this file (e.g. $GITHUB_OUTPUT)
    #[arg(long, env = "TRAFFIC_LIGHT_OUTPUT_FILE")]
    output_file: Option<PathBuf>,
}

/// Where the latest release tag comes from.
#[derive(Args)]
struct TagSource {
    /// Latest version tag, already selected by the caller
    #[arg(long, env = "TRAFFIC_LIGHT_LATEST_TAG", conflicts_with = "tags")]
    latest_tag: Option<String>,

    /// Full tag listing (whitespace or comma separated); the newest `v*` wins
    #[arg(long, env = "TRAFFIC_LIGHT_TAGS")]
    tags: Option<String>,
}

impl TagSource {
    fn latest(&self) -> Option<String> {
        if let Some(tag) = self.latest_tag.as_deref().map(str::trim) {
            return (!tag.is_empty()).then(|| tag.to_string());
        }
        let listing = self.tags.as_deref()?;
        let tags: Vec<&str> = listing
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();
        select_latest_tag(&tags).map(str::to_string)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    traffic_light_core::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Decide(args) => cmd_decide(cli.config, args),
        Commands::Parse { message } => cmd_parse(&message),
        Commands::NextVersion {
            tags,
            bump,
            message,
        } => cmd_next_version(&tags, bump, message.as_deref()),
    }
}

fn cmd_decide(config_path: Option<PathBuf>, args: DecideArgs) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let file = FileConfig::load(config_path.as_deref(), &cwd)?;

    let ctx = build_context(&args, &file);
    let latest_tag = args.tags.latest();
    let decision = decide(&ctx, latest_tag.as_deref());
    let plan = ActionPlan::for_decision(&decision);

    print!("{}", output::render(&decision, &plan, args.format)?);
    if let Some(path) = &args.output_file {
        output::append_env_file(path, &decision, &plan)?;
        info!(event = "output.written", path = %path.display());
    }

    Ok(ExitCode::from(exit_status(&decision)))
}

/// Layer flags and env over the config file into one invocation context.
/// An empty merge message counts as absent.
fn build_context(args: &DecideArgs, file: &FileConfig) -> InvocationContext {
    let policy = resolve_policy(
        file,
        &PolicyOverrides {
            default_ci_tool: args.default_ci_tool,
            treat_untagged_as_default: args.treat_untagged_as_default,
            main_branches: args.main_branches.clone(),
            require_approved_token: args.require_approved,
        },
    );

    let mut ctx = InvocationContext::new(args.ci_tool, &args.branch, &args.commit_message)
        .with_prior_stages_succeeded(!args.prior_stages_failed)
        .with_policy(policy);
    if let Some(cloud) = args.default_cloud.or(file.default_cloud_provider) {
        ctx = ctx.with_default_cloud(cloud);
    }
    if let Some(message) = args.merge_message.as_deref().filter(|m| !m.trim().is_empty()) {
        ctx = ctx.with_merge_message(message);
    }
    ctx
}

/// Process exit status: fatal decisions exit 2, skip and proceed exit 0.
fn exit_status(decision: &Decision) -> u8 {
    if decision.is_fatal() {
        EXIT_FATAL
    } else {
        0
    }
}

#[derive(Serialize)]
struct ParseReport {
    routing: CommitTags,
    approval: ApprovalTags,
}

fn cmd_parse(message: &str) -> Result<ExitCode> {
    let report = ParseReport {
        routing: parse(message),
        approval: parse_approval(message),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_next_version(
    tags: &TagSource,
    bump: Option<VersionBump>,
    message: Option<&str>,
) -> Result<ExitCode> {
    let mut approval = parse_approval(message.unwrap_or(""));
    if let Some(bump) = bump {
        approval.bump = bump;
    }

    let latest = tags.latest();
    match next_version(latest.as_deref(), &approval) {
        Ok(version) => {
            println!("{}", version);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(event = "version.failed", error = %err);
            eprintln!("error: {}", err);
            Ok(ExitCode::from(EXIT_FATAL))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn decide_args(extra: &[&str]) -> DecideArgs {
        let mut argv = vec!["traffic-light", "decide"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Decide(args) => args,
            _ => panic!("expected decide"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_context_layers_flags_over_file() {
        let args = decide_args(&[
            "--ci-tool",
            "ado",
            "--branch",
            "refs/heads/trunk",
            "--commit-message",
            "[ado] [build] x",
            "--merge-message",
            "[MINOR] [ado] ok",
            "--prior-stages-failed",
            "--require-approved",
        ]);
        let file = FileConfig {
            default_cloud_provider: Some(CloudProvider::Civo),
            main_branches: Some(vec!["trunk".to_string()]),
            ..FileConfig::default()
        };

        let ctx = build_context(&args, &file);
        assert_eq!(ctx.ci_tool, CiTool::Ado);
        assert_eq!(ctx.default_cloud_provider, Some(CloudProvider::Civo));
        assert_eq!(ctx.merge_message.as_deref(), Some("[MINOR] [ado] ok"));
        assert!(!ctx.prior_stages_succeeded);
        assert!(ctx.policy.require_approved_token);
        assert!(ctx.on_main_branch());
    }

    #[test]
    fn test_empty_merge_message_is_absent() {
        for message in ["", "   "] {
            let args = decide_args(&[
                "--ci-tool",
                "ado",
                "--branch",
                "main",
                "--commit-message",
                "x",
                "--merge-message",
                message,
            ]);
            let ctx = build_context(&args, &FileConfig::default());
            assert!(ctx.merge_message.is_none(), "{:?}", message);
        }
    }

    #[test]
    fn test_approved_token_not_required_by_default() {
        let args = decide_args(&[
            "--ci-tool",
            "gh-actions",
            "--branch",
            "main",
            "--commit-message",
            "merge",
            "--merge-message",
            "[MINOR] [gh_actions] ok",
            "--default-cloud",
            "aws",
        ]);
        let ctx = build_context(&args, &FileConfig::default());
        assert!(!ctx.policy.require_approved_token);

        let decision = decide(&ctx, Some("v1.0.0"));
        assert!(decision.stages.publish);
        assert_eq!(decision.next_version.as_deref(), Some("1.1.0"));
    }

    #[test]
    fn test_fatal_decision_exits_two() {
        let args = decide_args(&[
            "--ci-tool",
            "gh-actions",
            "--branch",
            "feature/x",
            "--commit-message",
            "[gh_actions] [build] x",
        ]);
        let decision = decide(&build_context(&args, &FileConfig::default()), None);
        assert!(decision.is_fatal());
        assert_eq!(exit_status(&decision), EXIT_FATAL);
    }

    #[test]
    fn test_skip_and_proceed_exit_zero() {
        let file = FileConfig {
            default_cloud_provider: Some(CloudProvider::Azure),
            ..FileConfig::default()
        };
        for (message, expect_run) in [("[ado] [build] x", false), ("[gh_actions] [build] x", true)] {
            let args = decide_args(&[
                "--ci-tool",
                "gh-actions",
                "--branch",
                "feature/x",
                "--commit-message",
                message,
            ]);
            let decision = decide(&build_context(&args, &file), None);
            assert_eq!(decision.should_run, expect_run);
            assert_eq!(exit_status(&decision), 0);
        }
    }

    #[test]
    fn test_decide_args_parse() {
        let cli = Cli::try_parse_from([
            "traffic-light",
            "decide",
            "--ci-tool",
            "gh-actions",
            "--branch",
            "refs/heads/main",
            "--commit-message",
            "[aws] x",
            "--prior-stages-failed",
            "--main-branch",
            "main,trunk",
            "--format",
            "json",
        ])
        .unwrap();

        let Commands::Decide(args) = cli.command else {
            panic!("expected decide");
        };
        assert_eq!(args.ci_tool, CiTool::GhActions);
        assert!(args.prior_stages_failed);
        assert_eq!(args.main_branches, vec!["main", "trunk"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.treat_untagged_as_default.is_none());
    }

    #[test]
    fn test_boolish_values() {
        let cli = Cli::try_parse_from([
            "traffic-light",
            "decide",
            "--ci-tool",
            "ado",
            "--branch",
            "main",
            "--commit-message",
            "x",
            "--prior-stages-failed=no",
            "--treat-untagged-as-default=yes",
        ])
        .unwrap();

        let Commands::Decide(args) = cli.command else {
            panic!("expected decide");
        };
        assert!(!args.prior_stages_failed);
        assert_eq!(args.treat_untagged_as_default, Some(true));
    }

    #[test]
    fn test_unknown_ci_tool_rejected() {
        assert!(Cli::try_parse_from([
            "traffic-light",
            "decide",
            "--ci-tool",
            "jenkins",
            "--branch",
            "main",
            "--commit-message",
            "x",
        ])
        .is_err());
    }

    #[test]
    fn test_tag_listing_selects_newest_release() {
        let source = TagSource {
            latest_tag: None,
            tags: Some("v1.2.9, v1.10.0\nbuild-7 v1.9.9".to_string()),
        };
        assert_eq!(source.latest().as_deref(), Some("v1.10.0"));
    }

    #[test]
    fn test_explicit_latest_tag_wins() {
        let source = TagSource {
            latest_tag: Some(" v2.0.0 ".to_string()),
            tags: None,
        };
        assert_eq!(source.latest().as_deref(), Some("v2.0.0"));

        let empty = TagSource {
            latest_tag: Some(String::new()),
            tags: None,
        };
        assert_eq!(empty.latest(), None);
    }
}
