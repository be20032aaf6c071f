//! Rendering the decision for calling pipelines.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use traffic_light_core::{ActionPlan, Decision};

/// Stdout format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `key=value` lines
    Env,
    /// Full decision record and action plan
    Json,
}

#[derive(Serialize)]
struct DecisionReport<'a> {
    decision: &'a Decision,
    actions: &'a ActionPlan,
}

/// Flat view of the decision plus the planned action names.
pub fn flat_map(decision: &Decision, plan: &ActionPlan) -> BTreeMap<&'static str, String> {
    let mut map = decision.to_flat_map();
    map.insert("actions", plan.names());
    map
}

/// `key=value` lines; values are kept on one line.
pub fn render_env(map: &BTreeMap<&'static str, String>) -> String {
    let mut out = String::new();
    for (key, value) in map {
        let value = value.replace(['\r', '\n'], " ");
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}

pub fn render(decision: &Decision, plan: &ActionPlan, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Env => Ok(render_env(&flat_map(decision, plan))),
        OutputFormat::Json => {
            let report = DecisionReport {
                decision,
                actions: plan,
            };
            let mut json =
                serde_json::to_string_pretty(&report).context("serialize decision report")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Append the `key=value` form to `path`, creating it if needed. Step-output
/// files of CI platforms are append-only.
pub fn append_env_file(path: &Path, decision: &Decision, plan: &ActionPlan) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open output file {}", path.display()))?;
    file.write_all(render_env(&flat_map(decision, plan)).as_bytes())
        .with_context(|| format!("write output file {}", path.display()))?;
    Ok(())
}
