//! Layered configuration: built-in defaults, then an optional TOML file,
//! then environment variables and flags (applied by clap before we get here).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use traffic_light_core::{CiTool, CloudProvider, Policy};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "traffic-light.toml";

/// Repository-wide settings shared by every platform's pipeline.
///
/// ```toml
/// default_cloud_provider = "azure"
/// default_ci_tool = "ado"
/// treat_untagged_as_default = true
/// main_branches = ["main"]
/// require_approved_token = false
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub default_cloud_provider: Option<CloudProvider>,
    pub default_ci_tool: Option<CiTool>,
    pub treat_untagged_as_default: Option<bool>,
    pub main_branches: Option<Vec<String>>,
    pub require_approved_token: Option<bool>,
}

impl FileConfig {
    /// Load the explicit file if given (it must exist), else
    /// [`DEFAULT_CONFIG_FILE`] in `cwd` if present, else defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => {
                let candidate: PathBuf = cwd.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::from_path(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        tracing::debug!(event = "config.loaded", path = %path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Policy settings supplied by flags or environment variables.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PolicyOverrides {
    pub default_ci_tool: Option<CiTool>,
    pub treat_untagged_as_default: Option<bool>,
    pub main_branches: Vec<String>,
    pub require_approved_token: Option<bool>,
}

/// Merge file settings and overrides onto the default policy.
pub fn resolve_policy(file: &FileConfig, overrides: &PolicyOverrides) -> Policy {
    let defaults = Policy::default();

    let main_branches = if !overrides.main_branches.is_empty() {
        overrides.main_branches.clone()
    } else {
        file.main_branches
            .clone()
            .unwrap_or(defaults.main_branches)
    };
    let main_branches = main_branches
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();

    Policy {
        default_ci_tool: overrides.default_ci_tool.or(file.default_ci_tool),
        treat_untagged_as_default: overrides
            .treat_untagged_as_default
            .or(file.treat_untagged_as_default)
            .unwrap_or(defaults.treat_untagged_as_default),
        main_branches,
        require_approved_token: overrides
            .require_approved_token
            .or(file.require_approved_token)
            .unwrap_or(defaults.require_approved_token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_file() {
        let config = FileConfig::from_toml_str(
            r#"
default_cloud_provider = "Azure"
default_ci_tool = "gh-actions"
treat_untagged_as_default = true
main_branches = ["trunk"]
require_approved_token = false
"#,
        )
        .unwrap();

        assert_eq!(config.default_cloud_provider, Some(CloudProvider::Azure));
        assert_eq!(config.default_ci_tool, Some(CiTool::GhActions));
        assert_eq!(config.treat_untagged_as_default, Some(true));
        assert_eq!(config.main_branches, Some(vec!["trunk".to_string()]));
        assert_eq!(config.require_approved_token, Some(false));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(FileConfig::from_toml_str("default_cloud = \"aws\"").is_err());
    }

    #[test]
    fn test_unknown_cloud_rejected() {
        assert!(FileConfig::from_toml_str("default_cloud_provider = \"gcp\"").is_err());
    }

    #[test]
    fn test_load_prefers_explicit_path() {
        let dir = tempdir().unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "default_cloud_provider = \"civo\"").unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "default_cloud_provider = \"oci\"",
        )
        .unwrap();

        let config = FileConfig::load(Some(&explicit), dir.path()).unwrap();
        assert_eq!(config.default_cloud_provider, Some(CloudProvider::Civo));
    }

    #[test]
    fn test_load_picks_up_default_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "default_cloud_provider = \"oci\"",
        )
        .unwrap();

        let config = FileConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.default_cloud_provider, Some(CloudProvider::Oci));
    }

    #[test]
    fn test_load_without_any_file_is_default() {
        let dir = tempdir().unwrap();
        assert_eq!(
            FileConfig::load(None, dir.path()).unwrap(),
            FileConfig::default()
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        let err = FileConfig::load(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = FileConfig {
            default_ci_tool: Some(CiTool::Ado),
            treat_untagged_as_default: Some(true),
            main_branches: Some(vec!["trunk".to_string()]),
            ..FileConfig::default()
        };
        let overrides = PolicyOverrides {
            default_ci_tool: Some(CiTool::OciPipeline),
            treat_untagged_as_default: Some(false),
            main_branches: vec!["release".to_string(), " ".to_string()],
            require_approved_token: Some(true),
        };

        let policy = resolve_policy(&file, &overrides);
        assert_eq!(policy.default_ci_tool, Some(CiTool::OciPipeline));
        assert!(!policy.treat_untagged_as_default);
        assert_eq!(policy.main_branches, vec!["release".to_string()]);
        assert!(policy.require_approved_token);
    }

    #[test]
    fn test_approved_token_is_opt_in() {
        let policy = resolve_policy(&FileConfig::default(), &PolicyOverrides::default());
        assert!(!policy.require_approved_token);

        let file = FileConfig {
            require_approved_token: Some(true),
            ..FileConfig::default()
        };
        assert!(resolve_policy(&file, &PolicyOverrides::default()).require_approved_token);

        let overrides = PolicyOverrides {
            require_approved_token: Some(false),
            ..PolicyOverrides::default()
        };
        assert!(!resolve_policy(&file, &overrides).require_approved_token);
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let policy = resolve_policy(&FileConfig::default(), &PolicyOverrides::default());
        assert_eq!(policy, Policy::default());
    }
}
