//! Version planner.
//!
//! Computes the next semantic version from the latest `vMAJOR.MINOR.PATCH`
//! tag and an approval's bump. Tags compare as numeric triples, never as
//! strings: `v10.0.0` is newer than `v9.0.0`.

use thiserror::Error;

use crate::domain::{ApprovalTags, DecisionError, VersionBump};

/// Errors produced while planning a version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("latest version tag '{tag}' is not a vMAJOR.MINOR.PATCH triple")]
    MalformedTag { tag: String },

    #[error("version component overflow while bumping '{version}'")]
    Overflow { version: String },
}

impl From<VersionError> for DecisionError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::MalformedTag { tag } => DecisionError::MalformedTag { tag },
            VersionError::Overflow { version } => DecisionError::VersionOverflow { version },
        }
    }
}

// ---------------------------------------------------------------------------
// Semver triple
// ---------------------------------------------------------------------------

/// Parsed `MAJOR.MINOR.PATCH`. Field order makes the derived `Ord` numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a tag such as `v1.2.3`, `V1.2.3` or `1.2.3`. Pre-release and
    /// build suffixes are rejected, as are leading zeros (`v01.2.3`).
    pub fn parse_tag(tag: &str) -> Result<Self, VersionError> {
        let malformed = || VersionError::MalformedTag {
            tag: tag.to_string(),
        };
        let trimmed = tag.trim();
        let bare = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let mut parts = bare.split('.');
        let mut next = || -> Result<u64, VersionError> {
            let part = parts.next().ok_or_else(malformed)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            if part.len() > 1 && part.starts_with('0') {
                return Err(malformed());
            }
            part.parse::<u64>().map_err(|_| malformed())
        };
        let (major, minor, patch) = (next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self::new(major, minor, patch))
    }

    /// Apply exactly one bump; lower components reset to zero.
    pub fn bump(self, bump: VersionBump) -> Result<Self, VersionError> {
        let overflow = || VersionError::Overflow {
            version: self.to_string(),
        };
        let next = match bump {
            VersionBump::Major => Self::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            VersionBump::Minor => Self::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            VersionBump::Patch => Self::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        };
        Ok(next)
    }
}

impl std::fmt::Display for SemVer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Next version (without `v`) after `latest_tag`, bumped per `approval`.
///
/// No tag means base version `0.0.0`.
pub fn next_version(
    latest_tag: Option<&str>,
    approval: &ApprovalTags,
) -> Result<String, VersionError> {
    let base = match latest_tag {
        Some(tag) => SemVer::parse_tag(tag)?,
        None => SemVer::default(),
    };
    Ok(base.bump(approval.bump)?.to_string())
}

/// The numerically greatest `v*` tag in a tag listing.
///
/// Entries that do not start with `v` or `V` are not release tags and are
/// ignored; `v*` entries that are not a numeric triple are skipped with a
/// warning.
pub fn select_latest_tag<S: AsRef<str>>(tags: &[S]) -> Option<&str> {
    tags.iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| t.starts_with(['v', 'V']))
        .filter_map(|t| match SemVer::parse_tag(t) {
            Ok(v) => Some((v, t)),
            Err(err) => {
                tracing::warn!(event = "version.tag_skipped", tag = %t, error = %err);
                None
            }
        })
        .max_by_key(|(v, _)| *v)
        .map(|(_, t)| t)
}
