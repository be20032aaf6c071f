//! Cloud provider resolution.

use crate::domain::{CloudProvider, CommitTags, InvocationContext};

/// The tagged provider if present, else the configured default.
///
/// `None` means neither exists; the orchestrator reports that as
/// [`crate::DecisionError::CloudUnresolved`].
pub fn resolve_cloud(tags: &CommitTags, ctx: &InvocationContext) -> Option<CloudProvider> {
    tags.cloud_provider.or(ctx.default_cloud_provider)
}
