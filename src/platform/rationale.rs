//! Rationale collaborators

use std::sync::Arc;

use crate::coordinator::PlatformVersion;

/// Whether the platform suggests explaining why a permission is needed
///
/// Implementations capture whatever activity context the platform needs.
pub trait RationaleSource: Send + Sync {
    fn should_show_rationale(&self, identifier: &str) -> bool;
}

/// Rationale source for platforms without the capability
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRationale;

impl RationaleSource for NoRationale {
    fn should_show_rationale(&self, _identifier: &str) -> bool {
        false
    }
}

/// Pick the rationale source matching the platform's capabilities
pub fn rationale_for(
    version: PlatformVersion,
    source: Arc<dyn RationaleSource>,
) -> Arc<dyn RationaleSource> {
    if version.supports_runtime_grants() {
        source
    } else {
        Arc::new(NoRationale)
    }
}
