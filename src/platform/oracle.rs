//! Grant state oracles
//!
//! Platforms without runtime permissions grant everything at install time,
//! so the oracle is picked once from the platform version instead of
//! branching on it at every call site.

use std::sync::Arc;

use super::GrantStateSource;
use crate::coordinator::PlatformVersion;

/// Answers whether a permission is already decided
pub trait GrantStateOracle: Send + Sync {
    /// Whether the permission is currently granted
    fn is_granted(&self, identifier: &str) -> bool;

    /// Whether the permission is currently revoked by policy
    fn is_revoked(&self, identifier: &str) -> bool;
}

/// Oracle for platforms that grant permissions at install time
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallTimeOracle;

impl GrantStateOracle for InstallTimeOracle {
    fn is_granted(&self, _identifier: &str) -> bool {
        true
    }

    fn is_revoked(&self, _identifier: &str) -> bool {
        false
    }
}

/// Oracle backed by the live platform grant registry
pub struct RuntimeOracle {
    source: Arc<dyn GrantStateSource>,
}

impl RuntimeOracle {
    pub fn new(source: Arc<dyn GrantStateSource>) -> Self {
        Self { source }
    }
}

impl GrantStateOracle for RuntimeOracle {
    fn is_granted(&self, identifier: &str) -> bool {
        self.source.is_granted(identifier)
    }

    fn is_revoked(&self, identifier: &str) -> bool {
        self.source.is_revoked(identifier)
    }
}

/// Pick the oracle matching the platform's permission model
pub fn oracle_for(
    version: PlatformVersion,
    source: Arc<dyn GrantStateSource>,
) -> Arc<dyn GrantStateOracle> {
    if version.supports_runtime_grants() {
        Arc::new(RuntimeOracle::new(source))
    } else {
        Arc::new(InstallTimeOracle)
    }
}
