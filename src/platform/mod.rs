//! Platform collaborators
//!
//! The coordinator never talks to the platform directly. It goes through:
//! - `GrantStateSource`: live read-only view of granted/revoked permissions
//! - `RationaleSource`: whether the platform suggests explaining a permission
//! - `PromptInvoker`: fires the user-facing authorization prompt
//!
//! Which strategy wraps these is decided once, from the platform version,
//! when the coordinator is built (see `oracle_for` and `rationale_for`).

pub mod memory;
pub mod oracle;
pub mod rationale;

use std::sync::Arc;

pub use memory::{GrantState, InMemoryPlatform};
pub use oracle::{oracle_for, GrantStateOracle, InstallTimeOracle, RuntimeOracle};
pub use rationale::{rationale_for, NoRationale, RationaleSource};

/// Live binding to the platform's grant registry
pub trait GrantStateSource: Send + Sync {
    /// Whether the permission is currently granted
    fn is_granted(&self, identifier: &str) -> bool;

    /// Whether the permission is currently revoked by policy
    fn is_revoked(&self, identifier: &str) -> bool;
}

/// Fires the platform authorization prompt
///
/// The call returns immediately. The host later forwards the answer to
/// `RequestCoordinator::on_prompt_result` with the same ids in the same
/// order.
pub trait PromptInvoker: Send + Sync {
    fn prompt_for(&self, identifiers: &[String]);
}

/// The set of platform collaborators a coordinator is built from
#[derive(Clone)]
pub struct PlatformBindings {
    pub grants: Arc<dyn GrantStateSource>,
    pub rationale: Arc<dyn RationaleSource>,
    pub prompts: Arc<dyn PromptInvoker>,
}

impl PlatformBindings {
    /// Bind all three collaborators to separate implementations
    pub fn new(
        grants: Arc<dyn GrantStateSource>,
        rationale: Arc<dyn RationaleSource>,
        prompts: Arc<dyn PromptInvoker>,
    ) -> Self {
        Self {
            grants,
            rationale,
            prompts,
        }
    }

    /// Bind all three collaborators to one platform object
    pub fn from_platform<P>(platform: Arc<P>) -> Self
    where
        P: GrantStateSource + RationaleSource + PromptInvoker + 'static,
    {
        Self {
            grants: platform.clone(),
            rationale: platform.clone(),
            prompts: platform,
        }
    }
}
