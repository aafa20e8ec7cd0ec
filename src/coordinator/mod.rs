//! Request coordination
//!
//! This module provides the `RequestCoordinator`, which merges concurrent
//! permission requests into the smallest set of outstanding prompts and
//! fans each prompt's result out to every caller waiting on it.

mod aggregate;
mod config;
#[allow(clippy::module_inception)]
mod coordinator;
mod outcome;

pub use aggregate::AggregationTransform;
pub use config::{CoordinatorConfig, PlatformVersion, RUNTIME_PERMISSIONS_LEVEL};
pub use coordinator::RequestCoordinator;
pub use outcome::PermissionOutcome;
