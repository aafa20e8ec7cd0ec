//! Coordinated runtime permission requests
//!
//! Several callers can ask for the same or overlapping permissions at the
//! same time. The `RequestCoordinator` makes sure each undecided permission
//! is prompted for exactly once, and every caller waiting on it receives the
//! same outcome.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use grantflow::coordinator::{CoordinatorConfig, RequestCoordinator};
//! use grantflow::platform::{InMemoryPlatform, PlatformBindings};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let (platform, mut prompts) = InMemoryPlatform::with_prompt_channel();
//! let coordinator = RequestCoordinator::new(
//!     CoordinatorConfig::default(),
//!     PlatformBindings::from_platform(Arc::new(platform)),
//! );
//!
//! let mut all_granted = coordinator.request(&["CAMERA", "MIC"])?;
//! let answer = tokio::spawn(async move { all_granted.next().await });
//!
//! // The host forwards the platform's answer once the user responds
//! if let Some(asked) = prompts.recv().await {
//!     coordinator.on_prompt_result(&asked, &[true, false])?;
//! }
//!
//! assert_eq!(answer.await?, Some(false));
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod cli;
pub mod coordinator;
pub mod core;
pub mod logging;
pub mod platform;
pub mod registry;

pub use crate::core::{CoordinatorError, CoordinatorResult};
pub use coordinator::{AggregationTransform, CoordinatorConfig, PermissionOutcome, RequestCoordinator};
pub use platform::PlatformBindings;
pub use registry::SessionRegistry;
