//! Request coordinator implementation
//!
//! A request goes through three steps:
//! - classify each permission: already granted, revoked by policy, or
//!   undetermined (joins or creates a pending entry)
//! - fire one platform prompt for every undetermined permission that had
//!   no pending entry yet
//! - emit the outcomes in the order the caller asked for them
//!
//! Prompt answers come back through `on_prompt_result`, which resolves
//! each pending entry and removes it from the registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use uuid::Uuid;

use super::aggregate::AggregationTransform;
use super::config::{CoordinatorConfig, PlatformVersion};
use super::outcome::PermissionOutcome;
use crate::broadcast::Subscription;
use crate::core::{CoordinatorError, CoordinatorResult};
use crate::platform::{
    oracle_for, rationale_for, GrantStateOracle, PlatformBindings, PromptInvoker, RationaleSource,
};
use crate::registry::SessionRegistry;

/// Where one requested permission's outcome comes from
enum Slot {
    /// Decided during classification
    Resolved(PermissionOutcome),
    /// Waiting on a pending entry's broadcaster
    Pending {
        identifier: String,
        subscription: Subscription<PermissionOutcome>,
    },
}

/// Coordinates permission requests for one hosting session
///
/// Clones share the registry, collaborators and logging flag.
#[derive(Clone)]
pub struct RequestCoordinator {
    platform: PlatformVersion,
    oracle: Arc<dyn GrantStateOracle>,
    rationale: Arc<dyn RationaleSource>,
    prompts: Arc<dyn PromptInvoker>,
    registry: SessionRegistry,
    logging: Arc<AtomicBool>,
}

impl RequestCoordinator {
    /// Create a coordinator with a fresh session registry
    pub fn new(config: CoordinatorConfig, bindings: PlatformBindings) -> Self {
        Self::with_registry(config, bindings, SessionRegistry::new())
    }

    /// Create a coordinator over an existing session registry
    ///
    /// Used when the host is recreated: prompts fired through the previous
    /// coordinator still resolve the subscribers attached to them.
    pub fn with_registry(
        config: CoordinatorConfig,
        bindings: PlatformBindings,
        registry: SessionRegistry,
    ) -> Self {
        tracing::info!(
            "Creating request coordinator (platform level {}, runtime grants: {})",
            config.platform.level(),
            config.platform.supports_runtime_grants()
        );

        Self {
            platform: config.platform,
            oracle: oracle_for(config.platform, bindings.grants),
            rationale: rationale_for(config.platform, bindings.rationale),
            prompts: bindings.prompts,
            registry,
            logging: Arc::new(AtomicBool::new(config.logging)),
        }
    }

    /// The session registry backing this coordinator
    pub fn registry(&self) -> SessionRegistry {
        self.registry.clone()
    }

    /// Turn per-permission debug traces on or off
    pub fn set_logging(&self, logging: bool) {
        self.logging.store(logging, Ordering::Relaxed);
    }

    pub fn is_logging(&self) -> bool {
        self.logging.load(Ordering::Relaxed)
    }

    /// Whether the permission is granted (always true before runtime grants)
    pub fn is_granted(&self, identifier: &str) -> bool {
        self.oracle.is_granted(identifier)
    }

    /// Whether the permission is revoked by policy (always false before runtime grants)
    pub fn is_revoked(&self, identifier: &str) -> bool {
        self.oracle.is_revoked(identifier)
    }

    /// Whether a prompt for the permission is in flight
    pub fn is_pending(&self, identifier: &str) -> bool {
        self.registry.is_pending(identifier)
    }

    /// Request permissions, yielding one outcome per permission
    ///
    /// Outcomes come in the order of `identifiers`. Nothing happens until
    /// the stream is first polled; every call returns an independent stream.
    pub fn request_each<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> CoordinatorResult<BoxStream<'static, PermissionOutcome>> {
        let identifiers = validate(identifiers)?;
        Ok(self.outcomes(identifiers))
    }

    /// Request permissions, yielding `true` only if all of them are granted
    pub fn request<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> CoordinatorResult<BoxStream<'static, bool>> {
        let identifiers = validate(identifiers)?;
        let batch_len = identifiers.len();
        Ok(self.outcomes(identifiers).all_granted(batch_len))
    }

    /// Request permissions, yielding one outcome combining all of them
    pub fn request_combined<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> CoordinatorResult<BoxStream<'static, PermissionOutcome>> {
        let identifiers = validate(identifiers)?;
        let batch_len = identifiers.len();
        Ok(self.outcomes(identifiers).combined(batch_len))
    }

    /// Run `request_each` every time `trigger` emits
    ///
    /// If every permission is already pending when this is called, one run
    /// starts right away without waiting for the trigger, so a recreated
    /// host picks up the prompt its predecessor fired.
    pub fn ensure_each<T, S>(
        &self,
        trigger: T,
        identifiers: &[S],
    ) -> CoordinatorResult<BoxStream<'static, PermissionOutcome>>
    where
        T: Stream + Send + 'static,
        S: AsRef<str>,
    {
        let identifiers = validate(identifiers)?;
        let coordinator = self.clone();
        let batch = identifiers.clone();
        Ok(self.on_trigger(trigger, &identifiers, move || {
            coordinator.outcomes(batch.clone())
        }))
    }

    /// Run `request` every time `trigger` emits
    ///
    /// Each run is reduced to a boolean on its own.
    pub fn ensure<T, S>(
        &self,
        trigger: T,
        identifiers: &[S],
    ) -> CoordinatorResult<BoxStream<'static, bool>>
    where
        T: Stream + Send + 'static,
        S: AsRef<str>,
    {
        let identifiers = validate(identifiers)?;
        let coordinator = self.clone();
        let batch = identifiers.clone();
        Ok(self.on_trigger(trigger, &identifiers, move || {
            coordinator.outcomes(batch.clone()).all_granted(batch.len())
        }))
    }

    /// Whether the platform suggests a rationale for this batch
    ///
    /// True only if every permission that is not granted has the rationale
    /// flag set. Always false before runtime grants.
    pub fn should_show_rationale<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> CoordinatorResult<bool> {
        let identifiers = validate(identifiers)?;
        if !self.platform.supports_runtime_grants() {
            return Ok(false);
        }

        Ok(identifiers
            .iter()
            .all(|id| self.oracle.is_granted(id) || self.rationale.should_show_rationale(id)))
    }

    /// Deliver the platform's answer to a prompt
    ///
    /// `identifiers` and `granted` are positional pairs, as passed to the
    /// prompt invoker. Ids without a pending entry are ignored. Returns how
    /// many pending entries were resolved.
    pub fn on_prompt_result(
        &self,
        identifiers: &[String],
        granted: &[bool],
    ) -> CoordinatorResult<usize> {
        if identifiers.len() != granted.len() {
            tracing::error!(
                "Prompt result length mismatch: {} permissions, {} flags",
                identifiers.len(),
                granted.len()
            );
            return Err(CoordinatorError::ResultLengthMismatch {
                ids: identifiers.len(),
                flags: granted.len(),
            });
        }

        tracing::info!("Prompt result received for: {}", identifiers.join(", "));

        let mut resolved = 0;
        for (identifier, &is_granted) in identifiers.iter().zip(granted) {
            let show_rationale = !is_granted && self.rationale.should_show_rationale(identifier);
            let outcome = PermissionOutcome::new(identifier.as_str(), is_granted, show_rationale);

            // Resolve and remove under one guard so no request can attach
            // to an entry that will never be resolved again
            let mut registry = self.registry.lock();
            let Some(entry) = registry.remove(identifier) else {
                tracing::warn!("No pending request for permission {}, ignoring result", identifier);
                continue;
            };

            match entry.channel.resolve(outcome) {
                Ok(delivered) => {
                    self.trace(|| {
                        tracing::debug!(
                            "Resolved {} (granted: {}) for {} subscriber(s)",
                            identifier,
                            is_granted,
                            delivered
                        )
                    });
                    resolved += 1;
                }
                Err(err) => {
                    tracing::error!("Failed to resolve permission {}: {}", identifier, err);
                }
            }
        }

        Ok(resolved)
    }

    /// Start `run` on every trigger emission and merge the runs as they go
    fn on_trigger<T, I, F>(
        &self,
        trigger: T,
        identifiers: &[String],
        run: F,
    ) -> BoxStream<'static, I>
    where
        T: Stream + Send + 'static,
        I: Send + 'static,
        F: Fn() -> BoxStream<'static, I> + Send + 'static,
    {
        let all_pending = {
            let registry = self.registry.lock();
            identifiers.iter().all(|id| registry.contains(id))
        };

        let reattach = if all_pending {
            tracing::info!(
                "Reattaching to pending request for: {}",
                identifiers.join(", ")
            );
            stream::once(future::ready(())).boxed()
        } else {
            stream::empty::<()>().boxed()
        };

        stream::select(trigger.map(|_| ()), reattach)
            .map(move |_| run())
            .flatten_unordered(None)
            .boxed()
    }

    /// Lazy outcome stream for an already validated batch
    fn outcomes(&self, identifiers: Vec<String>) -> BoxStream<'static, PermissionOutcome> {
        let coordinator = self.clone();

        let outcomes = async_stream::stream! {
            let request_id = Uuid::new_v4();
            let slots = match coordinator.classify(&identifiers, request_id) {
                Ok(slots) => slots,
                Err(err) => {
                    tracing::error!(%request_id, "Aborting permission request: {}", err);
                    return;
                }
            };

            for slot in slots {
                match slot {
                    Slot::Resolved(outcome) => {
                        yield outcome;
                    }
                    Slot::Pending { identifier, subscription } => {
                        match subscription.recv().await {
                            Some(outcome) => {
                                yield outcome;
                            }
                            None => {
                                tracing::warn!(
                                    %request_id,
                                    "Pending request for {} was abandoned",
                                    identifier
                                );
                                return;
                            }
                        }
                    }
                }
            }
        };

        outcomes.boxed()
    }

    /// Classify a batch and fire the prompt for newly pending permissions
    ///
    /// The registry stays locked for the whole check-then-create pass.
    fn classify(&self, identifiers: &[String], request_id: Uuid) -> CoordinatorResult<Vec<Slot>> {
        let span = tracing::info_span!("permission_request", %request_id);
        let _guard = span.enter();

        let mut slots = Vec::with_capacity(identifiers.len());
        let mut unrequested: Vec<String> = Vec::new();

        {
            let mut registry = self.registry.lock();
            for identifier in identifiers {
                self.trace(|| tracing::debug!("Requesting permission {}", identifier));

                if self.oracle.is_granted(identifier) {
                    slots.push(Slot::Resolved(PermissionOutcome::granted(identifier.as_str())));
                    continue;
                }

                if self.oracle.is_revoked(identifier) {
                    slots.push(Slot::Resolved(PermissionOutcome::revoked(identifier.as_str())));
                    continue;
                }

                let existing = registry
                    .try_get(identifier)
                    .map(|entry| entry.channel.subscribe());

                let subscription = match existing {
                    Some(subscription) => subscription,
                    None => match registry.create(identifier) {
                        Ok(entry) => {
                            let subscription = entry.channel.subscribe();
                            unrequested.push(identifier.clone());
                            subscription
                        }
                        Err(err) => {
                            // Nobody else could attach while we held the lock
                            for created in &unrequested {
                                registry.remove(created);
                            }
                            return Err(err);
                        }
                    },
                };

                slots.push(Slot::Pending {
                    identifier: identifier.clone(),
                    subscription,
                });
            }
        }

        if !unrequested.is_empty() {
            tracing::info!("Prompting for permissions: {}", unrequested.join(", "));
            self.prompts.prompt_for(&unrequested);
        }

        Ok(slots)
    }

    fn trace(&self, log: impl FnOnce()) {
        if self.is_logging() {
            log();
        }
    }
}

fn validate<S: AsRef<str>>(identifiers: &[S]) -> CoordinatorResult<Vec<String>> {
    if identifiers.is_empty() {
        return Err(CoordinatorError::InvalidArgument(
            "a permission request needs at least one permission".to_string(),
        ));
    }
    Ok(identifiers.iter().map(|id| id.as_ref().to_string()).collect())
}
