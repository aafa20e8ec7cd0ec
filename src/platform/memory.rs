//! In-memory platform
//!
//! A scriptable stand-in for the real platform: grant states and rationale
//! flags are set directly, and every prompt call is recorded. Hosts that
//! answer prompts asynchronously can take a receiver of prompt batches via
//! `with_prompt_channel`.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{GrantStateSource, PromptInvoker, RationaleSource};

/// Platform-side decision for one permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    Granted,
    Revoked,
    /// Never answered, or answered with a denial the user may revisit
    Undetermined,
}

#[derive(Default)]
struct PlatformState {
    grants: HashMap<String, GrantState>,
    rationale: HashSet<String>,
    prompts: Vec<Vec<String>>,
}

/// Scriptable platform implementing every collaborator trait
#[derive(Default)]
pub struct InMemoryPlatform {
    state: Mutex<PlatformState>,
    prompt_tx: Option<mpsc::UnboundedSender<Vec<String>>>,
}

impl InMemoryPlatform {
    /// Create a platform where every permission is undetermined
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a platform that also forwards each prompt batch to a channel
    pub fn with_prompt_channel() -> (Self, mpsc::UnboundedReceiver<Vec<String>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let platform = Self {
            state: Mutex::new(PlatformState::default()),
            prompt_tx: Some(tx),
        };
        (platform, rx)
    }

    fn lock(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_state(&self, identifier: impl Into<String>, state: GrantState) {
        self.lock().grants.insert(identifier.into(), state);
    }

    pub fn grant(&self, identifier: impl Into<String>) {
        self.set_state(identifier, GrantState::Granted);
    }

    pub fn revoke(&self, identifier: impl Into<String>) {
        self.set_state(identifier, GrantState::Revoked);
    }

    pub fn set_rationale(&self, identifier: impl Into<String>, show: bool) {
        let identifier = identifier.into();
        let mut state = self.lock();
        if show {
            state.rationale.insert(identifier);
        } else {
            state.rationale.remove(&identifier);
        }
    }

    /// Current decision for a permission
    pub fn state_of(&self, identifier: &str) -> GrantState {
        self.lock()
            .grants
            .get(identifier)
            .copied()
            .unwrap_or(GrantState::Undetermined)
    }

    /// Record the user's answers the way the platform would
    ///
    /// Granted ids become `Granted`; denied ids stay `Undetermined` so the
    /// user can be asked again.
    pub fn apply_answers(&self, identifiers: &[String], granted: &[bool]) {
        let mut state = self.lock();
        for (identifier, &ok) in identifiers.iter().zip(granted) {
            let decision = if ok {
                GrantState::Granted
            } else {
                GrantState::Undetermined
            };
            state.grants.insert(identifier.clone(), decision);
        }
    }

    /// Every prompt batch fired so far, in call order
    pub fn prompts(&self) -> Vec<Vec<String>> {
        self.lock().prompts.clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// How many prompt batches included this permission
    pub fn times_prompted(&self, identifier: &str) -> usize {
        self.lock()
            .prompts
            .iter()
            .filter(|batch| batch.iter().any(|id| id == identifier))
            .count()
    }
}

impl GrantStateSource for InMemoryPlatform {
    fn is_granted(&self, identifier: &str) -> bool {
        self.state_of(identifier) == GrantState::Granted
    }

    fn is_revoked(&self, identifier: &str) -> bool {
        self.state_of(identifier) == GrantState::Revoked
    }
}

impl RationaleSource for InMemoryPlatform {
    fn should_show_rationale(&self, identifier: &str) -> bool {
        self.lock().rationale.contains(identifier)
    }
}

impl PromptInvoker for InMemoryPlatform {
    fn prompt_for(&self, identifiers: &[String]) {
        self.lock().prompts.push(identifiers.to_vec());
        if let Some(tx) = &self.prompt_tx {
            if tx.send(identifiers.to_vec()).is_err() {
                tracing::warn!("Prompt receiver dropped, batch not forwarded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_permission_is_undetermined() {
        let platform = InMemoryPlatform::new();
        assert_eq!(platform.state_of("CAMERA"), GrantState::Undetermined);
        assert!(!platform.is_granted("CAMERA"));
        assert!(!platform.is_revoked("CAMERA"));
    }

    #[test]
    fn test_apply_answers() {
        let platform = InMemoryPlatform::new();
        let ids = vec!["A".to_string(), "B".to_string()];
        platform.apply_answers(&ids, &[true, false]);

        assert_eq!(platform.state_of("A"), GrantState::Granted);
        assert_eq!(platform.state_of("B"), GrantState::Undetermined);
    }

    #[tokio::test]
    async fn test_prompts_are_recorded_and_forwarded() {
        let (platform, mut rx) = InMemoryPlatform::with_prompt_channel();
        platform.prompt_for(&["A".to_string(), "B".to_string()]);

        assert_eq!(platform.prompt_count(), 1);
        assert_eq!(platform.times_prompted("B"), 1);
        assert_eq!(platform.times_prompted("C"), 0);
        assert_eq!(rx.recv().await, Some(vec!["A".to_string(), "B".to_string()]));
    }
}
