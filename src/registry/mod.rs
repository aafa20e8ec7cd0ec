//! Pending request registry
//!
//! Maps a permission identifier to the broadcaster of its in-flight prompt.
//! There is at most one entry per identifier: the registry is where
//! concurrent requests for the same permission are deduplicated.
//!
//! The registry lives for the hosting session. It is shared through a
//! `SessionRegistry` handle so a host that gets recreated can hand the same
//! in-flight entries to its new coordinator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::broadcast::ResultBroadcaster;
use crate::coordinator::PermissionOutcome;
use crate::core::{CoordinatorError, CoordinatorResult};

/// In-flight state for one permission
#[derive(Debug, Clone)]
pub struct PendingEntry {
    /// The permission being prompted for
    pub identifier: String,
    /// Channel the prompt outcome will be delivered on
    pub channel: ResultBroadcaster<PermissionOutcome>,
    /// When the first request for this permission arrived
    pub requested_at: DateTime<Utc>,
}

impl PendingEntry {
    fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            channel: ResultBroadcaster::new(),
            requested_at: Utc::now(),
        }
    }
}

/// Map from permission identifier to its pending entry
#[derive(Debug, Default)]
pub struct PendingRequestRegistry {
    entries: HashMap<String, PendingEntry>,
}

impl PendingRequestRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up the pending entry for a permission
    pub fn try_get(&self, identifier: &str) -> Option<&PendingEntry> {
        self.entries.get(identifier)
    }

    /// Create a pending entry for a permission
    ///
    /// Callers must check `try_get` first; a second entry for the same
    /// identifier is an invariant violation.
    pub fn create(&mut self, identifier: &str) -> CoordinatorResult<&PendingEntry> {
        use std::collections::hash_map::Entry;

        match self.entries.entry(identifier.to_string()) {
            Entry::Occupied(_) => Err(CoordinatorError::DuplicateEntry(identifier.to_string())),
            Entry::Vacant(slot) => Ok(slot.insert(PendingEntry::new(identifier))),
        }
    }

    /// Remove the entry for a permission, if any
    pub fn remove(&mut self, identifier: &str) -> Option<PendingEntry> {
        self.entries.remove(identifier)
    }

    /// Whether a prompt is in flight for this permission
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Identifiers with a prompt in flight, oldest first
    pub fn pending_ids(&self) -> Vec<String> {
        let mut entries: Vec<&PendingEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.requested_at
                .cmp(&b.requested_at)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        entries.into_iter().map(|e| e.identifier.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared, session-scoped handle to a `PendingRequestRegistry`
///
/// Cloning the handle shares the same entries.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<PendingRequestRegistry>>,
}

impl SessionRegistry {
    /// Create a new, empty session registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the registry
    ///
    /// Check-then-create sequences must happen under a single guard.
    pub fn lock(&self) -> MutexGuard<'_, PendingRequestRegistry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a prompt is in flight for this permission
    pub fn is_pending(&self, identifier: &str) -> bool {
        self.lock().contains(identifier)
    }

    /// Identifiers with a prompt in flight, oldest first
    pub fn pending_ids(&self) -> Vec<String> {
        self.lock().pending_ids()
    }

    /// Whether two handles refer to the same registry
    pub fn same_session(&self, other: &SessionRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let mut registry = PendingRequestRegistry::new();
        assert!(registry.try_get("CAMERA").is_none());

        let entry = registry.create("CAMERA").unwrap();
        assert_eq!(entry.identifier, "CAMERA");
        assert!(!entry.channel.is_resolved());

        assert!(registry.try_get("CAMERA").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_create_fails() {
        let mut registry = PendingRequestRegistry::new();
        registry.create("CAMERA").unwrap();

        let err = registry.create("CAMERA").unwrap_err();
        assert_eq!(err, CoordinatorError::DuplicateEntry("CAMERA".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = PendingRequestRegistry::new();
        registry.create("MIC").unwrap();

        assert!(registry.remove("MIC").is_some());
        assert!(registry.remove("MIC").is_none());
        assert!(registry.remove("NEVER_ADDED").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identifiers_are_exact_strings() {
        let mut registry = PendingRequestRegistry::new();
        registry.create("camera").unwrap();

        assert!(registry.contains("camera"));
        assert!(!registry.contains("CAMERA"));
        assert!(registry.create("CAMERA").is_ok());
    }

    #[test]
    fn test_session_handles_share_entries() {
        let session = SessionRegistry::new();
        let reattached = session.clone();

        session.lock().create("LOCATION").unwrap();

        assert!(reattached.is_pending("LOCATION"));
        assert_eq!(reattached.pending_ids(), vec!["LOCATION".to_string()]);
        assert!(session.same_session(&reattached));
        assert!(!session.same_session(&SessionRegistry::new()));
    }
}
