//! One-shot multicast channel
//!
//! A `ResultBroadcaster` carries a single value to any number of
//! subscribers. Subscribers that register before `resolve` are woken with
//! a clone of the value; subscribers that register afterwards get the
//! cached value straight away. Once resolved the broadcaster is inert.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::core::{CoordinatorError, CoordinatorResult};

enum BroadcastState<T> {
    /// Not resolved yet; one sender per registered subscriber
    Waiting(Vec<oneshot::Sender<T>>),
    /// Resolved with the cached value
    Resolved(T),
}

/// Single-value multicast primitive
///
/// Clones share the same underlying channel.
pub struct ResultBroadcaster<T> {
    state: Arc<Mutex<BroadcastState<T>>>,
}

impl<T: Clone> ResultBroadcaster<T> {
    /// Create an unresolved broadcaster with no subscribers
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BroadcastState::Waiting(Vec::new()))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BroadcastState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register interest in the value
    ///
    /// After resolution the returned subscription is immediately ready.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut state = self.lock();
        match &mut *state {
            BroadcastState::Resolved(value) => Subscription::ready(value.clone()),
            BroadcastState::Waiting(senders) => {
                // Drop senders whose subscriber already went away
                senders.retain(|tx| !tx.is_closed());
                let (tx, rx) = oneshot::channel();
                senders.push(tx);
                Subscription::waiting(rx)
            }
        }
    }

    /// Deliver the value to every live subscriber
    ///
    /// Returns how many subscribers actually received it. Fails with
    /// `AlreadyResolved` on a second call.
    pub fn resolve(&self, value: T) -> CoordinatorResult<usize> {
        let mut state = self.lock();
        let senders = match &mut *state {
            BroadcastState::Resolved(_) => return Err(CoordinatorError::AlreadyResolved),
            BroadcastState::Waiting(senders) => std::mem::take(senders),
        };
        *state = BroadcastState::Resolved(value.clone());
        drop(state);

        let mut delivered = 0;
        for tx in senders {
            if tx.send(value.clone()).is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Whether `resolve` has already been called
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.lock(), BroadcastState::Resolved(_))
    }

    /// Number of subscribers still waiting for the value
    pub fn waiting_subscribers(&self) -> usize {
        match &*self.lock() {
            BroadcastState::Resolved(_) => 0,
            BroadcastState::Waiting(senders) => {
                senders.iter().filter(|tx| !tx.is_closed()).count()
            }
        }
    }
}

impl<T: Clone> Default for ResultBroadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ResultBroadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> std::fmt::Debug for ResultBroadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let resolved = matches!(
            &*self.state.lock().unwrap_or_else(PoisonError::into_inner),
            BroadcastState::Resolved(_)
        );
        f.debug_struct("ResultBroadcaster")
            .field("resolved", &resolved)
            .finish()
    }
}

enum SubscriptionState<T> {
    Ready(T),
    Waiting(oneshot::Receiver<T>),
}

/// Handle to a value that a `ResultBroadcaster` will eventually deliver
///
/// Dropping the handle unsubscribes without affecting other subscribers.
pub struct Subscription<T> {
    state: SubscriptionState<T>,
}

impl<T> Subscription<T> {
    fn ready(value: T) -> Self {
        Self {
            state: SubscriptionState::Ready(value),
        }
    }

    fn waiting(rx: oneshot::Receiver<T>) -> Self {
        Self {
            state: SubscriptionState::Waiting(rx),
        }
    }

    /// Wait for the value
    ///
    /// Returns `None` if every handle to the broadcaster was dropped
    /// without resolving it (the request was abandoned).
    pub async fn recv(self) -> Option<T> {
        match self.state {
            SubscriptionState::Ready(value) => Some(value),
            SubscriptionState::Waiting(rx) => rx.await.ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_subscribers_before_resolve_receive_value() {
        let broadcaster = ResultBroadcaster::new();
        let first = broadcaster.subscribe();
        let second = broadcaster.subscribe();
        assert_eq!(broadcaster.waiting_subscribers(), 2);

        assert_eq!(broadcaster.resolve(7u32).unwrap(), 2);

        assert_eq!(first.recv().await, Some(7));
        assert_eq!(second.recv().await, Some(7));
    }

    #[test]
    fn test_late_subscriber_gets_cached_value() {
        let broadcaster = ResultBroadcaster::new();
        broadcaster.resolve("done".to_string()).unwrap();

        let late = broadcaster.subscribe();
        assert_eq!(late.recv().now_or_never(), Some(Some("done".to_string())));
        assert_eq!(broadcaster.waiting_subscribers(), 0);
    }

    #[test]
    fn test_second_resolve_fails() {
        let broadcaster = ResultBroadcaster::new();
        broadcaster.resolve(1u8).unwrap();

        assert_eq!(broadcaster.resolve(2u8), Err(CoordinatorError::AlreadyResolved));
        // The first value is kept
        assert_eq!(broadcaster.subscribe().recv().now_or_never(), Some(Some(1)));
    }

    #[test]
    fn test_pending_subscription_is_not_ready() {
        let broadcaster: ResultBroadcaster<u8> = ResultBroadcaster::new();
        let sub = broadcaster.subscribe();
        assert!(!broadcaster.is_resolved());
        assert_eq!(sub.recv().now_or_never(), None);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_affect_others() {
        let broadcaster = ResultBroadcaster::new();
        let dropped = broadcaster.subscribe();
        let kept = broadcaster.subscribe();
        drop(dropped);

        assert_eq!(broadcaster.resolve(true).unwrap(), 1);
        assert_eq!(kept.recv().await, Some(true));
    }

    #[tokio::test]
    async fn test_abandoned_broadcaster_yields_none() {
        let broadcaster: ResultBroadcaster<u8> = ResultBroadcaster::new();
        let sub = broadcaster.subscribe();
        drop(broadcaster);

        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let broadcaster = ResultBroadcaster::new();
        let clone = broadcaster.clone();
        let sub = clone.subscribe();

        broadcaster.resolve(3i32).unwrap();
        assert!(clone.is_resolved());
        assert_eq!(sub.recv().await, Some(3));
    }
}
