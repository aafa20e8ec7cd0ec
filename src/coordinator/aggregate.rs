//! Reducers over a coordinator's outcome stream
//!
//! A request's outcomes arrive one per requested permission. The reducers
//! here only look at complete batches: if the stream ends before a whole
//! batch arrived (the request was torn down mid-flight), they emit nothing
//! and just complete.

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use super::PermissionOutcome;

/// Aggregations available on any stream of `PermissionOutcome`s
pub trait AggregationTransform: Stream<Item = PermissionOutcome> + Sized + Send + 'static {
    /// Pass outcomes through unchanged
    fn per_permission(self) -> BoxStream<'static, PermissionOutcome> {
        self.boxed()
    }

    /// Emit `true` for each complete batch whose outcomes are all granted,
    /// `false` otherwise
    fn all_granted(self, batch_len: usize) -> BoxStream<'static, bool> {
        complete_batches(self, batch_len)
            .map(|batch| batch.iter().all(|o| o.granted))
            .boxed()
    }

    /// Emit one combined outcome per complete batch
    fn combined(self, batch_len: usize) -> BoxStream<'static, PermissionOutcome> {
        complete_batches(self, batch_len)
            .filter_map(|batch| future::ready(PermissionOutcome::combine(&batch)))
            .boxed()
    }
}

impl<S> AggregationTransform for S where S: Stream<Item = PermissionOutcome> + Send + 'static {}

fn complete_batches<S>(outcomes: S, batch_len: usize) -> BoxStream<'static, Vec<PermissionOutcome>>
where
    S: Stream<Item = PermissionOutcome> + Send + 'static,
{
    if batch_len == 0 {
        return stream::empty().boxed();
    }

    outcomes
        .chunks(batch_len)
        .filter(move |batch| {
            if batch.len() < batch_len {
                tracing::debug!(
                    "Dropping incomplete batch ({} of {} outcomes)",
                    batch.len(),
                    batch_len
                );
            }
            future::ready(batch.len() == batch_len)
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(grants: &[(&str, bool)]) -> impl Stream<Item = PermissionOutcome> + Send + 'static {
        let items: Vec<PermissionOutcome> = grants
            .iter()
            .map(|(id, granted)| PermissionOutcome::new(*id, *granted, false))
            .collect();
        stream::iter(items)
    }

    #[tokio::test]
    async fn test_all_granted_true() {
        let result: Vec<bool> = outcomes(&[("CAMERA", true), ("MIC", true)])
            .all_granted(2)
            .collect()
            .await;
        assert_eq!(result, vec![true]);
    }

    #[tokio::test]
    async fn test_all_granted_false_when_one_denied() {
        let result: Vec<bool> = outcomes(&[("CAMERA", true), ("MIC", false)])
            .all_granted(2)
            .collect()
            .await;
        assert_eq!(result, vec![false]);
    }

    #[tokio::test]
    async fn test_empty_upstream_emits_nothing() {
        let result: Vec<bool> = outcomes(&[]).all_granted(2).collect().await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_batch_emits_nothing() {
        let result: Vec<bool> = outcomes(&[("CAMERA", true)]).all_granted(2).collect().await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_per_permission_passes_through() {
        let result: Vec<PermissionOutcome> = outcomes(&[("A", true), ("B", false)])
            .per_permission()
            .collect()
            .await;
        assert_eq!(
            result,
            vec![
                PermissionOutcome::new("A", true, false),
                PermissionOutcome::new("B", false, false)
            ]
        );
    }

    #[tokio::test]
    async fn test_combined() {
        let result: Vec<PermissionOutcome> = outcomes(&[("A", true), ("B", true)])
            .combined(2)
            .collect()
            .await;
        assert_eq!(result, vec![PermissionOutcome::new("A, B", true, false)]);
    }
}
