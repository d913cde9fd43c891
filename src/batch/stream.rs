//! Progress stream handed to the observer of a batch

use crate::batch::types::{BatchResult, BatchSnapshot, BatchUpdate};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::UnboundedReceiver;

/// Ordered stream of batch snapshots
///
/// Yields a [`BatchUpdate::Progress`] for the initial state and after every
/// item transition, then a single [`BatchUpdate::Finished`] carrying the
/// batch result. A cancelled batch ends the stream without a final value.
/// Dropping the stream stops delivery; the batch keeps running.
#[derive(Debug)]
pub struct BatchProgressStream {
    updates: UnboundedReceiver<BatchUpdate>,
    last: Option<BatchSnapshot>,
}

impl BatchProgressStream {
    pub(crate) fn new(updates: UnboundedReceiver<BatchUpdate>) -> Self {
        Self {
            updates,
            last: None,
        }
    }

    /// Wait for the next update
    pub async fn next_update(&mut self) -> Option<BatchUpdate> {
        let update = self.updates.recv().await?;
        self.last = Some(update.snapshot().clone());
        Some(update)
    }

    /// Most recent snapshot received through this stream
    pub fn last_snapshot(&self) -> Option<&BatchSnapshot> {
        self.last.as_ref()
    }

    /// Drain the stream and return the batch result
    ///
    /// Returns `None` if the batch was cancelled before it finished.
    pub async fn into_result(mut self) -> Option<BatchResult> {
        while let Some(update) = self.next_update().await {
            if let BatchUpdate::Finished { result, .. } = update {
                return Some(result);
            }
        }
        None
    }
}

impl Stream for BatchProgressStream {
    type Item = BatchUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.updates.poll_recv(cx);
        if let Poll::Ready(Some(update)) = &polled {
            self.last = Some(update.snapshot().clone());
        }
        polled
    }
}
