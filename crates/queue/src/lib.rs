//! FIFO work queue used between pipeline stages. Supports many producers
//! and a single consumer, plus a sentinel-`None` flush signal that a
//! producer can publish to force the consumer to act without waiting for
//! its normal close condition.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An item pulled off a `WorkQueue`: either a real item, or the flush
/// sentinel.
#[derive(Debug)]
pub enum Item<T> {
    Value(T),
    Flush,
}

pub struct WorkQueue<T> {
    tx: mpsc::UnboundedSender<Option<T>>,
    rx: mpsc::UnboundedReceiver<Option<T>>,
    cancel: CancellationToken,
}

/// A cloneable handle producers use to publish items; the consumer holds
/// the `WorkQueue` itself.
#[derive(Clone)]
pub struct Sender<T> {
    tx: mpsc::UnboundedSender<Option<T>>,
}

impl<T> Sender<T> {
    pub fn publish(&self, value: T) {
        // The receiver outliving every sender is the only failure mode;
        // the queue is being torn down, so dropping the item is correct.
        let _ = self.tx.send(Some(value));
    }

    pub fn flush(&self) {
        let _ = self.tx.send(None);
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn sender(&self) -> Sender<T> {
        Sender { tx: self.tx.clone() }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the next item. Returns `None` once the queue is cancelled
    /// and no more items are pending.
    pub async fn get(&mut self) -> Option<Item<T>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("work queue cancelled, draining no further items");
                None
            }
            msg = self.rx.recv() => msg.map(|opt| match opt {
                Some(value) => Item::Value(value),
                None => Item::Flush,
            }),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_items_in_publish_order() {
        let mut queue = WorkQueue::new();
        let sender = queue.sender();
        sender.publish(1);
        sender.publish(2);
        match queue.get().await {
            Some(Item::Value(v)) => assert_eq!(v, 1),
            _ => panic!("expected value"),
        }
        match queue.get().await {
            Some(Item::Value(v)) => assert_eq!(v, 2),
            _ => panic!("expected value"),
        }
    }

    #[tokio::test]
    async fn flush_sentinel_is_observed() {
        let mut queue = WorkQueue::new();
        let sender = queue.sender();
        sender.publish(1);
        sender.flush();
        assert!(matches!(queue.get().await, Some(Item::Value(1))));
        assert!(matches!(queue.get().await, Some(Item::Flush)));
    }

    #[tokio::test]
    async fn cancellation_terminates_consumer() {
        let mut queue: WorkQueue<i32> = WorkQueue::new();
        queue.cancel();
        assert!(queue.get().await.is_none());
    }
}
