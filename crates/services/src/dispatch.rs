//! Fire-and-forget notification delivery.
//!
//! Request handlers enqueue finished messages through `NotificationDispatcher`;
//! a single `DispatchWorker` drains the queue in the background and talks to
//! the notifier. Handlers never wait on delivery. The queue is bounded: when
//! the notifier falls behind, new messages are refused instead of piling up.

use std::sync::Arc;

use domains::{DomainError, Notification, NotificationQueue, Notifier, Result};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Messages that may wait for delivery before `enqueue` starts refusing.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Sending half of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<Notification>,
}

/// Background consumer of the notification queue.
pub struct DispatchWorker {
    rx: mpsc::Receiver<Notification>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> (Self, DispatchWorker) {
        Self::with_capacity(notifier, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(notifier: Arc<dyn Notifier>, capacity: usize) -> (Self, DispatchWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, DispatchWorker { rx, notifier })
    }
}

impl NotificationQueue for NotificationDispatcher {
    fn enqueue(&self, notification: Notification) -> Result<()> {
        self.tx.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => DomainError::Delivery("notification queue is full".into()),
            TrySendError::Closed(_) => DomainError::Delivery("notification worker has stopped".into()),
        })
    }
}

impl DispatchWorker {
    /// Delivers queued messages until every dispatcher handle is dropped and
    /// the queue is empty. Returns how many were delivered successfully.
    pub async fn run(mut self) -> usize {
        let mut delivered = 0;
        while let Some(notification) = self.rx.recv().await {
            match self.notifier.send(&notification).await {
                Ok(()) => {
                    delivered += 1;
                    tracing::debug!(text = %notification.text, "notification delivered");
                }
                Err(e) => {
                    tracing::error!(error = %e, text = %notification.text, "notification delivery failed");
                }
            }
        }
        tracing::info!(delivered, "notification queue closed");
        delivered
    }
}
