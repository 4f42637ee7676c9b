// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::BufferCapacity;
use crate::errors::ExecutionError;
use crate::observability::messages::container::SideEffectDropped;
use crate::observability::messages::StructuredLog;
use crate::traits::SideEffectValue;

enum Tx<SE> {
    Bounded(mpsc::Sender<SE>),
    Unbounded(mpsc::UnboundedSender<SE>),
}

impl<SE> Clone for Tx<SE> {
    fn clone(&self) -> Self {
        match self {
            Tx::Bounded(tx) => Tx::Bounded(tx.clone()),
            Tx::Unbounded(tx) => Tx::Unbounded(tx.clone()),
        }
    }
}

enum Rx<SE> {
    Bounded(mpsc::Receiver<SE>),
    Unbounded(mpsc::UnboundedReceiver<SE>),
}

impl<SE> Rx<SE> {
    async fn recv(&mut self) -> Option<SE> {
        match self {
            Rx::Bounded(rx) => rx.recv().await,
            Rx::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Posting half of a [`SideEffectChannel`]. Cheap to clone.
pub struct SideEffectSender<SE> {
    tx: Tx<SE>,
    shutdown: CancellationToken,
}

impl<SE> Clone for SideEffectSender<SE> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<SE: SideEffectValue> SideEffectSender<SE> {
    /// Enqueue a side effect.
    ///
    /// Waits for room when the channel is bounded and full. Fails with
    /// [`ExecutionError::ContainerClosed`] once the channel has been closed;
    /// the value is dropped in that case.
    pub async fn post(&self, value: SE) -> Result<(), ExecutionError> {
        if self.shutdown.is_cancelled() {
            SideEffectDropped.log();
            return Err(ExecutionError::ContainerClosed);
        }
        let delivered = match &self.tx {
            Tx::Unbounded(tx) => tx.send(value).is_ok(),
            Tx::Bounded(tx) => tokio::select! {
                _ = self.shutdown.cancelled() => false,
                sent = tx.send(value) => sent.is_ok(),
            },
        };
        if delivered {
            Ok(())
        } else {
            SideEffectDropped.log();
            Err(ExecutionError::ContainerClosed)
        }
    }
}

/// Queue of one-shot side effects.
///
/// Each posted value is delivered once. Several observers may attach; they
/// then compete for values, which is rarely what a caller wants.
pub struct SideEffectChannel<SE> {
    sender: SideEffectSender<SE>,
    rx: Arc<Mutex<Rx<SE>>>,
    shutdown: CancellationToken,
}

impl<SE: SideEffectValue> SideEffectChannel<SE> {
    pub fn new(capacity: BufferCapacity) -> Self {
        let (tx, rx) = match capacity {
            BufferCapacity::Bounded(n) => {
                let (tx, rx) = mpsc::channel(n.max(1));
                (Tx::Bounded(tx), Rx::Bounded(rx))
            }
            BufferCapacity::Unlimited => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Tx::Unbounded(tx), Rx::Unbounded(rx))
            }
        };
        let shutdown = CancellationToken::new();
        Self {
            sender: SideEffectSender {
                tx,
                shutdown: shutdown.clone(),
            },
            rx: Arc::new(Mutex::new(rx)),
            shutdown,
        }
    }

    pub fn sender(&self) -> SideEffectSender<SE> {
        self.sender.clone()
    }

    pub async fn post(&self, value: SE) -> Result<(), ExecutionError> {
        self.sender.post(value).await
    }

    /// Stream of posted values. Ends when the channel is closed.
    pub fn observe(&self) -> BoxStream<'static, SE> {
        let state = (Arc::clone(&self.rx), self.shutdown.clone());
        futures::stream::unfold(state, |(rx, shutdown)| async move {
            let next = {
                let mut guard = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return None,
                    guard = rx.lock() => guard,
                };
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => None,
                    value = guard.recv() => value,
                }
            };
            next.map(|value| (value, (rx, shutdown)))
        })
        .boxed()
    }

    /// End every observer stream and reject further posts.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn values_are_delivered_in_post_order() {
        let channel = SideEffectChannel::<String>::new(BufferCapacity::Unlimited);
        let mut effects = channel.observe();

        for n in 1..=4 {
            channel.post(n.to_string()).await.unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(effects.next().await.unwrap());
        }
        assert_eq!(seen, vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn values_posted_before_observing_are_kept() {
        let channel = SideEffectChannel::<u32>::new(BufferCapacity::Bounded(8));
        channel.post(1).await.unwrap();
        channel.post(2).await.unwrap();

        let mut effects = channel.observe();
        assert_eq!(effects.next().await, Some(1));
        assert_eq!(effects.next().await, Some(2));
    }

    #[tokio::test]
    async fn bounded_post_waits_for_capacity() {
        let channel = SideEffectChannel::<u32>::new(BufferCapacity::Bounded(1));
        channel.post(1).await.unwrap();

        let sender = channel.sender();
        let blocked = tokio::time::timeout(Duration::from_millis(50), sender.post(2)).await;
        assert!(blocked.is_err(), "second post should wait while the buffer is full");

        let mut effects = channel.observe();
        assert_eq!(effects.next().await, Some(1));
        sender.post(3).await.unwrap();
        assert_eq!(effects.next().await, Some(3));
    }

    #[tokio::test]
    async fn zero_capacity_is_treated_as_one() {
        let channel = SideEffectChannel::<u32>::new(BufferCapacity::Bounded(0));
        channel.post(9).await.unwrap();
        assert_eq!(channel.observe().next().await, Some(9));
    }

    #[tokio::test]
    async fn close_ends_streams_and_rejects_posts() {
        let channel = SideEffectChannel::<u32>::new(BufferCapacity::Unlimited);
        let effects = channel.observe();
        channel.close();

        let seen: Vec<u32> = effects.collect().await;
        assert!(seen.is_empty());
        assert!(matches!(
            channel.post(1).await,
            Err(ExecutionError::ContainerClosed)
        ));
        assert!(channel.is_closed());
    }

    #[tokio::test]
    async fn close_releases_a_blocked_poster() {
        let channel = SideEffectChannel::<u32>::new(BufferCapacity::Bounded(1));
        channel.post(1).await.unwrap();
        let sender = channel.sender();

        let waiting = tokio::spawn(async move { sender.post(2).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        channel.close();

        let result = waiting.await.unwrap();
        assert!(matches!(result, Err(ExecutionError::ContainerClosed)));
    }
}
