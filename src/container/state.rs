// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::observability::messages::container::StatePublished;
use crate::observability::messages::StructuredLog;
use crate::traits::StateValue;

struct Shared<S> {
    value: S,
    observers: Vec<mpsc::UnboundedSender<S>>,
    closed: bool,
}

/// Holds the single authoritative state value and broadcasts its changes.
///
/// Writes go through [`reduce`](Self::reduce), which serializes on an async
/// lock. The reducer itself is synchronous, so once the lock is held the
/// update always runs to completion. Publication to observers happens under
/// the same lock that registers new observers, so every observer sees the
/// current value first and then each later change exactly once, in order.
pub struct StateContainer<S> {
    shared: Mutex<Shared<S>>,
    reduce_lock: tokio::sync::Mutex<()>,
}

impl<S: StateValue> StateContainer<S> {
    pub fn new(initial: S) -> Self {
        Self {
            shared: Mutex::new(Shared {
                value: initial,
                observers: Vec::new(),
                closed: false,
            }),
            reduce_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The latest state. Never waits on a running reduce.
    pub fn current(&self) -> S {
        self.lock().value.clone()
    }

    /// Replay the current value, then every distinct change.
    ///
    /// After [`close`](Self::close) the stream yields the current value and ends.
    pub fn observe(&self) -> BoxStream<'static, S> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut shared = self.lock();
            let _ = tx.send(shared.value.clone());
            if !shared.closed {
                shared.observers.push(tx);
            }
        }
        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|value| (value, rx))
        })
        .boxed()
    }

    /// Replace the state with `reducer(&current)`.
    ///
    /// Returns `Ok(true)` when the state changed and was published, `Ok(false)`
    /// when the reducer returned an equal value. On error the state is untouched.
    pub async fn reduce<F>(&self, reducer: F) -> anyhow::Result<bool>
    where
        F: FnOnce(&S) -> anyhow::Result<S> + Send,
    {
        let _guard = self.reduce_lock.lock().await;
        let prior = self.current();
        let next = reducer(&prior)?;
        if next == prior {
            return Ok(false);
        }
        self.publish(next);
        Ok(true)
    }

    /// Stop broadcasting. Existing observer streams end once drained.
    pub fn close(&self) {
        let mut shared = self.lock();
        shared.closed = true;
        shared.observers.clear();
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn publish(&self, next: S) {
        let mut shared = self.lock();
        shared.observers.retain(|observer| observer.send(next.clone()).is_ok());
        shared.value = next;
        StatePublished {
            observers: shared.observers.len(),
        }
        .log();
    }

    fn lock(&self) -> MutexGuard<'_, Shared<S>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only handle to a [`StateContainer`], handed to transform stages.
pub struct StateReader<S> {
    container: Arc<StateContainer<S>>,
}

impl<S: StateValue> StateReader<S> {
    pub fn new(container: Arc<StateContainer<S>>) -> Self {
        Self { container }
    }

    pub fn get(&self) -> S {
        self.container.current()
    }
}

impl<S> Clone for StateReader<S> {
    fn clone(&self) -> Self {
        Self {
            container: Arc::clone(&self.container),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestState {
        id: i32,
    }

    #[tokio::test]
    async fn observer_sees_current_value_first() {
        let container = StateContainer::new(TestState { id: 1 });
        let mut states = container.observe();

        assert_eq!(states.next().await, Some(TestState { id: 1 }));
    }

    #[tokio::test]
    async fn equal_values_are_not_republished() {
        let container = StateContainer::new(TestState { id: 0 });
        let mut states = container.observe();

        for id in [0, 1, 1, 2, 2, 2, 1] {
            container.reduce(|_| Ok(TestState { id })).await.unwrap();
        }
        container.close();

        let seen: Vec<i32> = states.by_ref().map(|s| s.id).collect().await;
        assert_eq!(seen, vec![0, 1, 2, 1]);
    }

    #[tokio::test]
    async fn failing_reducer_leaves_state_unchanged() {
        let container = StateContainer::new(TestState { id: 7 });

        let result = container
            .reduce(|_| Err(anyhow::anyhow!("reducer failed")))
            .await;

        assert!(result.is_err());
        assert_eq!(container.current(), TestState { id: 7 });

        let changed = container
            .reduce(|s| Ok(TestState { id: s.id + 1 }))
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(container.current(), TestState { id: 8 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reduces_lose_no_update() {
        let container = Arc::new(StateContainer::new(TestState { id: 0 }));
        let tasks: Vec<_> = (0..200)
            .map(|_| {
                let container = Arc::clone(&container);
                tokio::spawn(async move {
                    container
                        .reduce(|s| Ok(TestState { id: s.id + 1 }))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(container.current().id, 200);
    }

    #[tokio::test]
    async fn observe_after_close_replays_and_ends() {
        let container = StateContainer::new(TestState { id: 3 });
        container.close();

        let seen: Vec<TestState> = container.observe().collect().await;
        assert_eq!(seen, vec![TestState { id: 3 }]);
        assert_eq!(container.observer_count(), 0);
    }

    #[tokio::test]
    async fn dropped_observers_are_pruned() {
        let container = StateContainer::new(TestState { id: 0 });
        let states = container.observe();
        assert_eq!(container.observer_count(), 1);

        drop(states);
        container.reduce(|_| Ok(TestState { id: 1 })).await.unwrap();

        assert_eq!(container.observer_count(), 0);
        let reader = StateReader::new(Arc::new(container));
        assert_eq!(reader.get(), TestState { id: 1 });
    }
}
