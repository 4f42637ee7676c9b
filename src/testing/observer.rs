// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Records every value a stream emits, on a background task.
///
/// Recording stops when the observer is dropped.
pub struct TestStreamObserver<T> {
    values: Arc<Mutex<Vec<T>>>,
    changed: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<T: Clone + Send + 'static> TestStreamObserver<T> {
    /// Start recording `stream`. Must be called from within a tokio runtime.
    pub fn spawn(mut stream: BoxStream<'static, T>) -> Self {
        let values = Arc::new(Mutex::new(Vec::new()));
        let changed = Arc::new(Notify::new());

        let task = {
            let values = Arc::clone(&values);
            let changed = Arc::clone(&changed);
            tokio::spawn(async move {
                while let Some(value) = stream.next().await {
                    values
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(value);
                    changed.notify_waiters();
                }
            })
        };

        Self {
            values,
            changed,
            task,
        }
    }

    pub fn values(&self) -> Vec<T> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` values were recorded. Returns `false` on timeout.
    pub async fn await_count(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.changed.notified();
                if self.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

impl<T> Drop for TestStreamObserver<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
