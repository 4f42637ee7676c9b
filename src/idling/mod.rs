// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Idling resources report whether tracked stage work is in flight.
//!
//! Test tooling uses them to wait for a container to settle instead of
//! sleeping. The container increments before a tracked stage starts and
//! decrements when it ends, through an [`IdlingGuard`] so that failures and
//! cancellation are counted too.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::traits::IdlingResource;

/// Ignores every call. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIdlingResource;

impl IdlingResource for NoopIdlingResource {
    fn increment(&self) {}

    fn decrement(&self) {}

    fn is_idle(&self) -> bool {
        true
    }

    fn close(&self) {}
}

/// Counts tracked work and wakes waiters when the count returns to zero.
#[derive(Debug, Default)]
pub struct CountingIdlingResource {
    busy: AtomicUsize,
    closed: AtomicBool,
    idle: Notify,
}

impl CountingIdlingResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn busy_count(&self) -> usize {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until no tracked work is running. Returns `false` on timeout.
    pub async fn wait_for_idle(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.idle.notified();
                if self.is_idle() {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

impl IdlingResource for CountingIdlingResource {
    fn increment(&self) {
        self.busy.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        let previous = self
            .busy
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        if previous <= 1 {
            self.idle.notify_waiters();
        }
    }

    fn is_idle(&self) -> bool {
        self.busy_count() == 0
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.idle.notify_waiters();
    }
}

/// Holds one increment on an idling resource until dropped.
pub struct IdlingGuard {
    resource: Arc<dyn IdlingResource>,
}

impl IdlingGuard {
    pub fn new(resource: Arc<dyn IdlingResource>) -> Self {
        resource.increment();
        Self { resource }
    }

    /// A guard only when `tracked`; untracked stages get `None`.
    pub fn track(resource: &Arc<dyn IdlingResource>, tracked: bool) -> Option<Self> {
        tracked.then(|| Self::new(Arc::clone(resource)))
    }
}

impl Drop for IdlingGuard {
    fn drop(&mut self) {
        self.resource.decrement();
    }
}
