// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Settings;
use crate::engine::Pipeline;
use crate::errors::ExecutionError;
use crate::traits::{Container, OnCreate, SideEffectValue, StateValue};

/// Defers a one-time `on_create` callback until the container is first used.
///
/// The callback runs with the current state on the first `observe_state`,
/// `observe_side_effects` or `dispatch`, or on an explicit
/// [`trigger`](Self::trigger), whichever comes first. Reading the current
/// state does not count as use.
pub struct LazyCreateContainer<S, SE, C> {
    actual: C,
    on_create: OnCreate<S>,
    created: AtomicBool,
    _side_effect: PhantomData<fn() -> SE>,
}

impl<S, SE, C> LazyCreateContainer<S, SE, C>
where
    S: StateValue,
    SE: SideEffectValue,
    C: Container<S, SE>,
{
    pub fn new<F>(actual: C, on_create: F) -> Self
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        Self {
            actual,
            on_create: Arc::new(on_create),
            created: AtomicBool::new(false),
            _side_effect: PhantomData,
        }
    }

    /// Run the callback now unless it already ran.
    pub fn trigger(&self) {
        if self
            .created
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            (self.on_create)(&self.actual.current_state());
        }
    }

    pub fn is_created(&self) -> bool {
        self.created.load(Ordering::SeqCst)
    }

    pub fn actual(&self) -> &C {
        &self.actual
    }
}

#[async_trait]
impl<S, SE, C> Container<S, SE> for LazyCreateContainer<S, SE, C>
where
    S: StateValue,
    SE: SideEffectValue,
    C: Container<S, SE>,
{
    fn current_state(&self) -> S {
        self.actual.current_state()
    }

    fn observe_state(&self) -> BoxStream<'static, S> {
        self.trigger();
        self.actual.observe_state()
    }

    fn observe_side_effects(&self) -> BoxStream<'static, SE> {
        self.trigger();
        self.actual.observe_side_effects()
    }

    async fn dispatch(&self, pipeline: Pipeline<S, SE>) -> Result<(), ExecutionError> {
        self.trigger();
        self.actual.dispatch(pipeline).await
    }

    fn on_create(&self) -> Option<OnCreate<S>> {
        Some(Arc::clone(&self.on_create))
    }

    fn settings(&self) -> Option<Settings<S, SE>> {
        self.actual.settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::container::RealContainer;
    use std::sync::atomic::AtomicUsize;

    fn lazy(
        calls: Arc<AtomicUsize>,
    ) -> Arc<LazyCreateContainer<u32, String, RealContainer<u32, String>>> {
        let actual = RealContainer::create(7, Settings::default());
        Arc::new(LazyCreateContainer::new(actual, move |state: &u32| {
            assert_eq!(*state, 7);
            calls.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[tokio::test]
    async fn reading_state_does_not_trigger() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = lazy(calls.clone());

        assert_eq!(container.current_state(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!container.is_created());
    }

    #[tokio::test]
    async fn every_kind_of_use_triggers_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = lazy(calls.clone());

        let _states = container.observe_state();
        let _effects = container.observe_side_effects();
        container.dispatch(Pipeline::empty()).await.unwrap();
        container.trigger();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_observers_trigger_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = lazy(calls.clone());

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let container = Arc::clone(&container);
                tokio::spawn(async move {
                    drop(container.observe_state());
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exposes_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = lazy(calls.clone());
        let as_dyn: Arc<dyn Container<u32, String>> = container;

        let callback = as_dyn.on_create().expect("lazy container has a callback");
        callback(&7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
