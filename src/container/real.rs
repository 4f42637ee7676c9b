// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Settings;
use crate::container::side_effect::SideEffectChannel;
use crate::container::state::StateContainer;
use crate::engine::{execute_pipeline, DispatchLoop, ExecutionScope, Pipeline};
use crate::errors::ExecutionError;
use crate::observability::messages::container::{ContainerClosed, ContainerCreated, DispatchRejected};
use crate::observability::messages::StructuredLog;
use crate::traits::{Container, SideEffectValue, StateValue};

struct Inner<S: StateValue, SE: SideEffectValue> {
    state: Arc<StateContainer<S>>,
    side_effects: SideEffectChannel<SE>,
    settings: Arc<Settings<S, SE>>,
    scope: ExecutionScope<S, SE>,
    dispatcher: DispatchLoop<S, SE>,
    closed: AtomicBool,
}

impl<S: StateValue, SE: SideEffectValue> Inner<S, SE> {
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        ContainerClosed {
            // The loop task itself is tracked alongside the executions.
            in_flight: self.dispatcher.in_flight().saturating_sub(1),
        }
        .log();
        self.dispatcher.shutdown();
        self.side_effects.close();
        self.state.close();
        self.settings.idling_registry.close();
    }
}

impl<S: StateValue, SE: SideEffectValue> Drop for Inner<S, SE> {
    fn drop(&mut self) {
        self.close();
    }
}

/// The production container.
///
/// Cloning is cheap and every clone shares the same state, channel and
/// dispatch loop. Dropping the last clone closes the container.
///
/// # Example
/// ```rust
/// use futures::StreamExt;
/// use the_orbit::config::Settings;
/// use the_orbit::container::RealContainer;
/// use the_orbit::engine::PipelineBuilder;
/// use the_orbit::traits::Container;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), the_orbit::errors::ExecutionError> {
/// let container: RealContainer<i32, String> = RealContainer::create(0, Settings::default());
/// let mut states = container.observe_state();
///
/// let pipeline = PipelineBuilder::<i32, String, ()>::with_input(5)
///     .reduce(|ctx| ctx.state + *ctx.event)
///     .build();
/// container.dispatch(pipeline).await?;
///
/// assert_eq!(states.next().await, Some(0));
/// assert_eq!(states.next().await, Some(5));
/// # Ok(())
/// # }
/// ```
pub struct RealContainer<S: StateValue, SE: SideEffectValue> {
    inner: Arc<Inner<S, SE>>,
}

impl<S: StateValue, SE: SideEffectValue> Clone for RealContainer<S, SE> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: StateValue, SE: SideEffectValue> RealContainer<S, SE> {
    /// Create a container and start its dispatch loop.
    ///
    /// Must be called from within a tokio runtime unless
    /// `settings.pipeline_context` names an explicit runtime.
    pub fn create(initial_state: S, settings: Settings<S, SE>) -> Self {
        let settings = Arc::new(settings);
        let state = Arc::new(StateContainer::new(initial_state));
        let side_effects = SideEffectChannel::new(settings.side_effect_buffer);
        let scope = ExecutionScope::new(
            Arc::clone(&state),
            side_effects.sender(),
            Arc::clone(&settings),
        );
        let dispatcher = DispatchLoop::start(scope.clone());

        ContainerCreated {
            side_effect_buffer: &settings.side_effect_buffer.to_string(),
            registered_kinds: settings.registry.registered_kinds().len(),
        }
        .log();

        Self {
            inner: Arc::new(Inner {
                state,
                side_effects,
                settings,
                scope,
                dispatcher,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Tear the container down. Idempotent.
    ///
    /// In-flight pipelines are cancelled at their next suspension point, both
    /// observer streams end and the idling resource is closed.
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> &Settings<S, SE> {
        &self.inner.settings
    }

    /// Run `pipeline` to completion on the caller's task, bypassing the
    /// dispatch loop. Stage failures are returned to the caller.
    pub async fn run_inline(&self, pipeline: Pipeline<S, SE>) -> Result<(), ExecutionError> {
        if self.is_closed() {
            DispatchRejected {
                intent: pipeline.intent(),
            }
            .log();
            return Err(ExecutionError::ContainerClosed);
        }
        execute_pipeline(pipeline, self.inner.scope.clone()).await
    }

    /// Wait for the dispatch loop and its executions to finish after
    /// [`close`](Self::close).
    pub async fn join(&self) {
        self.inner.dispatcher.wait().await;
    }
}

#[async_trait]
impl<S: StateValue, SE: SideEffectValue> Container<S, SE> for RealContainer<S, SE> {
    fn current_state(&self) -> S {
        self.inner.state.current()
    }

    fn observe_state(&self) -> BoxStream<'static, S> {
        self.inner.state.observe()
    }

    fn observe_side_effects(&self) -> BoxStream<'static, SE> {
        self.inner.side_effects.observe()
    }

    async fn dispatch(&self, pipeline: Pipeline<S, SE>) -> Result<(), ExecutionError> {
        if self.is_closed() {
            DispatchRejected {
                intent: pipeline.intent(),
            }
            .log();
            return Err(ExecutionError::ContainerClosed);
        }
        self.inner.dispatcher.submit(pipeline)
    }

    fn settings(&self) -> Option<Settings<S, SE>> {
        Some(Settings::clone(&self.inner.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferCapacity;
    use crate::engine::PipelineBuilder;
    use crate::idling::CountingIdlingResource;
    use futures::StreamExt;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct TestState {
        id: i32,
    }

    fn container(id: i32) -> RealContainer<TestState, String> {
        RealContainer::create(TestState { id }, Settings::default())
    }

    #[tokio::test]
    async fn dispatched_pipeline_updates_state() {
        let container = container(0);
        let mut states = container.observe_state();

        let pipeline = PipelineBuilder::<TestState, String, ()>::with_input(3_i32)
            .reduce(|ctx| TestState {
                id: ctx.state.id + *ctx.event,
            })
            .build();
        container.dispatch(pipeline).await.unwrap();

        assert_eq!(states.next().await, Some(TestState { id: 0 }));
        assert_eq!(states.next().await, Some(TestState { id: 3 }));
        assert_eq!(container.current_state(), TestState { id: 3 });
    }

    #[tokio::test]
    async fn run_inline_returns_stage_failures() {
        let container = container(1);
        let pipeline = PipelineBuilder::<TestState, String, ()>::new()
            .try_reduce(|_| Err(anyhow::anyhow!("nope")))
            .build();

        let err = container.run_inline(pipeline).await.unwrap_err();
        assert!(matches!(err, ExecutionError::StageFailed { .. }));
        assert_eq!(container.current_state(), TestState { id: 1 });
    }

    #[tokio::test]
    async fn close_ends_streams_and_rejects_dispatch() {
        let counting = Arc::new(CountingIdlingResource::new());
        let settings = Settings::default()
            .with_idling(counting.clone())
            .with_side_effect_buffer(BufferCapacity::Bounded(4));
        let container: RealContainer<TestState, String> =
            RealContainer::create(TestState { id: 5 }, settings);
        let states = container.observe_state();
        let effects = container.observe_side_effects();

        container.close();
        container.close();

        let seen: Vec<TestState> = states.collect().await;
        assert_eq!(seen, vec![TestState { id: 5 }]);
        assert!(effects.collect::<Vec<String>>().await.is_empty());
        assert!(counting.is_closed());

        let err = container
            .dispatch(PipelineBuilder::new().build())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::ContainerClosed));

        tokio::time::timeout(Duration::from_secs(1), container.join())
            .await
            .expect("dispatch loop should stop after close");
    }

    #[tokio::test]
    async fn close_cancels_suspended_pipelines() {
        let container = container(0);
        let pipeline = PipelineBuilder::<TestState, String, ()>::new()
            .transform(|_| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(1_i32)
            })
            .reduce(|ctx| TestState { id: *ctx.event })
            .build();
        container.dispatch(pipeline).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        container.close();
        tokio::time::timeout(Duration::from_secs(1), container.join())
            .await
            .expect("suspended pipeline should be cancelled");
        assert_eq!(container.current_state(), TestState { id: 0 });
    }

    #[tokio::test]
    async fn dropping_last_clone_closes_the_container() {
        let container = container(0);
        let states = container.observe_state();
        let clone = container.clone();

        drop(container);
        assert!(!clone.is_closed());
        drop(clone);

        let seen: Vec<TestState> = states.collect().await;
        assert_eq!(seen, vec![TestState { id: 0 }]);
    }
}
