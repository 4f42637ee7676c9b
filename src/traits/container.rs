// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::Settings;
use crate::engine::Pipeline;
use crate::errors::ExecutionError;

/// Bounds every container state type must satisfy.
///
/// States are immutable values: a reduce produces a new one, and equality is
/// used to suppress consecutive duplicates on the state stream.
pub trait StateValue: Clone + PartialEq + Debug + Send + Sync + 'static {}

impl<T> StateValue for T where T: Clone + PartialEq + Debug + Send + Sync + 'static {}

/// Bounds every side-effect type must satisfy.
pub trait SideEffectValue: Debug + Send + 'static {}

impl<T> SideEffectValue for T where T: Debug + Send + 'static {}

/// Callback run once when a lazily created container is first attached to.
pub type OnCreate<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// The MVI container surface seen by hosts and observers.
///
/// Hosts receive their container through their constructor as an
/// `Arc<dyn Container<S, SE>>`, so tests can hand them a
/// [`TestContainer`](crate::testing::TestContainer) instead of a
/// [`RealContainer`](crate::container::RealContainer).
#[async_trait]
pub trait Container<S: StateValue, SE: SideEffectValue>: Send + Sync {
    /// The latest state. Never blocks.
    fn current_state(&self) -> S;

    /// Stream of states: the current value first, then every distinct change.
    fn observe_state(&self) -> BoxStream<'static, S>;

    /// Stream of posted side effects, intended for a single consumer.
    ///
    /// Attaching several consumers makes them compete for values; each value
    /// is still delivered once. Callers own that choice.
    fn observe_side_effects(&self) -> BoxStream<'static, SE>;

    /// Submit an intent for execution.
    ///
    /// A production container only enqueues the pipeline and returns; the
    /// result reports whether it was accepted. A synchronous test container
    /// runs it to completion first and returns its outcome.
    async fn dispatch(&self, pipeline: Pipeline<S, SE>) -> Result<(), ExecutionError>;

    /// The lazy on-create callback, if this container (or one it decorates) has one.
    fn on_create(&self) -> Option<OnCreate<S>> {
        None
    }

    /// The settings this container runs with, if it owns any.
    ///
    /// The test harness builds its stand-in from these, so a host under test
    /// runs with the same registry and buffer as in production.
    fn settings(&self) -> Option<Settings<S, SE>> {
        None
    }
}
