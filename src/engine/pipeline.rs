// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipelines and the typed builder that assembles them.
//!
//! A [`Pipeline`] is an immutable, ordered list of [`Operator`]s plus the
//! event that seeds its first stage. [`PipelineBuilder`] tracks the event type
//! flowing out of the last stage so every closure is written against concrete
//! types; the type erasure is confined to this module.
//!
//! # Examples
//!
//! ```rust
//! use the_orbit::engine::{OperatorKind, PipelineBuilder};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Counter {
//!     id: i32,
//! }
//!
//! let pipeline = PipelineBuilder::<Counter, String, ()>::with_input(10)
//!     .named("add_five")
//!     .transform(|ctx| async move { Ok(ctx.event + 5) })
//!     .reduce(|ctx| Counter { id: *ctx.event })
//!     .build();
//!
//! assert_eq!(pipeline.intent(), "add_five");
//! assert_eq!(pipeline.kinds(), vec![OperatorKind::TransformOne, OperatorKind::Reduce]);
//! ```

use futures::{FutureExt, Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::consts::ANONYMOUS_INTENT;
use crate::container::StateReader;
use crate::engine::operator::{
    downcast_event, event_ref, Event, EventStream, Operator, OperatorKind,
};
use crate::traits::{SideEffectValue, StateValue};

type Seed = Arc<dyn Fn() -> Event + Send + Sync>;

/// An ordered, immutable sequence of stages submitted as one intent.
pub struct Pipeline<S, SE> {
    name: Option<Arc<str>>,
    seed: Seed,
    stages: Arc<[Arc<Operator<S, SE>>]>,
}

impl<S, SE> Pipeline<S, SE> {
    /// A pipeline with no stages, seeded with `()`.
    pub fn empty() -> Self {
        Self {
            name: None,
            seed: Arc::new(|| Box::new(()) as Event),
            stages: Arc::from(Vec::new()),
        }
    }

    /// Return a new pipeline with `operator` appended. `self` is left untouched.
    pub fn append(&self, operator: Operator<S, SE>) -> Self {
        let mut stages: Vec<Arc<Operator<S, SE>>> = self.stages.iter().cloned().collect();
        stages.push(Arc::new(operator));
        Self {
            name: self.name.clone(),
            seed: Arc::clone(&self.seed),
            stages: Arc::from(stages),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The intent name used in logs and loop-back accounting.
    pub fn intent(&self) -> &str {
        self.name().unwrap_or(ANONYMOUS_INTENT)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn kinds(&self) -> Vec<OperatorKind> {
        self.stages.iter().map(|op| op.kind()).collect()
    }

    pub(crate) fn stages(&self) -> Arc<[Arc<Operator<S, SE>>]> {
        Arc::clone(&self.stages)
    }

    pub(crate) fn seed_event(&self) -> Event {
        (self.seed)()
    }

    fn with_name(&self, name: &str) -> Self {
        Self {
            name: Some(Arc::from(name)),
            seed: Arc::clone(&self.seed),
            stages: Arc::clone(&self.stages),
        }
    }

    fn with_seed(&self, seed: Seed) -> Self {
        Self {
            name: self.name.clone(),
            seed,
            stages: Arc::clone(&self.stages),
        }
    }
}

impl<S, SE> Clone for Pipeline<S, SE> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            seed: Arc::clone(&self.seed),
            stages: Arc::clone(&self.stages),
        }
    }
}

impl<S, SE> fmt::Debug for Pipeline<S, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("intent", &self.intent())
            .field("stages", &self.kinds())
            .finish()
    }
}

/// Owned view handed to transform stages.
pub struct TransformContext<S, E> {
    pub event: E,
    state: StateReader<S>,
}

impl<S: StateValue, E> TransformContext<S, E> {
    /// The container's state at the time of the call.
    pub fn state(&self) -> S {
        self.state.get()
    }

    /// A reader that stays valid after the context is consumed.
    pub fn reader(&self) -> StateReader<S> {
        self.state.clone()
    }
}

/// Borrowed view handed to reduce and side-effect stages.
pub struct StageContext<'a, S, E> {
    pub state: &'a S,
    pub event: &'a E,
}

/// Typed builder for [`Pipeline`]. `E` is the event type produced by the last stage.
///
/// Every method consumes the builder and returns a new one; clones taken
/// earlier keep their own stage list.
pub struct PipelineBuilder<S, SE, E> {
    pipeline: Pipeline<S, SE>,
    track_idling: bool,
    _event: PhantomData<fn() -> E>,
}

impl<S, SE, E> Clone for PipelineBuilder<S, SE, E> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            track_idling: self.track_idling,
            _event: PhantomData,
        }
    }
}

impl<S: StateValue, SE: SideEffectValue> PipelineBuilder<S, SE, ()> {
    /// Start an empty pipeline whose first stage receives `()`.
    pub fn new() -> Self {
        Self {
            pipeline: Pipeline::empty(),
            track_idling: true,
            _event: PhantomData,
        }
    }

    /// Start an empty pipeline whose first stage receives `input`.
    pub fn with_input<I>(input: I) -> PipelineBuilder<S, SE, I>
    where
        I: Clone + Send + Sync + 'static,
    {
        let seed: Seed = Arc::new(move || Box::new(input.clone()) as Event);
        PipelineBuilder {
            pipeline: Pipeline::empty().with_seed(seed),
            track_idling: true,
            _event: PhantomData,
        }
    }
}

impl<S: StateValue, SE: SideEffectValue> Default for PipelineBuilder<S, SE, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, SE, E> PipelineBuilder<S, SE, E>
where
    S: StateValue,
    SE: SideEffectValue,
    E: Send + Sync + 'static,
{
    /// Name the intent. Used for tracing and for loop-back counts in tests.
    pub fn named(self, name: &str) -> Self {
        Self {
            pipeline: self.pipeline.with_name(name),
            ..self
        }
    }

    /// Whether stages appended from here on report to the idling resource.
    pub fn register_idling(self, enabled: bool) -> Self {
        Self {
            track_idling: enabled,
            ..self
        }
    }

    /// Append a single-value transform. The future may suspend.
    pub fn transform<F, Fut, N>(self, work: F) -> PipelineBuilder<S, SE, N>
    where
        F: Fn(TransformContext<S, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<N>> + Send + 'static,
        N: Send + Sync + 'static,
    {
        let operator = Operator::TransformOne {
            work: Arc::new(move |state: StateReader<S>, event: Event| {
                match downcast_event::<E>(event) {
                    Ok(event) => {
                        let fut = work(TransformContext { event, state });
                        async move { fut.await.map(|next| Box::new(next) as Event) }.boxed()
                    }
                    Err(err) => futures::future::ready(Err(err)).boxed(),
                }
            }),
            idling_tracked: self.track_idling,
        };
        self.push(operator)
    }

    /// Append a multi-value transform. Every value the stream yields runs the
    /// remaining stages as its own concurrent continuation.
    pub fn transform_many<F, St, N>(self, work: F) -> PipelineBuilder<S, SE, N>
    where
        F: Fn(TransformContext<S, E>) -> St + Send + Sync + 'static,
        St: Stream<Item = N> + Send + 'static,
        N: Send + Sync + 'static,
    {
        self.try_transform_many(move |ctx| work(ctx).map(anyhow::Ok))
    }

    /// Append a multi-value transform whose source can fail part way through.
    ///
    /// An `Err` item ends the lineage and cancels the continuations still
    /// running for earlier values.
    pub fn try_transform_many<F, St, N>(self, work: F) -> PipelineBuilder<S, SE, N>
    where
        F: Fn(TransformContext<S, E>) -> St + Send + Sync + 'static,
        St: Stream<Item = anyhow::Result<N>> + Send + 'static,
        N: Send + Sync + 'static,
    {
        let erased = move |state: StateReader<S>, event: Event| -> anyhow::Result<EventStream> {
            let event = downcast_event::<E>(event)?;
            Ok(work(TransformContext { event, state })
                .map(|next| next.map(|next| Box::new(next) as Event))
                .boxed())
        };
        let operator = Operator::TransformMany {
            work: Arc::new(erased),
            idling_tracked: self.track_idling,
        };
        self.push(operator)
    }

    /// Append a reducer. The event passes through unchanged.
    pub fn reduce<F>(self, reducer: F) -> Self
    where
        F: Fn(StageContext<'_, S, E>) -> S + Send + Sync + 'static,
    {
        self.try_reduce(move |ctx| Ok(reducer(ctx)))
    }

    /// Append a fallible reducer. On error the state is left unchanged and
    /// the lineage terminates.
    pub fn try_reduce<F>(self, reducer: F) -> Self
    where
        F: Fn(StageContext<'_, S, E>) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        let operator = Operator::Reduce {
            work: Arc::new(move |state: &S, event: &Event| {
                let event = event_ref::<E>(event)?;
                reducer(StageContext { state, event })
            }),
            idling_tracked: self.track_idling,
        };
        self.push_same(operator)
    }

    /// Append a side-effect stage that may post a value. The event passes
    /// through unchanged.
    pub fn side_effect<F>(self, work: F) -> Self
    where
        F: Fn(StageContext<'_, S, E>) -> Option<SE> + Send + Sync + 'static,
    {
        let operator = Operator::SideEffect {
            work: Arc::new(move |state: &S, event: &Event| -> anyhow::Result<Option<SE>> {
                let event = event_ref::<E>(event)?;
                Ok(work(StageContext { state, event }))
            }),
            idling_tracked: self.track_idling,
        };
        self.push_same(operator)
    }

    /// Append a side-effect stage that always posts.
    pub fn post_side_effect<F>(self, work: F) -> Self
    where
        F: Fn(StageContext<'_, S, E>) -> SE + Send + Sync + 'static,
    {
        self.side_effect(move |ctx| Some(work(ctx)))
    }

    pub fn build(self) -> Pipeline<S, SE> {
        self.pipeline
    }

    fn push<N>(self, operator: Operator<S, SE>) -> PipelineBuilder<S, SE, N> {
        PipelineBuilder {
            pipeline: self.pipeline.append(operator),
            track_idling: self.track_idling,
            _event: PhantomData,
        }
    }

    fn push_same(self, operator: Operator<S, SE>) -> Self {
        self.push(operator)
    }
}

impl<S, SE, E> From<PipelineBuilder<S, SE, E>> for Pipeline<S, SE> {
    fn from(builder: PipelineBuilder<S, SE, E>) -> Self {
        builder.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::StateContainer;

    #[derive(Debug, Clone, PartialEq)]
    struct TestState {
        id: i32,
    }

    fn builder() -> PipelineBuilder<TestState, String, ()> {
        PipelineBuilder::new()
    }

    #[test]
    fn empty_pipeline_has_no_stages() {
        let pipeline: Pipeline<TestState, String> = Pipeline::empty();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.intent(), ANONYMOUS_INTENT);
    }

    #[test]
    fn appending_leaves_earlier_values_intact() {
        let first = builder().reduce(|ctx| ctx.state.clone());
        let second = first.clone().post_side_effect(|_| "posted".to_string());
        let third = first.clone().transform(|_| async { Ok(1_u8) });

        assert_eq!(first.build().kinds(), vec![OperatorKind::Reduce]);
        assert_eq!(
            second.build().kinds(),
            vec![OperatorKind::Reduce, OperatorKind::SideEffect]
        );
        assert_eq!(
            third.build().kinds(),
            vec![OperatorKind::Reduce, OperatorKind::TransformOne]
        );
    }

    #[test]
    fn register_idling_applies_to_later_stages_only() {
        let pipeline = builder()
            .reduce(|ctx| ctx.state.clone())
            .register_idling(false)
            .reduce(|ctx| ctx.state.clone())
            .build();

        let tracked: Vec<bool> = pipeline.stages().iter().map(|op| op.idling_tracked()).collect();
        assert_eq!(tracked, vec![true, false]);
    }

    #[test]
    fn naming_keeps_stages() {
        let pipeline = builder()
            .transform_many(|_| futures::stream::iter(vec![1, 2]))
            .named("fan")
            .build();

        assert_eq!(pipeline.name(), Some("fan"));
        assert_eq!(pipeline.kinds(), vec![OperatorKind::TransformMany]);
    }

    #[tokio::test]
    async fn source_errors_pass_through_the_erased_stream() {
        let pipeline = builder()
            .try_transform_many(|_| {
                futures::stream::iter(vec![Ok(1_i32), Err(anyhow::anyhow!("source failed"))])
            })
            .build();
        let stages = pipeline.stages();
        let Operator::TransformMany { work, .. } = &*stages[0] else {
            panic!("expected a multi-value transform");
        };
        let reader = StateReader::new(Arc::new(StateContainer::new(TestState { id: 0 })));

        let items: Vec<anyhow::Result<Event>> =
            work(reader, pipeline.seed_event()).unwrap().collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().downcast_ref::<i32>(), Some(&1));
        assert_eq!(items[1].as_ref().unwrap_err().to_string(), "source failed");
    }

    #[test]
    fn seed_is_produced_fresh_for_every_run() {
        let pipeline = PipelineBuilder::<TestState, String, ()>::with_input(10_i32).build();
        for _ in 0..2 {
            let event = pipeline.seed_event();
            assert_eq!(*event.downcast_ref::<i32>().unwrap(), 10);
        }
    }
}
