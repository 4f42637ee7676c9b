// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{ExecutionContext, Operator, StageOutput};
use crate::errors::ExecutionError;
use crate::traits::{OperatorExecutor, SideEffectValue, StateValue};

/// Runs every operator kind in place, on the task walking the pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct StageExecutor;

#[async_trait]
impl<S: StateValue, SE: SideEffectValue> OperatorExecutor<S, SE> for StageExecutor {
    async fn execute(
        &self,
        operator: &Operator<S, SE>,
        context: ExecutionContext<S, SE>,
    ) -> Result<StageOutput<S, SE>, ExecutionError> {
        let kind = operator.kind();
        match operator {
            Operator::TransformOne { work, .. } => {
                let reader = context.reader();
                let (event, scope) = context.into_parts();
                let next = work(reader, event)
                    .await
                    .map_err(|e| ExecutionError::stage(kind, e))?;
                Ok(StageOutput::Next(scope.with_event(next)))
            }
            Operator::TransformMany { work, .. } => {
                let reader = context.reader();
                let (event, scope) = context.into_parts();
                let events = work(reader, event).map_err(|e| ExecutionError::stage(kind, e))?;
                Ok(StageOutput::FanOut { scope, events })
            }
            Operator::Reduce { work, .. } => {
                let event = context.event();
                context
                    .reduce(|state| work(state, event))
                    .await
                    .map_err(|e| ExecutionError::stage(kind, e))?;
                Ok(StageOutput::Next(context))
            }
            Operator::SideEffect { work, .. } => {
                let value = work(&context.state(), context.event())
                    .map_err(|e| ExecutionError::stage(kind, e))?;
                if let Some(side_effect) = value {
                    context.post(side_effect).await?;
                }
                Ok(StageOutput::Next(context))
            }
        }
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BufferCapacity, Settings};
    use crate::container::{SideEffectChannel, StateContainer};
    use crate::engine::{ExecutionScope, PipelineBuilder};
    use futures::StreamExt;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct TestState {
        id: i32,
    }

    struct Fixture {
        state: Arc<StateContainer<TestState>>,
        channel: SideEffectChannel<String>,
        scope: ExecutionScope<TestState, String>,
    }

    fn fixture(id: i32) -> Fixture {
        let state = Arc::new(StateContainer::new(TestState { id }));
        let channel = SideEffectChannel::new(BufferCapacity::Unlimited);
        let scope = ExecutionScope::new(
            Arc::clone(&state),
            channel.sender(),
            Arc::new(Settings::default()),
        );
        Fixture {
            state,
            channel,
            scope,
        }
    }

    fn next(output: StageOutput<TestState, String>) -> ExecutionContext<TestState, String> {
        match output {
            StageOutput::Next(ctx) => ctx,
            StageOutput::FanOut { .. } => panic!("expected a single continuation"),
        }
    }

    #[tokio::test]
    async fn transform_one_replaces_the_event() {
        let f = fixture(0);
        let pipeline = PipelineBuilder::<TestState, String, ()>::with_input(10_i32)
            .transform(|ctx| async move { Ok(ctx.event + 5) })
            .build();
        let stages = pipeline.stages();

        let out = StageExecutor
            .execute(&*stages[0], f.scope.start(&pipeline))
            .await
            .unwrap();
        let ctx = next(out);
        assert_eq!(ctx.event().downcast_ref::<i32>(), Some(&15));
    }

    #[tokio::test]
    async fn transform_many_yields_a_fan_out() {
        let f = fixture(0);
        let pipeline = PipelineBuilder::<TestState, String, ()>::new()
            .transform_many(|_| futures::stream::iter(vec![1_i32, 2, 3]))
            .build();
        let stages = pipeline.stages();

        let out = StageExecutor
            .execute(&*stages[0], f.scope.start(&pipeline))
            .await
            .unwrap();
        let StageOutput::FanOut { events, .. } = out else {
            panic!("expected a fan-out");
        };
        let values: Vec<i32> = events
            .map(|event| *event.unwrap().downcast::<i32>().unwrap())
            .collect()
            .await;
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn reduce_updates_state_and_keeps_event() {
        let f = fixture(1);
        let pipeline = PipelineBuilder::<TestState, String, ()>::with_input(4_i32)
            .reduce(|ctx| TestState {
                id: ctx.state.id + *ctx.event,
            })
            .build();
        let stages = pipeline.stages();

        let ctx = next(
            StageExecutor
                .execute(&*stages[0], f.scope.start(&pipeline))
                .await
                .unwrap(),
        );
        assert_eq!(f.state.current(), TestState { id: 5 });
        assert_eq!(ctx.event().downcast_ref::<i32>(), Some(&4));
    }

    #[tokio::test]
    async fn side_effect_posts_only_when_some() {
        let f = fixture(2);
        let pipeline = PipelineBuilder::<TestState, String, ()>::new()
            .side_effect(|ctx| (ctx.state.id > 5).then(|| "big".to_string()))
            .post_side_effect(|ctx| format!("id={}", ctx.state.id))
            .build();
        let stages = pipeline.stages();

        for (id, expected) in [(2, vec!["id=2"]), (9, vec!["big", "id=9"])] {
            let f = fixture(id);
            let mut ctx = f.scope.start(&pipeline);
            for stage in stages.iter() {
                ctx = next(StageExecutor.execute(stage.as_ref(), ctx).await.unwrap());
            }
            drop(ctx);

            let mut effects = f.channel.observe();
            let mut posted = Vec::new();
            for _ in 0..expected.len() {
                posted.push(effects.next().await.unwrap());
            }
            assert_eq!(posted, expected, "state id {}", id);
        }
    }

    #[tokio::test]
    async fn work_errors_become_stage_failures() {
        let f = fixture(0);
        let pipeline = PipelineBuilder::<TestState, String, ()>::new()
            .try_reduce(|_| Err(anyhow::anyhow!("rejected")))
            .build();
        let stages = pipeline.stages();

        let err = StageExecutor
            .execute(&*stages[0], f.scope.start(&pipeline))
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "reduce stage failed: rejected");
        assert_eq!(f.state.current(), TestState { id: 0 });
    }
}
