// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio_util::task::AbortOnDropHandle;

use crate::backends::StageExecutor;
use crate::engine::{ExecutionContext, Operator, StageOutput};
use crate::errors::ExecutionError;
use crate::traits::{OperatorExecutor, SideEffectValue, StateValue};

/// Runs single-value transform work on the settings' background context.
///
/// The pipeline task waits for the spawned work; if the pipeline is cancelled
/// the spawned work is aborted with it. Every other kind is delegated to
/// [`StageExecutor`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundTransformExecutor;

#[async_trait]
impl<S: StateValue, SE: SideEffectValue> OperatorExecutor<S, SE> for BackgroundTransformExecutor {
    async fn execute(
        &self,
        operator: &Operator<S, SE>,
        context: ExecutionContext<S, SE>,
    ) -> Result<StageOutput<S, SE>, ExecutionError> {
        let Operator::TransformOne { work, .. } = operator else {
            return OperatorExecutor::<S, SE>::execute(&StageExecutor, operator, context).await;
        };

        let kind = operator.kind();
        let target = context.settings().background_context.clone();
        let reader = context.reader();
        let (event, scope) = context.into_parts();

        let task = AbortOnDropHandle::new(target.spawn(work(reader, event)));
        let next = task
            .await
            .map_err(|e| ExecutionError::BackgroundTaskFailed {
                kind,
                reason: e.to_string(),
            })?
            .map_err(|e| ExecutionError::stage(kind, e))?;
        Ok(StageOutput::Next(scope.with_event(next)))
    }

    fn name(&self) -> &'static str {
        "background"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BufferCapacity, ExecutionTarget, Settings};
    use crate::container::{SideEffectChannel, StateContainer};
    use crate::engine::{ExecutionScope, PipelineBuilder};
    use std::sync::Arc;

    fn scope(settings: Settings<u32, String>) -> ExecutionScope<u32, String> {
        let channel = SideEffectChannel::new(BufferCapacity::Unlimited);
        ExecutionScope::new(
            Arc::new(StateContainer::new(0)),
            channel.sender(),
            Arc::new(settings),
        )
    }

    #[tokio::test]
    async fn transform_runs_on_background_runtime() {
        let background = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("orbit-background")
            .build()
            .unwrap();
        let settings = Settings {
            background_context: ExecutionTarget::Runtime(background.handle().clone()),
            ..Settings::default()
        };
        let scope = scope(settings);
        let pipeline = PipelineBuilder::<u32, String, ()>::new()
            .transform(|_| async {
                Ok(std::thread::current().name().unwrap_or_default().to_string())
            })
            .build();
        let stages = pipeline.stages();

        let out = BackgroundTransformExecutor
            .execute(&*stages[0], scope.start(&pipeline))
            .await
            .unwrap();
        let StageOutput::Next(ctx) = out else {
            panic!("expected a single continuation");
        };
        assert_eq!(
            ctx.event().downcast_ref::<String>().map(String::as_str),
            Some("orbit-background")
        );

        background.shutdown_background();
    }

    #[tokio::test]
    async fn default_context_keeps_transform_off_the_pipeline_thread() {
        let scope = scope(Settings::default());
        let pipeline_thread = std::thread::current().id();
        let pipeline = PipelineBuilder::<u32, String, ()>::new()
            .transform(|_| async { Ok(std::thread::current().id()) })
            .build();
        let stages = pipeline.stages();

        let out = BackgroundTransformExecutor
            .execute(&*stages[0], scope.start(&pipeline))
            .await
            .unwrap();
        let StageOutput::Next(ctx) = out else {
            panic!("expected a single continuation");
        };
        let worker = ctx.event().downcast_ref::<std::thread::ThreadId>().copied();
        assert!(worker.is_some());
        assert_ne!(worker, Some(pipeline_thread));
    }

    #[tokio::test]
    async fn panicking_work_is_reported() {
        let scope = scope(Settings::default());
        let pipeline = PipelineBuilder::<u32, String, ()>::new()
            .transform(|_| async {
                if true {
                    panic!("transform exploded");
                }
                Ok(1_u8)
            })
            .build();
        let stages = pipeline.stages();

        let err = BackgroundTransformExecutor
            .execute(&*stages[0], scope.start(&pipeline))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ExecutionError::BackgroundTaskFailed { .. }));
    }

    #[tokio::test]
    async fn other_kinds_are_delegated() {
        let scope = scope(Settings::default());
        let pipeline = PipelineBuilder::<u32, String, ()>::new()
            .reduce(|ctx| ctx.state + 1)
            .build();
        let stages = pipeline.stages();

        let out = BackgroundTransformExecutor
            .execute(&*stages[0], scope.start(&pipeline))
            .await
            .unwrap();
        let StageOutput::Next(ctx) = out else {
            panic!("expected a single continuation");
        };
        assert_eq!(ctx.state(), 1);
    }
}
