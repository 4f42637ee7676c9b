// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The stage walker.
//!
//! A lineage runs its stages strictly in order. When a multi-value transform
//! fans out, every produced event starts its own continuation over the
//! remaining stages. Continuations are spawned in the order the events were
//! produced and run in parallel; the first error, from a continuation or
//! from the source itself, cancels the rest.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::engine::context::{ExecutionContext, ExecutionScope, StageOutput};
use crate::engine::operator::{EventStream, Operator, OperatorKind};
use crate::engine::pipeline::Pipeline;
use crate::errors::ExecutionError;
use crate::idling::IdlingGuard;
use crate::observability::messages::engine::{
    FanOutCompleted, PipelineExecutionCompleted, PipelineExecutionFailed,
    PipelineExecutionStarted, StageFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{SideEffectValue, StateValue};

type Stages<S, SE> = Arc<[Arc<Operator<S, SE>>]>;

/// Run `pipeline` to completion within `scope`, logging its lifecycle.
pub(crate) async fn execute_pipeline<S, SE>(
    pipeline: Pipeline<S, SE>,
    scope: ExecutionScope<S, SE>,
) -> Result<(), ExecutionError>
where
    S: StateValue,
    SE: SideEffectValue,
{
    let started = PipelineExecutionStarted {
        intent: pipeline.intent(),
        stage_count: pipeline.len(),
    };
    let span = started.span("execute");

    async {
        started.log();
        let clock = Instant::now();
        let result = run_stages(pipeline.stages(), 0, scope.start(&pipeline)).await;
        match &result {
            Ok(()) => PipelineExecutionCompleted {
                intent: pipeline.intent(),
                duration: clock.elapsed(),
            }
            .log(),
            Err(error) => PipelineExecutionFailed {
                intent: pipeline.intent(),
                error,
            }
            .log(),
        }
        result
    }
    .instrument(span)
    .await
}

/// Walk `stages[start..]` with `context`.
pub(crate) fn run_stages<S, SE>(
    stages: Stages<S, SE>,
    start: usize,
    context: ExecutionContext<S, SE>,
) -> BoxFuture<'static, Result<(), ExecutionError>>
where
    S: StateValue,
    SE: SideEffectValue,
{
    async move {
        let mut context = context;
        for index in start..stages.len() {
            let operator = Arc::clone(&stages[index]);
            let kind = operator.kind();
            let executor = context.settings().registry.executor_for(kind)?;
            let guard = IdlingGuard::track(
                &context.settings().idling_registry,
                operator.idling_tracked(),
            );

            let output = match executor.execute(&operator, context).await {
                Ok(output) => output,
                Err(error) => {
                    StageFailed {
                        index,
                        kind,
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
            };

            match output {
                StageOutput::Next(next) => {
                    drop(guard);
                    context = next;
                }
                StageOutput::FanOut { scope, events } => {
                    return fan_out(stages, index, scope, events, guard).await;
                }
            }
        }
        Ok(())
    }
    .boxed()
}

/// Run `stages[index + 1..]` once per event.
///
/// Each continuation is spawned on the pipeline context as it is produced,
/// so continuations run in parallel with each other and with the source.
/// The idling guard of the producing stage is held until the source ends.
/// Returning early drops the set, which aborts the continuations still
/// running.
async fn fan_out<S, SE>(
    stages: Stages<S, SE>,
    index: usize,
    scope: ExecutionScope<S, SE>,
    mut events: EventStream,
    mut guard: Option<IdlingGuard>,
) -> Result<(), ExecutionError>
where
    S: StateValue,
    SE: SideEffectValue,
{
    let runtime = scope.settings().pipeline_context.handle();
    let mut continuations = JoinSet::new();
    let mut produced = 0usize;
    let mut source_done = false;

    loop {
        tokio::select! {
            biased;
            Some(joined) = continuations.join_next(), if !continuations.is_empty() => {
                joined.map_err(|e| ExecutionError::BackgroundTaskFailed {
                    kind: OperatorKind::TransformMany,
                    reason: e.to_string(),
                })??;
            }
            next = events.next(), if !source_done => match next {
                Some(Ok(event)) => {
                    produced += 1;
                    continuations.spawn_on(
                        run_stages(Arc::clone(&stages), index + 1, scope.with_event(event))
                            .in_current_span(),
                        &runtime,
                    );
                }
                Some(Err(source)) => {
                    let error = ExecutionError::stage(OperatorKind::TransformMany, source);
                    StageFailed {
                        index,
                        kind: OperatorKind::TransformMany,
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
                None => {
                    source_done = true;
                    guard.take();
                }
            },
            else => break,
        }
    }

    FanOutCompleted { index, produced }.log();
    Ok(())
}
