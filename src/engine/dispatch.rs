// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::engine::context::ExecutionScope;
use crate::engine::pipeline::Pipeline;
use crate::engine::stage::execute_pipeline;
use crate::errors::ExecutionError;
use crate::observability::messages::engine::{
    DispatchLoopStarted, DispatchLoopStopped, PipelineDispatched, PipelineExecutionCancelled,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{SideEffectValue, StateValue};

/// Serial consumer of submitted pipelines.
///
/// For every submission the loop spawns an independent execution and moves
/// straight on, so submission order fixes start order only. Submissions go
/// through an unbounded queue and never wait, which makes dispatching from
/// inside a running stage safe.
///
/// Shutting down cancels the loop and every spawned execution at its next
/// suspension point. A reduce that already holds the state lock finishes,
/// since the reducer runs synchronously inside it.
pub struct DispatchLoop<S, SE> {
    submissions: mpsc::UnboundedSender<Pipeline<S, SE>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl<S: StateValue, SE: SideEffectValue> DispatchLoop<S, SE> {
    /// Spawn the loop on the scope's pipeline context. Must be called from
    /// within a tokio runtime unless the settings name an explicit runtime.
    pub fn start(scope: ExecutionScope<S, SE>) -> Self {
        let (submissions, mut queue) = mpsc::unbounded_channel::<Pipeline<S, SE>>();
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let handle = scope.settings().pipeline_context.handle();

        let token = shutdown.clone();
        let executions = tracker.clone();
        let runtime = handle.clone();
        tracker.spawn_on(
            async move {
                DispatchLoopStarted.log();
                let mut started = 0u64;
                loop {
                    let pipeline = tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        next = queue.recv() => match next {
                            Some(pipeline) => pipeline,
                            None => break,
                        },
                    };
                    started += 1;

                    let scope = scope.clone();
                    let token = token.clone();
                    executions.spawn_on(
                        async move {
                            let intent = pipeline.intent().to_string();
                            tokio::select! {
                                biased;
                                _ = token.cancelled() => {
                                    PipelineExecutionCancelled { intent: &intent }.log();
                                }
                                // Failures are logged by `execute_pipeline`.
                                _ = execute_pipeline(pipeline, scope) => {}
                            }
                        },
                        &runtime,
                    );
                }
                DispatchLoopStopped { started }.log();
            },
            &handle,
        );

        Self {
            submissions,
            shutdown,
            tracker,
        }
    }

    /// Enqueue `pipeline`. Never waits.
    pub fn submit(&self, pipeline: Pipeline<S, SE>) -> Result<(), ExecutionError> {
        if self.shutdown.is_cancelled() {
            return Err(ExecutionError::ContainerClosed);
        }
        PipelineDispatched {
            intent: pipeline.intent(),
            stage_count: pipeline.len(),
        }
        .log();
        self.submissions
            .send(pipeline)
            .map_err(|_| ExecutionError::ContainerClosed)
    }

    /// Stop accepting pipelines and cancel everything in flight.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Tasks still running, including the loop itself until it stops.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until the loop and every execution it spawned have finished.
    /// Only returns after [`shutdown`](Self::shutdown).
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }
}

impl<S, SE> Drop for DispatchLoop<S, SE> {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.tracker.close();
    }
}
