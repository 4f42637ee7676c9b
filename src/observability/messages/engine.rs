// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the dispatch loop and pipeline execution.
//!
//! This module contains message types for logging events related to:
//! * Dispatch loop start and stop
//! * Intent submission
//! * Pipeline execution lifecycle (start, completion, failure, cancellation)
//! * Transform-many fan-out

use crate::engine::OperatorKind;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The dispatch loop began consuming intents.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct DispatchLoopStarted;

impl Display for DispatchLoopStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dispatch loop started")
    }
}

impl StructuredLog for DispatchLoopStarted {
    fn log(&self) {
        tracing::debug!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("dispatch_loop", span_name = name)
    }
}

/// The dispatch loop stopped; no further intents will start.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct DispatchLoopStopped {
    pub started: u64,
}

impl Display for DispatchLoopStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dispatch loop stopped after starting {} pipelines", self.started)
    }
}

impl StructuredLog for DispatchLoopStopped {
    fn log(&self) {
        tracing::debug!(started = self.started, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("dispatch_loop_stopped", span_name = name, started = self.started)
    }
}

/// An intent was accepted for execution.
///
/// # Log Level
/// `debug!` - High-volume event
///
/// # Example
/// ```
/// use the_orbit::observability::messages::engine::PipelineDispatched;
///
/// let msg = PipelineDispatched {
///     intent: "load_posts",
///     stage_count: 3,
/// };
///
/// assert_eq!(msg.to_string(), "Intent 'load_posts' dispatched with 3 stages");
/// ```
pub struct PipelineDispatched<'a> {
    pub intent: &'a str,
    pub stage_count: usize,
}

impl Display for PipelineDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Intent '{}' dispatched with {} stages",
            self.intent, self.stage_count
        )
    }
}

impl StructuredLog for PipelineDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            intent = self.intent,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pipeline_dispatched",
            span_name = name,
            intent = self.intent,
            stage_count = self.stage_count,
        )
    }
}

/// A pipeline execution started.
///
/// # Log Level
/// `debug!` - High-volume event; the span carries the intent for nested events
pub struct PipelineExecutionStarted<'a> {
    pub intent: &'a str,
    pub stage_count: usize,
}

impl Display for PipelineExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing intent '{}' ({} stages)",
            self.intent, self.stage_count
        )
    }
}

impl StructuredLog for PipelineExecutionStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            intent = self.intent,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            intent = self.intent,
            stage_count = self.stage_count,
        )
    }
}

/// A pipeline execution (including all fan-out continuations) completed.
///
/// # Log Level
/// `debug!` - High-volume event
pub struct PipelineExecutionCompleted<'a> {
    pub intent: &'a str,
    pub duration: std::time::Duration,
}

impl Display for PipelineExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Intent '{}' completed in {:?}", self.intent, self.duration)
    }
}

impl StructuredLog for PipelineExecutionCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            intent = self.intent,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pipeline_completed",
            span_name = name,
            intent = self.intent,
            duration = ?self.duration,
        )
    }
}

/// A pipeline lineage terminated with an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_orbit::observability::messages::engine::PipelineExecutionFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "backend unavailable");
/// let msg = PipelineExecutionFailed {
///     intent: "load_posts",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct PipelineExecutionFailed<'a> {
    pub intent: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for PipelineExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Intent '{}' failed: {}", self.intent, self.error)
    }
}

impl StructuredLog for PipelineExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            intent = self.intent,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "pipeline_failed",
            span_name = name,
            intent = self.intent,
            error = %self.error,
        )
    }
}

/// A pipeline was cancelled by container teardown.
///
/// # Log Level
/// `debug!` - Expected during shutdown
pub struct PipelineExecutionCancelled<'a> {
    pub intent: &'a str,
}

impl Display for PipelineExecutionCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Intent '{}' cancelled by container teardown", self.intent)
    }
}

impl StructuredLog for PipelineExecutionCancelled<'_> {
    fn log(&self) {
        tracing::debug!(intent = self.intent, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("pipeline_cancelled", span_name = name, intent = self.intent)
    }
}

/// A stage failed inside a pipeline.
///
/// # Log Level
/// `warn!` - The lineage ends; the failure itself is reported by [`PipelineExecutionFailed`]
pub struct StageFailed<'a> {
    pub index: usize,
    pub kind: OperatorKind,
    pub error: &'a dyn std::error::Error,
}

impl Display for StageFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage {} ({}) failed: {}", self.index, self.kind, self.error)
    }
}

impl StructuredLog for StageFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            index = self.index,
            kind = self.kind.as_str(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stage_failed",
            span_name = name,
            index = self.index,
            kind = self.kind.as_str(),
        )
    }
}

/// A transform-many stage finished producing values.
///
/// # Log Level
/// `trace!` - Very high volume
pub struct FanOutCompleted {
    pub index: usize,
    pub produced: usize,
}

impl Display for FanOutCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} fanned out {} continuations",
            self.index, self.produced
        )
    }
}

impl StructuredLog for FanOutCompleted {
    fn log(&self) {
        tracing::trace!(index = self.index, produced = self.produced, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "fan_out",
            span_name = name,
            index = self.index,
            produced = self.produced,
        )
    }
}
