// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while a pipeline executes.
//!
//! Every variant terminates only the pipeline lineage that raised it. The
//! state container, the dispatch loop and other in-flight pipelines are
//! unaffected.

use thiserror::Error;

use crate::engine::OperatorKind;

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A stage of this kind started but the registry has no executor for it.
    #[error("no executor registered for operator kind '{kind}'")]
    KindNotRegistered { kind: OperatorKind },

    /// The stage's own work returned an error. Never retried.
    #[error("{kind} stage failed: {source}")]
    StageFailed {
        kind: OperatorKind,
        #[source]
        source: anyhow::Error,
    },

    /// Work spawned off the lineage's task (background transform work or a
    /// fanned-out continuation) panicked or was aborted.
    #[error("background work for {kind} stage did not complete: {reason}")]
    BackgroundTaskFailed { kind: OperatorKind, reason: String },

    /// The container was torn down; no new work is accepted.
    #[error("container is closed and no longer accepts intents")]
    ContainerClosed,
}

impl ExecutionError {
    pub(crate) fn stage(kind: OperatorKind, source: anyhow::Error) -> Self {
        ExecutionError::StageFailed { kind, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failure_keeps_source_chain() {
        let err = ExecutionError::stage(OperatorKind::Reduce, anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "reduce stage failed: boom");
        let source = std::error::Error::source(&err).expect("source should be attached");
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn kind_not_registered_names_the_kind() {
        let err = ExecutionError::KindNotRegistered {
            kind: OperatorKind::TransformMany,
        };
        assert!(err.to_string().contains("transform-many"));
    }
}
