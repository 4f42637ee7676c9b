// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{ExecutionContext, Operator, StageOutput};
use crate::errors::ExecutionError;
use crate::traits::{SideEffectValue, StateValue};

/// Capability that knows how to run one kind of pipeline stage.
///
/// Executors are looked up in the [`OperatorRegistry`](crate::config::OperatorRegistry)
/// by [`OperatorKind`](crate::engine::OperatorKind) at the moment a stage begins.
#[async_trait]
pub trait OperatorExecutor<S: StateValue, SE: SideEffectValue>: Send + Sync {
    /// Run `operator` against `context`, producing the next event (or a fan-out).
    async fn execute(
        &self,
        operator: &Operator<S, SE>,
        context: ExecutionContext<S, SE>,
    ) -> Result<StageOutput<S, SE>, ExecutionError>;

    /// Stable identifier. Two executors with the same name are treated as
    /// equivalent by the registry.
    fn name(&self) -> &'static str;
}
