// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline construction and execution.
//!
//! * [`PipelineBuilder`] assembles an immutable [`Pipeline`] of [`Operator`]s.
//! * [`DispatchLoop`] starts one execution per submitted pipeline.
//! * The stage walker looks up each stage's executor in the
//!   [`OperatorRegistry`](crate::config::OperatorRegistry) when the stage
//!   starts and threads an [`ExecutionContext`] from stage to stage.

mod context;
mod dispatch;
mod operator;
mod pipeline;
mod stage;


pub use context::{ExecutionContext, ExecutionScope, StageOutput};
pub use dispatch::DispatchLoop;
pub use operator::{
    Event, EventStream, Operator, OperatorKind, ReduceWork, SideEffectWork, TransformManyWork,
    TransformOneWork,
};
pub use pipeline::{Pipeline, PipelineBuilder, StageContext, TransformContext};

pub(crate) use stage::execute_pipeline;
