// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::{Pipeline, PipelineBuilder};
use crate::errors::ExecutionError;
use crate::traits::{Container, SideEffectValue, StateValue};

/// An object that owns a container and exposes intents as methods.
///
/// ```ignore
/// struct Counter {
///     container: Arc<dyn Container<Count, String>>,
/// }
///
/// impl ContainerHost<Count, String> for Counter {
///     fn container(&self) -> &Arc<dyn Container<Count, String>> {
///         &self.container
///     }
/// }
///
/// impl Counter {
///     async fn increment(&self) -> Result<(), ExecutionError> {
///         let pipeline = self
///             .intent("increment")
///             .reduce(|ctx| Count(ctx.state.0 + 1))
///             .build();
///         self.dispatch(pipeline).await
///     }
/// }
/// ```
#[async_trait]
pub trait ContainerHost<S: StateValue, SE: SideEffectValue>: Send + Sync {
    fn container(&self) -> &Arc<dyn Container<S, SE>>;

    /// Start a named, empty pipeline for this host's container.
    fn intent(&self, name: &str) -> PipelineBuilder<S, SE, ()> {
        PipelineBuilder::new().named(name)
    }

    async fn dispatch(&self, pipeline: Pipeline<S, SE>) -> Result<(), ExecutionError> {
        self.container().dispatch(pipeline).await
    }
}
