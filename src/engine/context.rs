// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-lineage execution state handed from stage to stage.

use std::sync::Arc;

use crate::config::Settings;
use crate::container::{SideEffectSender, StateContainer, StateReader};
use crate::engine::operator::{Event, EventStream};
use crate::engine::pipeline::Pipeline;
use crate::errors::ExecutionError;
use crate::traits::{SideEffectValue, StateValue};

/// Everything a lineage shares with its container, minus the event.
///
/// Fanned-out continuations clone the scope and pair it with their own event.
pub struct ExecutionScope<S, SE> {
    state: Arc<StateContainer<S>>,
    side_effects: SideEffectSender<SE>,
    settings: Arc<Settings<S, SE>>,
}

impl<S, SE> Clone for ExecutionScope<S, SE> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            side_effects: self.side_effects.clone(),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<S: StateValue, SE: SideEffectValue> ExecutionScope<S, SE> {
    pub fn new(
        state: Arc<StateContainer<S>>,
        side_effects: SideEffectSender<SE>,
        settings: Arc<Settings<S, SE>>,
    ) -> Self {
        Self {
            state,
            side_effects,
            settings,
        }
    }

    /// Context for the first stage of `pipeline`.
    pub fn start(&self, pipeline: &Pipeline<S, SE>) -> ExecutionContext<S, SE> {
        self.with_event(pipeline.seed_event())
    }

    pub fn with_event(&self, event: Event) -> ExecutionContext<S, SE> {
        ExecutionContext {
            event,
            scope: self.clone(),
        }
    }

    pub fn reader(&self) -> StateReader<S> {
        StateReader::new(Arc::clone(&self.state))
    }

    pub fn settings(&self) -> &Arc<Settings<S, SE>> {
        &self.settings
    }
}

/// The event currently flowing through a lineage, plus its scope.
pub struct ExecutionContext<S, SE> {
    event: Event,
    scope: ExecutionScope<S, SE>,
}

impl<S: StateValue, SE: SideEffectValue> ExecutionContext<S, SE> {
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn state(&self) -> S {
        self.scope.state.current()
    }

    pub fn reader(&self) -> StateReader<S> {
        self.scope.reader()
    }

    /// Run `reducer` under the container's reduce lock.
    pub async fn reduce<F>(&self, reducer: F) -> anyhow::Result<bool>
    where
        F: FnOnce(&S) -> anyhow::Result<S> + Send,
    {
        self.scope.state.reduce(reducer).await
    }

    pub async fn post(&self, side_effect: SE) -> Result<(), ExecutionError> {
        self.scope.side_effects.post(side_effect).await
    }

    pub fn settings(&self) -> &Settings<S, SE> {
        &self.scope.settings
    }

    pub fn scope(&self) -> &ExecutionScope<S, SE> {
        &self.scope
    }

    /// Keep the scope, swap the event. Used after a single-value transform.
    pub fn with_event(self, event: Event) -> Self {
        Self {
            event,
            scope: self.scope,
        }
    }

    pub fn into_parts(self) -> (Event, ExecutionScope<S, SE>) {
        (self.event, self.scope)
    }
}

/// What a stage hands back to the walker.
pub enum StageOutput<S, SE> {
    /// Continue the lineage with this context.
    Next(ExecutionContext<S, SE>),
    /// Run the remaining stages once per event, concurrently.
    FanOut {
        scope: ExecutionScope<S, SE>,
        events: EventStream,
    },
}
