// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for container lifecycle, state publication and side effects.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A container was created.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_orbit::observability::messages::container::ContainerCreated;
///
/// let msg = ContainerCreated {
///     side_effect_buffer: "unlimited",
///     registered_kinds: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ContainerCreated<'a> {
    pub side_effect_buffer: &'a str,
    pub registered_kinds: usize,
}

impl Display for ContainerCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Container created: side_effect_buffer={}, registered_kinds={}",
            self.side_effect_buffer, self.registered_kinds
        )
    }
}

impl StructuredLog for ContainerCreated<'_> {
    fn log(&self) {
        tracing::info!(
            side_effect_buffer = self.side_effect_buffer,
            registered_kinds = self.registered_kinds,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "container",
            span_name = name,
            side_effect_buffer = self.side_effect_buffer,
            registered_kinds = self.registered_kinds,
        )
    }
}

/// A container was torn down.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ContainerClosed {
    pub in_flight: usize,
}

impl Display for ContainerClosed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Container closed, cancelling {} in-flight pipelines",
            self.in_flight
        )
    }
}

impl StructuredLog for ContainerClosed {
    fn log(&self) {
        tracing::info!(in_flight = self.in_flight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("container_closed", span_name = name, in_flight = self.in_flight)
    }
}

/// A reduce stage committed a new state.
///
/// # Log Level
/// `trace!` - Very high volume
pub struct StatePublished {
    pub observers: usize,
}

impl Display for StatePublished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "State published to {} observers", self.observers)
    }
}

impl StructuredLog for StatePublished {
    fn log(&self) {
        tracing::trace!(observers = self.observers, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("state_published", span_name = name, observers = self.observers)
    }
}

/// A side effect could not be delivered because the channel was torn down.
///
/// # Log Level
/// `warn!` - Value dropped
pub struct SideEffectDropped;

impl Display for SideEffectDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Side effect dropped: channel closed")
    }
}

impl StructuredLog for SideEffectDropped {
    fn log(&self) {
        tracing::warn!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("side_effect_dropped", span_name = name)
    }
}

/// An intent was rejected because the container is closed.
///
/// # Log Level
/// `warn!` - Caller is using a torn-down container
pub struct DispatchRejected<'a> {
    pub intent: &'a str,
}

impl Display for DispatchRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Intent '{}' rejected: container is closed", self.intent)
    }
}

impl StructuredLog for DispatchRejected<'_> {
    fn log(&self) {
        tracing::warn!(intent = self.intent, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("dispatch_rejected", span_name = name, intent = self.intent)
    }
}
