// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for operator executor registration.

use crate::engine::OperatorKind;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An executor was registered for an operator kind.
///
/// # Log Level
/// `debug!` - Configuration detail
pub struct ExecutorRegistered<'a> {
    pub kind: OperatorKind,
    pub executor: &'a str,
}

impl Display for ExecutorRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Registered executor '{}' for {}", self.executor, self.kind)
    }
}

impl StructuredLog for ExecutorRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            kind = self.kind.as_str(),
            executor = self.executor,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "executor_registered",
            span_name = name,
            kind = self.kind.as_str(),
            executor = self.executor,
        )
    }
}

/// A different executor replaced the one registered for an operator kind.
///
/// # Log Level
/// `warn!` - Conflicting registrations; last write wins
///
/// # Example
/// ```
/// use the_orbit::engine::OperatorKind;
/// use the_orbit::observability::messages::registry::ExecutorReplaced;
///
/// let msg = ExecutorReplaced {
///     kind: OperatorKind::TransformOne,
///     previous: "builtin",
///     executor: "background",
/// };
///
/// assert!(msg.to_string().contains("replaced 'builtin'"));
/// ```
pub struct ExecutorReplaced<'a> {
    pub kind: OperatorKind,
    pub previous: &'a str,
    pub executor: &'a str,
}

impl Display for ExecutorReplaced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executor '{}' replaced '{}' for {}",
            self.executor, self.previous, self.kind
        )
    }
}

impl StructuredLog for ExecutorReplaced<'_> {
    fn log(&self) {
        tracing::warn!(
            kind = self.kind.as_str(),
            previous = self.previous,
            executor = self.executor,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "executor_replaced",
            span_name = name,
            kind = self.kind.as_str(),
            previous = self.previous,
            executor = self.executor,
        )
    }
}

/// The registry was cleared.
///
/// # Log Level
/// `debug!` - Only used between isolated test runs
pub struct RegistryReset {
    pub cleared: usize,
}

impl Display for RegistryReset {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Operator registry reset, {} registrations cleared", self.cleared)
    }
}

impl StructuredLog for RegistryReset {
    fn log(&self) {
        tracing::debug!(cleared = self.cleared, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("registry_reset", span_name = name, cleared = self.cleared)
    }
}
