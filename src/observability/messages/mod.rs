// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `engine` - dispatch loop and pipeline execution events
//! * `container` - container lifecycle, state and side-effect events
//! * `registry` - executor registration events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_orbit::observability::messages::engine::PipelineExecutionStarted;
//! use the_orbit::observability::messages::StructuredLog;
//!
//! let msg = PipelineExecutionStarted {
//!     intent: "refresh",
//!     stage_count: 2,
//! };
//!
//! let span = msg.span("pipeline");
//! let _guard = span.enter();
//! msg.log();
//! ```

use tracing::Span;

pub mod container;
pub mod engine;
pub mod registry;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event at its level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
