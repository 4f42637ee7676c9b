// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic event the runtime emits is a small struct in
//! [`messages`] that implements `Display` plus [`messages::StructuredLog`]:
//!
//! * No magic strings scattered through the engine
//! * Consistent field names on every `tracing` event
//! * One place to adjust wording or levels
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - dispatch loop and pipeline execution lifecycle
//! * `messages::container` - container lifecycle, state publication, side effects
//! * `messages::registry` - operator executor registration
//!
//! # Usage
//!
//! ```rust
//! use the_orbit::observability::messages::engine::PipelineDispatched;
//! use the_orbit::observability::messages::StructuredLog;
//!
//! let msg = PipelineDispatched {
//!     intent: "load_posts",
//!     stage_count: 3,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
