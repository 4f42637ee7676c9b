// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operator executors that can be registered in an
//! [`OperatorRegistry`](crate::config::OperatorRegistry).
//!
//! # Available Backends
//!
//! ## Builtin
//! [`StageExecutor`] runs every operator kind on the task that walks the
//! pipeline. [`OperatorRegistry::with_builtin`](crate::config::OperatorRegistry::with_builtin)
//! registers it for all kinds, so containers work out of the box.
//!
//! ## Background
//! [`BackgroundTransformExecutor`] moves single-value transform work onto the
//! settings' background context and delegates everything else to the builtin
//! executor. Register it for [`OperatorKind::TransformOne`](crate::engine::OperatorKind)
//! to keep slow transforms off the pipeline runtime without touching pipelines.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use the_orbit::backends::BackgroundTransformExecutor;
//! use the_orbit::config::OperatorRegistry;
//! use the_orbit::engine::OperatorKind;
//!
//! let registry: OperatorRegistry<u32, String> = OperatorRegistry::with_builtin();
//! registry.register(OperatorKind::TransformOne, Arc::new(BackgroundTransformExecutor));
//!
//! let executor = registry.executor_for(OperatorKind::TransformOne).ok().unwrap();
//! assert_eq!(executor.name(), "background");
//! ```

mod background;
mod builtin;

pub use background::BackgroundTransformExecutor;
pub use builtin::StageExecutor;
