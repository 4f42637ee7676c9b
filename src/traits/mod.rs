// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod container;
pub mod executor;
pub mod host;
pub mod idling;

pub use container::{Container, OnCreate, SideEffectValue, StateValue};
pub use executor::OperatorExecutor;
pub use host::ContainerHost;
pub use idling::IdlingResource;
