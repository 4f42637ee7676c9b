// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // operator executors
pub mod config;     // settings, settings files, operator registry
pub mod container;  // state cell, side-effect queue, containers
pub mod engine;     // pipelines and their execution
pub mod errors;     // error handling
pub mod idling;     // idling resources
pub mod observability;
pub mod testing;    // test harness for container hosts
pub mod traits;     // unified abstractions
