// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;
mod settings;

pub mod consts;

pub use loader::{load_and_validate_settings_config, load_settings_config, IdlingKind, SettingsConfig};
pub use registry::OperatorRegistry;
pub use settings::{BufferCapacity, ExecutionTarget, Settings};
