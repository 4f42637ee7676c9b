// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::DEFAULT_ASSERT_TIMEOUT_MS;
use crate::errors::ConfigError;

/// File form of the container settings.
///
/// Only plain data lives here; runtime handles (registry, executors) are
/// attached by [`Settings::from_config`](crate::config::Settings::from_config).
///
/// # Fields
/// * `side_effect_buffer_capacity` - Bounded side-effect buffer size (absent = unlimited)
/// * `idling` - Which idling resource the container reports to
/// * `assert_timeout_ms` - Default wait for test assertions
///
/// # Example
/// ```yaml
/// side_effect_buffer_capacity: 64
/// idling: counting
/// assert_timeout_ms: 2000
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    #[serde(default)]
    pub side_effect_buffer_capacity: Option<usize>,
    #[serde(default)]
    pub idling: IdlingKind,
    #[serde(default)]
    pub assert_timeout_ms: Option<u64>,
}

/// Idling resource selection.
///
/// # Variants
/// * `Noop` - Stage activity is not counted
/// * `Counting` - A [`CountingIdlingResource`](crate::idling::CountingIdlingResource)
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdlingKind {
    #[default]
    Noop,
    Counting,
}

impl SettingsConfig {
    pub fn assert_timeout(&self) -> Duration {
        Duration::from_millis(self.assert_timeout_ms.unwrap_or(DEFAULT_ASSERT_TIMEOUT_MS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.side_effect_buffer_capacity == Some(0) {
            return Err(ConfigError::Invalid {
                field: "side_effect_buffer_capacity",
                reason: "must be at least 1; omit it for an unlimited buffer".to_string(),
            });
        }
        if self.assert_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "assert_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from a YAML, JSON or TOML file, chosen by extension.
pub fn load_settings_config<P: AsRef<Path>>(path: P) -> Result<SettingsConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let cfg = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "json" => serde_json::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    Ok(cfg)
}

/// Load a settings file and reject values the container cannot honour.
pub fn load_and_validate_settings_config<P: AsRef<Path>>(
    path: P,
) -> Result<SettingsConfig, ConfigError> {
    let cfg = load_settings_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}
