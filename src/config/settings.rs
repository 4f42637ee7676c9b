// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::consts::UNLIMITED_BUFFER_LABEL;
use crate::config::loader::{IdlingKind, SettingsConfig};
use crate::config::registry::OperatorRegistry;
use crate::idling::{CountingIdlingResource, NoopIdlingResource};
use crate::traits::{IdlingResource, SideEffectValue, StateValue};

/// Side-effect buffer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferCapacity {
    /// Posters wait while this many values are queued. `0` is treated as `1`.
    Bounded(usize),
    #[default]
    Unlimited,
}

impl fmt::Display for BufferCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferCapacity::Bounded(n) => write!(f, "{}", n),
            BufferCapacity::Unlimited => f.write_str(UNLIMITED_BUFFER_LABEL),
        }
    }
}

/// Where spawned work runs.
#[derive(Debug, Clone, Default)]
pub enum ExecutionTarget {
    /// The runtime the caller is on when the work is spawned.
    #[default]
    Current,
    /// The current runtime's blocking pool. Suited to I/O-bound or otherwise
    /// blocking work that should stay off the async workers.
    Blocking,
    Runtime(Handle),
}

impl ExecutionTarget {
    /// Resolve to a runtime handle. Must be called from within a tokio runtime
    /// unless the target is [`ExecutionTarget::Runtime`]. [`ExecutionTarget::Blocking`]
    /// resolves to the current runtime.
    pub fn handle(&self) -> Handle {
        match self {
            ExecutionTarget::Current | ExecutionTarget::Blocking => Handle::current(),
            ExecutionTarget::Runtime(handle) => handle.clone(),
        }
    }

    /// Spawn `work` on this target.
    ///
    /// On [`ExecutionTarget::Blocking`] the future is driven to completion on
    /// a blocking-pool thread; aborting the returned handle only takes effect
    /// if the work has not started yet.
    pub fn spawn<F>(&self, work: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = self.handle();
        match self {
            ExecutionTarget::Blocking => {
                let runtime = handle.clone();
                handle.spawn_blocking(move || runtime.block_on(work))
            }
            ExecutionTarget::Current | ExecutionTarget::Runtime(_) => handle.spawn(work),
        }
    }
}

/// Runtime configuration of a container.
pub struct Settings<S, SE> {
    pub side_effect_buffer: BufferCapacity,
    pub idling_registry: Arc<dyn IdlingResource>,
    /// Where pipeline executions are spawned.
    pub pipeline_context: ExecutionTarget,
    /// Where background transform work is spawned. Defaults to the blocking pool.
    pub background_context: ExecutionTarget,
    pub registry: Arc<OperatorRegistry<S, SE>>,
}

impl<S: StateValue, SE: SideEffectValue> Settings<S, SE> {
    /// Build settings from a loaded settings file. Executors come from
    /// [`OperatorRegistry::with_builtin`].
    pub fn from_config(cfg: &SettingsConfig) -> Self {
        let side_effect_buffer = match cfg.side_effect_buffer_capacity {
            Some(capacity) => BufferCapacity::Bounded(capacity),
            None => BufferCapacity::Unlimited,
        };
        let idling_registry: Arc<dyn IdlingResource> = match cfg.idling {
            IdlingKind::Noop => Arc::new(NoopIdlingResource),
            IdlingKind::Counting => Arc::new(CountingIdlingResource::new()),
        };
        Self {
            side_effect_buffer,
            idling_registry,
            ..Self::default()
        }
    }

    pub fn with_registry(self, registry: Arc<OperatorRegistry<S, SE>>) -> Self {
        Self { registry, ..self }
    }

    pub fn with_idling(self, idling_registry: Arc<dyn IdlingResource>) -> Self {
        Self {
            idling_registry,
            ..self
        }
    }

    pub fn with_side_effect_buffer(self, side_effect_buffer: BufferCapacity) -> Self {
        Self {
            side_effect_buffer,
            ..self
        }
    }
}

impl<S: StateValue, SE: SideEffectValue> Default for Settings<S, SE> {
    fn default() -> Self {
        Self {
            side_effect_buffer: BufferCapacity::Unlimited,
            idling_registry: Arc::new(NoopIdlingResource),
            pipeline_context: ExecutionTarget::Current,
            background_context: ExecutionTarget::Blocking,
            registry: Arc::new(OperatorRegistry::with_builtin()),
        }
    }
}

impl<S, SE> Clone for Settings<S, SE> {
    fn clone(&self) -> Self {
        Self {
            side_effect_buffer: self.side_effect_buffer,
            idling_registry: Arc::clone(&self.idling_registry),
            pipeline_context: self.pipeline_context.clone(),
            background_context: self.background_context.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: StateValue, SE: SideEffectValue> fmt::Debug for Settings<S, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("side_effect_buffer", &self.side_effect_buffer)
            .field("pipeline_context", &self.pipeline_context)
            .field("background_context", &self.background_context)
            .field("registered_kinds", &self.registry.registered_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OperatorKind;

    #[test]
    fn defaults_register_every_builtin_kind() {
        let settings: Settings<i32, String> = Settings::default();

        assert_eq!(settings.side_effect_buffer, BufferCapacity::Unlimited);
        assert_eq!(settings.registry.registered_kinds(), OperatorKind::ALL.to_vec());
        assert!(settings.idling_registry.is_idle());
        assert!(matches!(settings.pipeline_context, ExecutionTarget::Current));
        assert!(matches!(settings.background_context, ExecutionTarget::Blocking));
    }

    #[tokio::test]
    async fn blocking_target_runs_off_the_calling_thread() {
        let caller = std::thread::current().id();

        let on_current = ExecutionTarget::Current
            .spawn(async { std::thread::current().id() })
            .await
            .unwrap();
        let on_blocking = ExecutionTarget::Blocking
            .spawn(async {
                tokio::task::yield_now().await;
                std::thread::current().id()
            })
            .await
            .unwrap();

        assert_eq!(on_current, caller);
        assert_ne!(on_blocking, caller);
    }

    #[test]
    fn from_config_maps_file_values() {
        let cfg = SettingsConfig {
            side_effect_buffer_capacity: Some(3),
            idling: IdlingKind::Counting,
            assert_timeout_ms: None,
        };
        let settings: Settings<i32, String> = Settings::from_config(&cfg);

        assert_eq!(settings.side_effect_buffer, BufferCapacity::Bounded(3));
        settings.idling_registry.increment();
        assert!(!settings.idling_registry.is_idle());
    }

    #[test]
    fn debug_shows_buffer_and_registered_kinds() {
        let settings: Settings<i32, String> =
            Settings::default().with_side_effect_buffer(BufferCapacity::Bounded(4));

        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("Bounded(4)"));
        assert!(rendered.contains("TransformMany"));
    }

    #[test]
    fn buffer_capacity_display() {
        assert_eq!(BufferCapacity::Bounded(8).to_string(), "8");
        assert_eq!(BufferCapacity::Unlimited.to_string(), "unlimited");
    }
}
