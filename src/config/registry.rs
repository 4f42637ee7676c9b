// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::backends::StageExecutor;
use crate::engine::OperatorKind;
use crate::errors::ExecutionError;
use crate::observability::messages::registry::{ExecutorRegistered, ExecutorReplaced, RegistryReset};
use crate::observability::messages::StructuredLog;
use crate::traits::{OperatorExecutor, SideEffectValue, StateValue};

/// Maps each operator kind to the executor that runs stages of that kind.
///
/// Lookups happen when a stage starts, never when a pipeline is built, so a
/// registry may be populated after pipelines exist.
pub struct OperatorRegistry<S, SE> {
    executors: RwLock<HashMap<OperatorKind, Arc<dyn OperatorExecutor<S, SE>>>>,
}

impl<S: StateValue, SE: SideEffectValue> OperatorRegistry<S, SE> {
    /// A registry with nothing registered. Every stage fails with
    /// [`ExecutionError::KindNotRegistered`] until executors are added.
    pub fn empty() -> Self {
        Self {
            executors: RwLock::new(HashMap::new()),
        }
    }

    /// A registry with [`StageExecutor`] registered for every kind.
    pub fn with_builtin() -> Self {
        let registry = Self::empty();
        let builtin: Arc<dyn OperatorExecutor<S, SE>> = Arc::new(StageExecutor);
        for kind in OperatorKind::ALL {
            registry.register(kind, Arc::clone(&builtin));
        }
        registry
    }

    /// Register `executor` for `kind`.
    ///
    /// Registering an executor with the same name as the current one is a
    /// no-op. A different name replaces the current executor and logs a warning.
    pub fn register(&self, kind: OperatorKind, executor: Arc<dyn OperatorExecutor<S, SE>>) {
        let mut executors = self.executors.write().unwrap_or_else(PoisonError::into_inner);
        match executors.get(&kind) {
            Some(current) if current.name() == executor.name() => {}
            Some(current) => {
                ExecutorReplaced {
                    kind,
                    previous: current.name(),
                    executor: executor.name(),
                }
                .log();
                executors.insert(kind, executor);
            }
            None => {
                ExecutorRegistered {
                    kind,
                    executor: executor.name(),
                }
                .log();
                executors.insert(kind, executor);
            }
        }
    }

    pub fn executor_for(
        &self,
        kind: OperatorKind,
    ) -> Result<Arc<dyn OperatorExecutor<S, SE>>, ExecutionError> {
        self.executors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .ok_or(ExecutionError::KindNotRegistered { kind })
    }

    pub fn is_registered(&self, kind: OperatorKind) -> bool {
        self.executors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    /// Registered kinds in declaration order.
    pub fn registered_kinds(&self) -> Vec<OperatorKind> {
        let executors = self.executors.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<OperatorKind> = executors.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Drop every registration.
    ///
    /// Only for isolating tests from each other; never call it while
    /// pipelines are running against this registry.
    pub fn reset(&self) {
        let mut executors = self.executors.write().unwrap_or_else(PoisonError::into_inner);
        let cleared = executors.len();
        executors.clear();
        RegistryReset { cleared }.log();
    }
}

impl<S: StateValue, SE: SideEffectValue> std::fmt::Debug for OperatorRegistry<S, SE> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let executors = self.executors.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(OperatorKind, &'static str)> =
            executors.iter().map(|(kind, exec)| (*kind, exec.name())).collect();
        entries.sort();
        f.debug_map().entries(entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackgroundTransformExecutor;

    type Registry = OperatorRegistry<i32, String>;

    #[test]
    fn builtin_registers_every_kind() {
        let registry = Registry::with_builtin();
        for kind in OperatorKind::ALL {
            assert_eq!(registry.executor_for(kind).unwrap().name(), "builtin");
        }
    }

    #[test]
    fn debug_lists_executor_names_by_kind() {
        let registry = Registry::with_builtin();
        registry.register(OperatorKind::TransformOne, Arc::new(BackgroundTransformExecutor));

        let rendered = format!("{:?}", registry);
        assert!(rendered.contains("TransformOne: \"background\""));
        assert!(rendered.contains("Reduce: \"builtin\""));
    }

    #[test]
    fn missing_kind_is_reported() {
        let registry = Registry::empty();
        let err = registry.executor_for(OperatorKind::Reduce).err().unwrap();
        assert!(matches!(
            err,
            ExecutionError::KindNotRegistered {
                kind: OperatorKind::Reduce
            }
        ));
    }

    #[test]
    fn re_registering_same_executor_is_a_no_op() {
        let registry = Registry::empty();
        registry.register(OperatorKind::Reduce, Arc::new(StageExecutor));
        registry.register(OperatorKind::Reduce, Arc::new(StageExecutor));

        assert_eq!(registry.registered_kinds(), vec![OperatorKind::Reduce]);
        assert_eq!(
            registry.executor_for(OperatorKind::Reduce).unwrap().name(),
            "builtin"
        );
    }

    #[test]
    fn conflicting_registration_last_write_wins() {
        let registry = Registry::with_builtin();
        registry.register(OperatorKind::TransformOne, Arc::new(BackgroundTransformExecutor));

        assert_eq!(
            registry.executor_for(OperatorKind::TransformOne).unwrap().name(),
            "background"
        );
        assert_eq!(
            registry.executor_for(OperatorKind::Reduce).unwrap().name(),
            "builtin"
        );
    }

    #[test]
    fn reset_clears_all_registrations() {
        let registry = Registry::with_builtin();
        registry.reset();

        assert!(registry.registered_kinds().is_empty());
        assert!(!registry.is_registered(OperatorKind::SideEffect));
    }
}
