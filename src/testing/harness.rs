// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::consts::DEFAULT_ASSERT_TIMEOUT_MS;
use crate::config::{Settings, SettingsConfig};
use crate::container::RealContainer;
use crate::engine::Pipeline;
use crate::errors::{AssertionError, ExecutionError};
use crate::testing::observer::TestStreamObserver;
use crate::testing::verification::Verification;
use crate::traits::{Container, SideEffectValue, StateValue};

/// How a [`TestContainer`] runs dispatched intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestOptions {
    /// Only the first dispatched intent executes; later ones are only recorded.
    pub isolate_flow: bool,
    /// Run the wrapped container's `on_create` callback against the test
    /// initial state.
    pub run_on_create: bool,
    /// `dispatch` runs the intent to completion before returning.
    pub synchronous: bool,
    /// How long [`TestContainer::assert`] waits when the verification sets no timeout.
    pub assert_timeout: Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            isolate_flow: true,
            run_on_create: false,
            synchronous: true,
            assert_timeout: Duration::from_millis(DEFAULT_ASSERT_TIMEOUT_MS),
        }
    }
}

impl TestOptions {
    /// Defaults with the assertion timeout taken from a settings file.
    pub fn from_config(cfg: &SettingsConfig) -> Self {
        Self {
            assert_timeout: cfg.assert_timeout(),
            ..Self::default()
        }
    }
}

/// Entry point for putting a host's container into test mode.
pub struct TestHarness;

impl TestHarness {
    /// Build a [`TestContainer`] to stand in for `container`.
    ///
    /// The stand-in runs with `container`'s settings (registry, buffer,
    /// idling resource and contexts) when it exposes them.
    ///
    /// Inject the returned handle into the host under test in place of its
    /// production container. When `options.run_on_create` is set, the
    /// production container's lazy `on_create` callback (if any) runs against
    /// `initial_state` before this returns.
    pub fn wrap<S, SE>(
        container: &dyn Container<S, SE>,
        initial_state: S,
        options: TestOptions,
    ) -> Arc<TestContainer<S, SE>>
    where
        S: StateValue,
        SE: SideEffectValue + Clone + PartialEq,
    {
        let on_create = container.on_create();
        let settings = container.settings().unwrap_or_default();
        let test_container = TestContainer::with_settings(initial_state.clone(), options, settings);
        if options.run_on_create {
            if let Some(on_create) = on_create {
                on_create(&initial_state);
            }
        }
        test_container
    }
}

struct TestFixtures<S, SE> {
    initial_state: S,
    states: TestStreamObserver<S>,
    side_effects: TestStreamObserver<SE>,
}

/// A container in test mode.
///
/// Records every emitted state and side effect from the moment it is
/// created, counts dispatches per intent name and applies [`TestOptions`].
pub struct TestContainer<S: StateValue, SE: SideEffectValue> {
    real: RealContainer<S, SE>,
    options: TestOptions,
    dispatched: AtomicBool,
    calls: Mutex<HashMap<String, usize>>,
    fixtures: Mutex<Option<Arc<TestFixtures<S, SE>>>>,
}

impl<S, SE> TestContainer<S, SE>
where
    S: StateValue,
    SE: SideEffectValue + Clone + PartialEq,
{
    /// Must be called from within a tokio runtime.
    pub fn new(initial_state: S, options: TestOptions) -> Arc<Self> {
        Self::with_settings(initial_state, options, Settings::default())
    }

    pub fn with_settings(
        initial_state: S,
        options: TestOptions,
        settings: Settings<S, SE>,
    ) -> Arc<Self> {
        let real = RealContainer::create(initial_state.clone(), settings);
        let fixtures = TestFixtures {
            initial_state,
            states: TestStreamObserver::spawn(real.observe_state()),
            side_effects: TestStreamObserver::spawn(real.observe_side_effects()),
        };
        Arc::new(Self {
            real,
            options,
            dispatched: AtomicBool::new(false),
            calls: Mutex::new(HashMap::new()),
            fixtures: Mutex::new(Some(Arc::new(fixtures))),
        })
    }

    pub fn options(&self) -> TestOptions {
        self.options
    }

    /// How many times an intent with this name was dispatched, executed or not.
    pub fn call_count(&self, intent: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(intent)
            .copied()
            .unwrap_or(0)
    }

    /// States recorded so far, starting with the initial state.
    pub fn recorded_states(&self) -> Vec<S> {
        self.fixtures()
            .map(|fixtures| fixtures.states.values())
            .unwrap_or_default()
    }

    pub fn recorded_side_effects(&self) -> Vec<SE> {
        self.fixtures()
            .map(|fixtures| fixtures.side_effects.values())
            .unwrap_or_default()
    }

    /// Stop recording. Later assertions fail with
    /// [`AssertionError::NotInTestMode`].
    pub fn dispose(&self) {
        self.fixtures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Check everything the container emitted against `verification`.
    ///
    /// Waits, up to the timeout, for the initial state plus every expected
    /// state and for every expected side effect. Then compares them
    /// positionally and checks loop-back counts. The first difference found
    /// is returned.
    pub async fn assert(&self, verification: Verification<S, SE>) -> Result<(), AssertionError> {
        let fixtures = self.fixtures().ok_or(AssertionError::NotInTestMode)?;
        let timeout = verification
            .timeout_override()
            .unwrap_or(self.options.assert_timeout);

        let mut expected_states = vec![fixtures.initial_state.clone()];
        expected_states.extend(verification.resolve_states(&fixtures.initial_state));
        let expected_side_effects = verification.expected_side_effects();

        let (states_arrived, side_effects_arrived) = tokio::join!(
            fixtures.states.await_count(expected_states.len(), timeout),
            fixtures
                .side_effects
                .await_count(expected_side_effects.len(), timeout),
        );

        let states = fixtures.states.values();
        if !states_arrived {
            return Err(timed_out("state", timeout, &expected_states, &states));
        }
        let side_effects = fixtures.side_effects.values();
        if !side_effects_arrived {
            return Err(timed_out(
                "side effect",
                timeout,
                expected_side_effects,
                &side_effects,
            ));
        }

        if states[0] != fixtures.initial_state {
            return Err(AssertionError::InitialStateMismatch {
                expected: format!("{:?}", fixtures.initial_state),
                actual: format!("{:?}", states[0]),
            });
        }
        if let Some((index, expected, actual)) = first_difference(&expected_states[1..], &states[1..]) {
            return Err(AssertionError::StateMismatch {
                index,
                expected,
                actual,
            });
        }
        if let Some((index, expected, actual)) = first_difference(expected_side_effects, &side_effects) {
            return Err(AssertionError::SideEffectMismatch {
                index,
                expected,
                actual,
            });
        }

        for (intent, expected) in verification.loop_backs() {
            let actual = self.call_count(intent);
            if actual != *expected {
                return Err(AssertionError::LoopBackMismatch {
                    intent: intent.clone(),
                    expected: *expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn fixtures(&self) -> Option<Arc<TestFixtures<S, SE>>> {
        self.fixtures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, intent: &str) {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(intent.to_string())
            .or_insert(0) += 1;
    }
}

fn timed_out<T: Debug>(
    stream: &'static str,
    timeout: Duration,
    expected: &[T],
    actual: &[T],
) -> AssertionError {
    AssertionError::Timeout {
        stream,
        timeout,
        expected_count: expected.len(),
        actual_count: actual.len(),
        expected: format!("{:?}", expected),
        actual: format!("{:?}", actual),
    }
}

/// Position and formatted values of the first difference. A missing or
/// extra element counts as a difference.
fn first_difference<T: Debug + PartialEq>(
    expected: &[T],
    actual: &[T],
) -> Option<(usize, String, String)> {
    let describe = |value: Option<&T>| match value {
        Some(value) => format!("{:?}", value),
        None => "<nothing>".to_string(),
    };
    (0..expected.len().max(actual.len())).find_map(|index| {
        let (e, a) = (expected.get(index), actual.get(index));
        (e != a).then(|| (index, describe(e), describe(a)))
    })
}

#[async_trait]
impl<S, SE> Container<S, SE> for TestContainer<S, SE>
where
    S: StateValue,
    SE: SideEffectValue + Clone + PartialEq,
{
    fn current_state(&self) -> S {
        self.real.current_state()
    }

    fn observe_state(&self) -> BoxStream<'static, S> {
        self.real.observe_state()
    }

    fn observe_side_effects(&self) -> BoxStream<'static, SE> {
        self.real.observe_side_effects()
    }

    async fn dispatch(&self, pipeline: Pipeline<S, SE>) -> Result<(), ExecutionError> {
        self.record(pipeline.intent());
        let first = !self.dispatched.swap(true, Ordering::SeqCst);
        if self.options.isolate_flow && !first {
            return Ok(());
        }
        if self.options.synchronous {
            self.real.run_inline(pipeline).await
        } else {
            self.real.dispatch(pipeline).await
        }
    }

    fn settings(&self) -> Option<Settings<S, SE>> {
        Some(self.real.settings().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_difference_reports_position() {
        assert_eq!(first_difference(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(
            first_difference(&[1, 2, 3], &[1, 5, 3]),
            Some((1, "2".to_string(), "5".to_string()))
        );
        assert_eq!(
            first_difference(&[1], &[1, 2]),
            Some((1, "<nothing>".to_string(), "2".to_string()))
        );
    }

    #[test]
    fn default_options_isolate_and_run_synchronously() {
        let options = TestOptions::default();
        assert!(options.isolate_flow);
        assert!(options.synchronous);
        assert!(!options.run_on_create);
        assert_eq!(options.assert_timeout, Duration::from_millis(DEFAULT_ASSERT_TIMEOUT_MS));
    }

    #[test]
    fn options_take_timeout_from_settings_file() {
        let cfg = SettingsConfig {
            assert_timeout_ms: Some(750),
            ..SettingsConfig::default()
        };
        assert_eq!(
            TestOptions::from_config(&cfg).assert_timeout,
            Duration::from_millis(750)
        );
    }
}
