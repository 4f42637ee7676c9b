// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::time::Duration;

enum StateExpectation<S> {
    Exact(S),
    Change(Box<dyn Fn(&S) -> S + Send + Sync>),
}

/// Everything a test expects a container to have emitted.
///
/// The list of expected states excludes the initial state, which is always
/// checked. Expected side effects must be listed in full. Loop-back counts
/// are optional and include the dispatch under test.
///
/// # Example
/// ```rust
/// use the_orbit::testing::Verification;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Counter {
///     count: u32,
///     label: &'static str,
/// }
///
/// let verification = Verification::<Counter, String>::new()
///     .state_change(|prev| Counter { count: prev.count + 1, ..prev.clone() })
///     .state_change(|prev| Counter { label: "done", ..prev.clone() })
///     .side_effect("saved".to_string())
///     .loop_back("save", 1);
///
/// let states = verification.resolve_states(&Counter { count: 0, label: "idle" });
/// assert_eq!(states[1], Counter { count: 1, label: "done" });
/// ```
pub struct Verification<S, SE> {
    states: Vec<StateExpectation<S>>,
    side_effects: Vec<SE>,
    loop_backs: Vec<(String, usize)>,
    timeout: Option<Duration>,
}

impl<S: Clone, SE> Verification<S, SE> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            side_effects: Vec::new(),
            loop_backs: Vec::new(),
            timeout: None,
        }
    }

    /// Expect these states, in order, after the initial state.
    pub fn states<I: IntoIterator<Item = S>>(mut self, states: I) -> Self {
        self.states
            .extend(states.into_iter().map(StateExpectation::Exact));
        self
    }

    pub fn state(mut self, state: S) -> Self {
        self.states.push(StateExpectation::Exact(state));
        self
    }

    /// Expect a state derived from the previous expected state.
    pub fn state_change<F>(mut self, change: F) -> Self
    where
        F: Fn(&S) -> S + Send + Sync + 'static,
    {
        self.states.push(StateExpectation::Change(Box::new(change)));
        self
    }

    pub fn side_effects<I: IntoIterator<Item = SE>>(mut self, side_effects: I) -> Self {
        self.side_effects.extend(side_effects);
        self
    }

    pub fn side_effect(mut self, side_effect: SE) -> Self {
        self.side_effects.push(side_effect);
        self
    }

    /// Expect the intent named `intent` to have been dispatched `times` times.
    pub fn loop_back(mut self, intent: &str, times: usize) -> Self {
        self.loop_backs.push((intent.to_string(), times));
        self
    }

    /// Override the container's default assertion timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Expected states with every change applied, starting from `initial`.
    pub fn resolve_states(&self, initial: &S) -> Vec<S> {
        let mut previous = initial.clone();
        self.states
            .iter()
            .map(|expectation| {
                let next = match expectation {
                    StateExpectation::Exact(state) => state.clone(),
                    StateExpectation::Change(change) => change(&previous),
                };
                previous = next.clone();
                next
            })
            .collect()
    }

    pub fn expected_side_effects(&self) -> &[SE] {
        &self.side_effects
    }

    pub fn loop_backs(&self) -> &[(String, usize)] {
        &self.loop_backs
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<S: Clone, SE> Default for Verification<S, SE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, SE: fmt::Debug> fmt::Debug for Verification<S, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verification")
            .field("states", &self.states.len())
            .field("side_effects", &self.side_effects)
            .field("loop_backs", &self.loop_backs)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_apply_to_the_previous_expected_state() {
        let verification = Verification::<i32, ()>::new()
            .state(10)
            .state_change(|prev| prev + 5)
            .states([1, 2])
            .state_change(|prev| prev * 10);

        assert_eq!(verification.resolve_states(&0), vec![10, 15, 1, 2, 20]);
    }

    #[test]
    fn first_change_starts_from_initial_state() {
        let verification = Verification::<i32, ()>::new().state_change(|prev| prev - 1);
        assert_eq!(verification.resolve_states(&42), vec![41]);
    }
}
