// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Failures reported by [`TestContainer::assert`](crate::testing::TestContainer::assert).
//!
//! Sequences are carried pre-formatted (`{:?}`) so the error stays free of the
//! container's type parameters.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("the container is not in test mode; wrap it with TestHarness::wrap before asserting")]
    NotInTestMode,

    #[error(
        "timed out after {timeout:?} waiting for {expected_count} {stream} emission(s), got {actual_count}\n  expected: {expected}\n  actual:   {actual}"
    )]
    Timeout {
        stream: &'static str,
        timeout: Duration,
        expected_count: usize,
        actual_count: usize,
        expected: String,
        actual: String,
    },

    #[error("initial state mismatch\n  expected: {expected}\n  actual:   {actual}")]
    InitialStateMismatch { expected: String, actual: String },

    #[error("state mismatch at position {index}\n  expected: {expected}\n  actual:   {actual}")]
    StateMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("side effect mismatch at position {index}\n  expected: {expected}\n  actual:   {actual}")]
    SideEffectMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("expected intent '{intent}' to be dispatched {expected} time(s), but it was dispatched {actual} time(s)")]
    LoopBackMismatch {
        intent: String,
        expected: usize,
        actual: usize,
    },
}
