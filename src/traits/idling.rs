// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Counter used by external tooling to detect when a container is quiescent.
///
/// Tracked stages call [`increment`](IdlingResource::increment) right before
/// their work begins and [`decrement`](IdlingResource::decrement) right after
/// it ends, whether it succeeded, failed, or was cancelled.
pub trait IdlingResource: Send + Sync {
    fn increment(&self);

    fn decrement(&self);

    /// Whether no tracked work is currently running.
    fn is_idle(&self) -> bool;

    /// Called once when the owning container is torn down.
    fn close(&self);
}
