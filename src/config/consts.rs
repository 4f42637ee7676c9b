// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// How long a test assertion waits for expected emissions (milliseconds)
pub const DEFAULT_ASSERT_TIMEOUT_MS: u64 = 5_000;
/// Intent name used when a pipeline was built without `named(..)`
pub const ANONYMOUS_INTENT: &str = "<unnamed>";
/// Display label for an unbounded side-effect buffer
pub const UNLIMITED_BUFFER_LABEL: &str = "unlimited";
