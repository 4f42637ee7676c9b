// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministic testing of container hosts.
//!
//! A host receives its container through its constructor. In a test, hand it
//! a [`TestContainer`] instead of the production one:
//!
//! 1. [`TestHarness::wrap`] builds a test container that records every state
//!    and side effect from the start.
//! 2. With [`TestOptions::isolate_flow`] only the first intent runs. Intents
//!    it dispatches back into the host are counted but not executed.
//! 3. With [`TestOptions::synchronous`] `dispatch` returns once the intent
//!    has finished.
//! 4. [`TestContainer::assert`] compares the recordings with a
//!    [`Verification`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use the_orbit::config::Settings;
//! use the_orbit::container::RealContainer;
//! use the_orbit::testing::{TestHarness, TestOptions, Verification};
//! use the_orbit::traits::{Container, ContainerHost};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! struct CounterHost {
//!     container: Arc<dyn Container<Counter, String>>,
//! }
//!
//! impl ContainerHost<Counter, String> for CounterHost {
//!     fn container(&self) -> &Arc<dyn Container<Counter, String>> {
//!         &self.container
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let production: RealContainer<Counter, String> =
//!     RealContainer::create(Counter { count: 0 }, Settings::default());
//! let test = TestHarness::wrap(&production, Counter { count: 3 }, TestOptions::default());
//! let host = CounterHost { container: test.clone() };
//!
//! let pipeline = host
//!     .intent("increment")
//!     .reduce(|ctx| Counter { count: ctx.state.count + 1 })
//!     .build();
//! host.dispatch(pipeline).await?;
//!
//! test.assert(Verification::new().state(Counter { count: 4 })).await?;
//! # Ok(())
//! # }
//! ```

mod harness;
mod observer;
mod verification;


pub use harness::{TestContainer, TestHarness, TestOptions};
pub use observer::TestStreamObserver;
pub use verification::Verification;
