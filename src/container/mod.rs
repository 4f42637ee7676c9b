// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Containers: the state cell, the side-effect queue, and the container
//! types built on them.

mod lazy;
mod real;
mod side_effect;
mod state;

pub use lazy::LazyCreateContainer;
pub use real::RealContainer;
pub use side_effect::{SideEffectChannel, SideEffectSender};
pub use state::{StateContainer, StateReader};
