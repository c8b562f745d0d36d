//! Hooks - lifecycle-aware reactive helpers.
//!
//! - [`use_effect`] - setup/cleanup effect keyed on an identity-compared value
//! - [`use_bound`] - element visibility ratios backed by a boundary watcher
//!
//! Hooks return their teardown: a [`Cleanup`](crate::Cleanup) or a handle
//! whose `dispose()`/`Drop` ends every session they started.

mod effect;
mod use_bound;

pub use effect::*;
pub use use_bound::*;
