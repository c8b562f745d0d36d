//! # spark-bound
//!
//! Element visibility tracking for reactive terminal UIs.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! A tracker resolves an element handle, attaches a boundary watcher to the
//! element and republishes the watcher's callbacks as two signals:
//! ```text
//! ElementHandle → resolve → Watcher::watch → notify() → enter/leave signals
//! ```
//!
//! The host keeps element bounds current (from layout and scrolling) and calls
//! [`notify`] after anything moved. Terminal resizes go through
//! [`viewport::handle_event`], which notifies on its own, or through
//! [`viewport::set_viewport_size`] with a [`viewport::watch_viewport`] effect
//! running.
//!
//! ## Modules
//!
//! - [`types`] - Rectangles, intersection ratio, `Cleanup`
//! - [`element`] - Element, element cell, handle and resolution
//! - [`boundary`] - Options, watcher contract, built-in geometry watcher
//! - [`hooks`] - `use_effect` and `use_bound`
//! - [`viewport`] - Terminal viewport signals (the default boundary root)
//! - [`layout`] - Absolute element bounds from a Taffy tree

pub mod boundary;
pub mod element;
pub mod error;
pub mod hooks;
pub mod layout;
pub mod types;
pub mod viewport;

// Re-export commonly used items
pub use types::*;

pub use error::BoundError;

pub use element::{resolve, Element, ElementHandle, ElementId, ElementRef};

pub use boundary::{
    notify, reset_watches, watch_count, BoundMargins, BoundOptions, BoundRoot, Boundary,
    BoundaryFactory, EmitAction, OnEmit, RatioCallback, Watcher, WatcherFactory,
};

pub use hooks::{
    use_bound, use_bound_with, use_effect, BoundHandle, BoundInputs, SameAs, TrackerState,
};

pub use viewport::{
    detect_viewport_size, handle_event, set_viewport_size, viewport_height_signal, viewport_rect,
    viewport_size, viewport_width_signal, watch_viewport,
};

pub use layout::{absolute_bounds, apply_scroll, sync_element};
