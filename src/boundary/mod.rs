//! Boundary - configuration and the watcher contract.
//!
//! A boundary is the region an element is measured against: a root (the
//! viewport or another element) grown or shrunk by margins. A [`Watcher`]
//! observes one or more elements against its boundary and reports how much of
//! each has entered or left it.
//!
//! - [`BoundOptions`] - root, margins, threshold and an optional emit callback
//! - [`Watcher`] / [`WatcherFactory`] - the contract the tracker consumes
//! - [`Boundary`] - the built-in geometry watcher, driven by [`notify`]
//!
//! # Example
//!
//! ```ignore
//! use spark_bound::boundary::{BoundOptions, BoundMargins};
//!
//! let options = BoundOptions {
//!     margins: BoundMargins::all(-2.0),
//!     threshold: 0.5,
//!     ..Default::default()
//! };
//! ```

mod watcher;

pub use watcher::*;

use std::fmt;
use std::rc::Rc;

use crate::element::Element;
use crate::error::BoundError;

// =============================================================================
// Options
// =============================================================================

/// Container the boundary is measured against.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BoundRoot {
    /// The whole terminal viewport.
    #[default]
    Viewport,
    /// Another element's bounds.
    Element(Element),
}

/// Edge offsets applied to the root.
///
/// Positive values grow the boundary outward, negative values shrink it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundMargins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl BoundMargins {
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }

    /// Same offset on all four edges.
    pub const fn all(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub(crate) fn validate(&self) -> Result<(), BoundError> {
        for (edge, value) in [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ] {
            if !value.is_finite() {
                return Err(BoundError::InvalidMargin { edge, value });
            }
        }
        Ok(())
    }
}

/// Payload passed to [`BoundOptions::on_emit`] on each visibility change.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitAction {
    pub element: Element,
    pub inside: bool,
    pub outside: bool,
    pub ratio: f64,
}

/// Emit callback (Rc so one options value can feed many watchers).
pub type OnEmit = Rc<dyn Fn(&EmitAction)>;

/// Boundary configuration. Every field is optional.
#[derive(Clone, Default)]
pub struct BoundOptions {
    /// Root container. `None` means the viewport.
    pub root: Option<BoundRoot>,
    pub margins: BoundMargins,
    /// Minimum visible ratio for an element to count as inside.
    pub threshold: f64,
    pub on_emit: Option<OnEmit>,
}

impl BoundOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: BoundRoot) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_margins(mut self, margins: BoundMargins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_on_emit(mut self, on_emit: impl Fn(&EmitAction) + 'static) -> Self {
        self.on_emit = Some(Rc::new(on_emit));
        self
    }

    /// The root to measure against, with the viewport filled in as default.
    pub fn root(&self) -> BoundRoot {
        self.root.clone().unwrap_or_default()
    }
}

impl fmt::Debug for BoundOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOptions")
            .field("root", &self.root)
            .field("margins", &self.margins)
            .field("threshold", &self.threshold)
            .field("on_emit", &self.on_emit.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// =============================================================================
// Watcher Contract
// =============================================================================

/// Ratio callback handed to [`Watcher::watch`].
pub type RatioCallback = Rc<dyn Fn(f64)>;

/// Observes elements against a boundary.
pub trait Watcher {
    /// Start observing `element`.
    ///
    /// `on_enter` receives the ratio when the element is judged inside the
    /// boundary, `on_leave` when it is judged outside. Calls may come at any
    /// later time, never re-entrantly from `watch` itself.
    fn watch(
        &mut self,
        element: &Element,
        on_enter: RatioCallback,
        on_leave: RatioCallback,
    ) -> Result<(), BoundError>;

    /// Stop everything started by `watch`. Idempotent.
    fn un_watch(&mut self);
}

/// Builds a watcher from (optional) options.
pub trait WatcherFactory {
    type Watcher: Watcher + 'static;

    fn create(&self, options: Option<&BoundOptions>) -> Result<Self::Watcher, BoundError>;
}

impl<W, F> WatcherFactory for F
where
    W: Watcher + 'static,
    F: Fn(Option<&BoundOptions>) -> Result<W, BoundError>,
{
    type Watcher = W;

    fn create(&self, options: Option<&BoundOptions>) -> Result<W, BoundError> {
        self(options)
    }
}

// =============================================================================
// Tests
// =============================================================================
