//! Geometry watcher - the built-in [`Watcher`] implementation.
//!
//! Watches live in a thread-local registry. Nothing is emitted from `watch()`
//! itself; the host calls [`notify`] after anything that can move elements
//! (layout, scrolling, resize) and every registered watch is re-evaluated.
//!
//! Emission rules for one watch:
//! - ratio = visible area of the element inside the boundary / element area
//! - inside = `ratio > 0 && ratio >= threshold`
//! - emits on its first evaluation and whenever `inside` flips
//! - inside calls `on_enter(ratio)`, outside calls `on_leave(ratio)`, then the
//!   options' `on_emit` runs with the full [`EmitAction`]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::element::Element;
use crate::error::BoundError;
use crate::types::{intersection_ratio, BoundRect};
use crate::viewport::viewport_rect;

use super::{BoundMargins, BoundOptions, BoundRoot, EmitAction, OnEmit, RatioCallback, Watcher, WatcherFactory};

// =============================================================================
// Registry
// =============================================================================

struct WatchEntry {
    element: Element,
    root: BoundRoot,
    margins: BoundMargins,
    threshold: f64,
    on_enter: RatioCallback,
    on_leave: RatioCallback,
    on_emit: Option<OnEmit>,
    /// `inside` from the last evaluation, `None` before the first.
    last_inside: Option<bool>,
}

/// One pending callback round, collected while the registry is borrowed.
struct Emission {
    watch_id: u64,
    callback: RatioCallback,
    on_emit: Option<OnEmit>,
    action: EmitAction,
}

thread_local! {
    /// Active watches by ID. Ordered so notify() emits in registration order.
    static WATCHES: RefCell<BTreeMap<u64, WatchEntry>> = RefCell::new(BTreeMap::new());

    /// Next watch ID.
    static NEXT_WATCH_ID: Cell<u64> = const { Cell::new(0) };
}

fn register(entry: WatchEntry) -> u64 {
    let id = NEXT_WATCH_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    WATCHES.with(|watches| {
        watches.borrow_mut().insert(id, entry);
    });
    id
}

fn unregister(id: u64) -> bool {
    WATCHES.with(|watches| watches.borrow_mut().remove(&id).is_some())
}

fn is_registered(id: u64) -> bool {
    WATCHES.with(|watches| watches.borrow().contains_key(&id))
}

/// Number of active watches on this thread.
pub fn watch_count() -> usize {
    WATCHES.with(|watches| watches.borrow().len())
}

/// Drop every watch without emitting (for tests and full teardown).
pub fn reset_watches() {
    WATCHES.with(|watches| watches.borrow_mut().clear());
}

// =============================================================================
// Evaluation
// =============================================================================

fn root_rect(root: &BoundRoot) -> Option<BoundRect> {
    match root {
        BoundRoot::Viewport => Some(viewport_rect()),
        BoundRoot::Element(element) if element.is_mounted() => Some(element.bounds()),
        BoundRoot::Element(_) => None,
    }
}

fn measure(entry: &WatchEntry) -> f64 {
    if !entry.element.is_mounted() {
        return 0.0;
    }
    let Some(root) = root_rect(&entry.root) else {
        return 0.0;
    };

    let m = entry.margins;
    let boundary = root.expand(m.top, m.right, m.bottom, m.left);
    intersection_ratio(&entry.element.bounds(), &boundary)
}

/// Re-evaluate every watch and fire callbacks for the ones that changed.
///
/// Callbacks run after the registry borrow is released, so they may freely
/// watch or un-watch. A watch removed by an earlier callback in the same pass
/// does not emit.
pub fn notify() {
    let emissions: Vec<Emission> = WATCHES.with(|watches| {
        let mut watches = watches.borrow_mut();
        let mut emissions = Vec::new();

        for (&watch_id, entry) in watches.iter_mut() {
            let ratio = measure(entry);
            let inside = ratio > 0.0 && ratio >= entry.threshold;

            if entry.last_inside == Some(inside) {
                continue;
            }
            entry.last_inside = Some(inside);

            let callback = if inside {
                entry.on_enter.clone()
            } else {
                entry.on_leave.clone()
            };

            emissions.push(Emission {
                watch_id,
                callback,
                on_emit: entry.on_emit.clone(),
                action: EmitAction {
                    element: entry.element.clone(),
                    inside,
                    outside: !inside,
                    ratio,
                },
            });
        }

        emissions
    });

    for emission in emissions {
        if !is_registered(emission.watch_id) {
            continue;
        }

        tracing::trace!(
            watch_id = emission.watch_id,
            element = %emission.action.element.id(),
            inside = emission.action.inside,
            ratio = emission.action.ratio,
            "boundary emit"
        );

        (emission.callback)(emission.action.ratio);
        if let Some(on_emit) = emission.on_emit {
            on_emit(&emission.action);
        }
    }
}

// =============================================================================
// Boundary
// =============================================================================

/// Geometry watcher measuring elements against a root plus margins.
///
/// Dropping a `Boundary` un-watches everything it watched.
pub struct Boundary {
    root: BoundRoot,
    margins: BoundMargins,
    threshold: f64,
    on_emit: Option<OnEmit>,
    watch_ids: Vec<u64>,
}

impl Boundary {
    /// Build a watcher, validating threshold and margins.
    ///
    /// `None` options means viewport root, zero margins, zero threshold.
    pub fn new(options: Option<&BoundOptions>) -> Result<Self, BoundError> {
        let defaults = BoundOptions::default();
        let options = options.unwrap_or(&defaults);

        if !options.threshold.is_finite() || !(0.0..=1.0).contains(&options.threshold) {
            return Err(BoundError::InvalidThreshold(options.threshold));
        }
        options.margins.validate()?;

        Ok(Self {
            root: options.root(),
            margins: options.margins,
            threshold: options.threshold,
            on_emit: options.on_emit.clone(),
            watch_ids: Vec::new(),
        })
    }

    /// Whether this boundary currently watches anything.
    pub fn is_watching(&self) -> bool {
        !self.watch_ids.is_empty()
    }
}

impl Watcher for Boundary {
    fn watch(
        &mut self,
        element: &Element,
        on_enter: RatioCallback,
        on_leave: RatioCallback,
    ) -> Result<(), BoundError> {
        let id = register(WatchEntry {
            element: element.clone(),
            root: self.root.clone(),
            margins: self.margins,
            threshold: self.threshold,
            on_enter,
            on_leave,
            on_emit: self.on_emit.clone(),
            last_inside: None,
        });
        tracing::debug!(watch_id = id, element = %element.id(), "boundary watch");
        self.watch_ids.push(id);
        Ok(())
    }

    fn un_watch(&mut self) {
        for id in self.watch_ids.drain(..) {
            if unregister(id) {
                tracing::debug!(watch_id = id, "boundary unwatch");
            }
        }
    }
}

impl Drop for Boundary {
    fn drop(&mut self) {
        self.un_watch();
    }
}

/// Factory producing [`Boundary`] watchers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryFactory;

impl WatcherFactory for BoundaryFactory {
    type Watcher = Boundary;

    fn create(&self, options: Option<&BoundOptions>) -> Result<Boundary, BoundError> {
        Boundary::new(options)
    }
}

// =============================================================================
// Tests
// =============================================================================
