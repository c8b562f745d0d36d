//! Element handles - what the tracker watches.
//!
//! - [`Element`] - a shared reference to one element's bounds and mount state
//! - [`ElementRef`] - a mutable cell that may or may not hold an element yet
//! - [`ElementHandle`] - either of the above, as passed to the tracker
//! - [`resolve`] - turn a handle into a mounted element, or nothing
//!
//! Element bounds are written by the host (usually from layout, see
//! [`crate::layout::sync_element`]) and read by the boundary watcher.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::types::BoundRect;

// =============================================================================
// Element
// =============================================================================

thread_local! {
    /// Counter for generating element IDs.
    static ID_COUNTER: Cell<u64> = const { Cell::new(0) };
}

fn next_id() -> ElementId {
    ID_COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        ElementId(id)
    })
}

/// Unique (per thread) element identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

struct ElementInner {
    id: ElementId,
    bounds: Cell<BoundRect>,
    mounted: Cell<bool>,
}

/// A mounted (or formerly mounted) element.
///
/// Cloning is cheap and yields the same element; equality is identity.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    /// Create a mounted element with the given absolute bounds.
    pub fn new(bounds: BoundRect) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                id: next_id(),
                bounds: Cell::new(bounds),
                mounted: Cell::new(true),
            }),
        }
    }

    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    pub fn bounds(&self) -> BoundRect {
        self.inner.bounds.get()
    }

    /// Update the element's absolute bounds (after layout or scrolling).
    pub fn set_bounds(&self, bounds: BoundRect) {
        self.inner.bounds.set(bounds);
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// Mark the element as detached from the UI tree.
    pub fn unmount(&self) {
        self.inner.mounted.set(false);
    }

    /// Mark the element as attached again.
    pub fn mount(&self) {
        self.inner.mounted.set(true);
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id())
            .field("bounds", &self.bounds())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

// =============================================================================
// ElementRef
// =============================================================================

/// A mutable cell whose current element may change over its lifetime.
///
/// Reading it is not reactive: changing the contents does not by itself
/// start a new tracking cycle.
#[derive(Clone, Default)]
pub struct ElementRef {
    current: Rc<RefCell<Option<Element>>>,
}

impl ElementRef {
    /// Create an empty cell (element not mounted yet).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(element: Element) -> Self {
        let cell = Self::new();
        cell.set(Some(element));
        cell
    }

    pub fn get(&self) -> Option<Element> {
        self.current.borrow().clone()
    }

    pub fn set(&self, element: Option<Element>) {
        *self.current.borrow_mut() = element;
    }

    /// Identity comparison of the cell itself, not its contents.
    pub fn ptr_eq(&self, other: &ElementRef) -> bool {
        Rc::ptr_eq(&self.current, &other.current)
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.get()).finish()
    }
}

// =============================================================================
// ElementHandle
// =============================================================================

/// What the caller hands the tracker: a cell or a fixed element.
#[derive(Debug, Clone)]
pub enum ElementHandle {
    Ref(ElementRef),
    Element(Element),
}

impl ElementHandle {
    /// Identity comparison. Handles of different variants are never the same.
    pub fn ptr_eq(&self, other: &ElementHandle) -> bool {
        match (self, other) {
            (ElementHandle::Ref(a), ElementHandle::Ref(b)) => a.ptr_eq(b),
            (ElementHandle::Element(a), ElementHandle::Element(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Element> for ElementHandle {
    fn from(element: Element) -> Self {
        ElementHandle::Element(element)
    }
}

impl From<ElementRef> for ElementHandle {
    fn from(cell: ElementRef) -> Self {
        ElementHandle::Ref(cell)
    }
}

/// Resolve a handle to a mounted element.
///
/// Returns `None` when the cell is empty or the element is not mounted.
pub fn resolve(handle: &ElementHandle) -> Option<Element> {
    let element = match handle {
        ElementHandle::Ref(cell) => cell.get()?,
        ElementHandle::Element(element) => element.clone(),
    };

    element.is_mounted().then_some(element)
}

// =============================================================================
// Tests
// =============================================================================
