//! Viewport state signals.
//!
//! The viewport is the default boundary root: the whole terminal, anchored at
//! `(0, 0)`. Its size lives in reactive signals so layout and render effects
//! can depend on it; [`watch_viewport`] is one such effect, re-evaluating
//! every boundary watch whenever the size changes.

use std::cell::RefCell;

use crossterm::event::Event;
use spark_signals::{effect, signal, untrack, Signal};

use crate::boundary;
use crate::types::{BoundRect, Cleanup};

// =============================================================================
// Viewport Size Signals
// =============================================================================

thread_local! {
    static VIEWPORT_WIDTH: RefCell<Signal<u16>> = RefCell::new(signal(80));
    static VIEWPORT_HEIGHT: RefCell<Signal<u16>> = RefCell::new(signal(24));
}

/// Get the current viewport size as (width, height).
pub fn viewport_size() -> (u16, u16) {
    (
        VIEWPORT_WIDTH.with(|w| w.borrow().get()),
        VIEWPORT_HEIGHT.with(|h| h.borrow().get()),
    )
}

/// Set the viewport size (called on resize events).
pub fn set_viewport_size(width: u16, height: u16) {
    VIEWPORT_WIDTH.with(|w| w.borrow().set(width));
    VIEWPORT_HEIGHT.with(|h| h.borrow().set(height));
}

/// Get the viewport width signal for reactive tracking.
pub fn viewport_width_signal() -> Signal<u16> {
    VIEWPORT_WIDTH.with(|w| w.borrow().clone())
}

/// Get the viewport height signal for reactive tracking.
pub fn viewport_height_signal() -> Signal<u16> {
    VIEWPORT_HEIGHT.with(|h| h.borrow().clone())
}

/// The viewport as an absolute rectangle.
pub fn viewport_rect() -> BoundRect {
    let (width, height) = viewport_size();
    BoundRect::new(0.0, 0.0, f32::from(width), f32::from(height))
}

/// Re-run [`boundary::notify`] whenever the viewport size changes.
///
/// For hosts that update the size through [`set_viewport_size`] rather than
/// [`handle_event`]. Runs once immediately. Returns a cleanup that stops it.
pub fn watch_viewport() -> Cleanup {
    let width = viewport_width_signal();
    let height = viewport_height_signal();

    let stop = effect(move || {
        let (w, h) = (width.get(), height.get());
        tracing::trace!(width = w, height = h, "viewport changed, notifying watches");
        // Callbacks may read signals of their own; keep them out of this effect
        untrack(boundary::notify);
    });

    Box::new(stop)
}

// =============================================================================
// Terminal Integration
// =============================================================================

/// Detect and set the actual viewport size from the terminal.
pub fn detect_viewport_size() {
    if let Ok((width, height)) = crossterm::terminal::size() {
        set_viewport_size(width, height);
    }
}

/// Feed a terminal event to the viewport.
///
/// Resize events update the size and re-evaluate every boundary watch.
/// Returns `true` if the event was handled.
pub fn handle_event(event: &Event) -> bool {
    match event {
        Event::Resize(width, height) => {
            tracing::debug!(width, height, "viewport resized");
            set_viewport_size(*width, *height);
            boundary::notify();
            true
        }
        _ => false,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{reset_watches, Boundary, RatioCallback, Watcher};
    use crate::element::Element;
    use crossterm::event::{KeyCode, KeyEvent};
    use std::rc::Rc;

    #[test]
    fn test_viewport_size() {
        set_viewport_size(120, 40);
        assert_eq!(viewport_size(), (120, 40));
        assert_eq!(viewport_rect(), BoundRect::new(0.0, 0.0, 120.0, 40.0));
    }

    #[test]
    fn test_handle_resize_event() {
        assert!(handle_event(&Event::Resize(100, 30)));
        assert_eq!(viewport_size(), (100, 30));
    }

    #[test]
    fn test_ignores_other_events() {
        set_viewport_size(80, 24);
        let key = Event::Key(KeyEvent::from(KeyCode::Char('q')));
        assert!(!handle_event(&key));
        assert_eq!(viewport_size(), (80, 24));
    }

    #[test]
    fn test_size_signals_follow_setter() {
        set_viewport_size(90, 30);
        assert_eq!(viewport_width_signal().get(), 90);
        assert_eq!(viewport_height_signal().get(), 30);
    }

    #[test]
    fn test_watch_viewport_notifies_on_size_change() {
        reset_watches();
        set_viewport_size(80, 24);

        let leaves = Rc::new(RefCell::new(Vec::new()));
        let enters = Rc::new(RefCell::new(Vec::new()));
        let on_enter: RatioCallback = {
            let enters = enters.clone();
            Rc::new(move |r: f64| enters.borrow_mut().push(r))
        };
        let on_leave: RatioCallback = {
            let leaves = leaves.clone();
            Rc::new(move |r: f64| leaves.borrow_mut().push(r))
        };

        let element = Element::new(BoundRect::new(0.0, 18.0, 10.0, 4.0));
        let mut boundary = Boundary::new(None).unwrap();
        boundary.watch(&element, on_enter, on_leave).unwrap();

        let stop = watch_viewport();
        assert_eq!(*enters.borrow(), vec![1.0]);

        // Shrinking the terminal pushes the element out
        set_viewport_size(80, 10);
        assert_eq!(*leaves.borrow(), vec![0.0]);

        stop();
        set_viewport_size(80, 24);
        assert_eq!(enters.borrow().len(), 1);
    }
}
