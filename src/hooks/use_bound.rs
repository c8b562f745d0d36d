//! use_bound - element visibility as two reactive ratios.
//!
//! Resolves an [`ElementHandle`] to a mounted element, attaches a boundary
//! watcher to it and republishes the watcher's callbacks as two signals:
//! how much of the element has entered the boundary, and how much has left.
//!
//! # Lifecycle
//!
//! - Every time the handle or options change by identity, the previous
//!   session is torn down (`un_watch`) and a new cycle resolves the handle.
//! - A handle that does not resolve (empty cell, unmounted element) leaves
//!   the tracker idle. That is not an error.
//! - Callbacks from a torn-down session are ignored, even if the watcher
//!   keeps calling them.
//! - [`BoundHandle::dispose`] (or drop) ends the last session. So does
//!   stopping the effect scope the tracker was created in; either way the
//!   tracker ends up [`TrackerState::Terminated`].
//!
//! # Example
//!
//! ```ignore
//! use spark_bound::{use_bound, BoundInputs, Element, BoundRect};
//!
//! let element = Element::new(BoundRect::new(0.0, 30.0, 40.0, 6.0));
//! let inputs = BoundInputs::new(element, None);
//! let bound = use_bound(inputs.handle_getter(), inputs.options_getter())?;
//!
//! spark_bound::notify();
//! let (enter, leave) = bound.ratios();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{effect_scope, on_scope_dispose, signal, Signal};

use crate::boundary::{BoundOptions, BoundaryFactory, RatioCallback, Watcher, WatcherFactory};
use crate::element::{resolve, Element, ElementHandle};
use crate::error::BoundError;
use crate::types::Cleanup;

use super::effect::use_effect;

// =============================================================================
// Tracker State
// =============================================================================

/// Lifecycle state of one tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No session (nothing resolved yet, or the last cycle resolved nothing).
    Idle,
    /// A watcher session is active.
    Watching,
    /// Disposed. No further updates.
    Terminated,
}

/// Tracks which session may still write the ratios.
#[derive(Default)]
struct SessionGuard {
    next: Cell<u64>,
    active: Cell<Option<u64>>,
    terminated: Cell<bool>,
}

impl SessionGuard {
    fn begin(&self) -> u64 {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.active.set(Some(id));
        id
    }

    fn end(&self, id: u64) {
        if self.active.get() == Some(id) {
            self.active.set(None);
        }
    }

    fn is_active(&self, id: u64) -> bool {
        self.active.get() == Some(id)
    }
}

// =============================================================================
// Bound Handle
// =============================================================================

/// Handle returned by [`use_bound`]: the two ratios plus teardown.
///
/// Dropping the handle disposes the tracker, so keep it alive for as long as
/// the owning component lives.
pub struct BoundHandle {
    enter: Signal<f64>,
    leave: Signal<f64>,
    error: Signal<Option<BoundError>>,
    session: Rc<SessionGuard>,
    stop: Option<Cleanup>,
}

impl BoundHandle {
    /// Current `(enter_ratio, leave_ratio)`.
    pub fn ratios(&self) -> (f64, f64) {
        (self.enter.get(), self.leave.get())
    }

    pub fn enter_ratio(&self) -> f64 {
        self.enter.get()
    }

    pub fn leave_ratio(&self) -> f64 {
        self.leave.get()
    }

    /// Enter ratio signal for reactive tracking.
    pub fn enter_signal(&self) -> Signal<f64> {
        self.enter.clone()
    }

    /// Leave ratio signal for reactive tracking.
    pub fn leave_signal(&self) -> Signal<f64> {
        self.leave.clone()
    }

    /// Failure from the most recent cycle, if it failed.
    pub fn last_error(&self) -> Option<BoundError> {
        self.error.get()
    }

    pub fn state(&self) -> TrackerState {
        if self.session.terminated.get() {
            TrackerState::Terminated
        } else if self.session.active.get().is_some() {
            TrackerState::Watching
        } else {
            TrackerState::Idle
        }
    }

    pub fn is_watching(&self) -> bool {
        self.state() == TrackerState::Watching
    }

    /// Stop tracking and un-watch the current session. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
            self.session.terminated.set(true);
        }
    }
}

impl Drop for BoundHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Owner-side inputs for a tracker.
///
/// Holds the current handle and options and a generation signal. Every
/// setter (and [`rerender`](Self::rerender)) bumps the generation, which makes
/// the tracker re-read its inputs; work only happens when an input is a new
/// reference.
#[derive(Clone)]
pub struct BoundInputs {
    handle: Rc<RefCell<ElementHandle>>,
    options: Rc<RefCell<Option<Rc<BoundOptions>>>>,
    generation: Signal<u64>,
}

impl BoundInputs {
    pub fn new(handle: impl Into<ElementHandle>, options: Option<Rc<BoundOptions>>) -> Self {
        Self {
            handle: Rc::new(RefCell::new(handle.into())),
            options: Rc::new(RefCell::new(options)),
            generation: signal(0),
        }
    }

    pub fn set_handle(&self, handle: impl Into<ElementHandle>) {
        *self.handle.borrow_mut() = handle.into();
        self.rerender();
    }

    pub fn set_options(&self, options: Option<Rc<BoundOptions>>) {
        *self.options.borrow_mut() = options;
        self.rerender();
    }

    /// Re-run the owner's render pass without changing anything.
    pub fn rerender(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    pub fn handle_getter(&self) -> impl Fn() -> ElementHandle + 'static {
        let handle = self.handle.clone();
        let generation = self.generation.clone();
        move || {
            generation.get();
            handle.borrow().clone()
        }
    }

    pub fn options_getter(&self) -> impl Fn() -> Option<Rc<BoundOptions>> + 'static {
        let options = self.options.clone();
        let generation = self.generation.clone();
        move || {
            generation.get();
            options.borrow().clone()
        }
    }
}

// =============================================================================
// use_bound
// =============================================================================

/// Track an element against the built-in [`Boundary`](crate::boundary::Boundary).
///
/// See [`use_bound_with`].
pub fn use_bound(
    handle: impl Fn() -> ElementHandle + 'static,
    options: impl Fn() -> Option<Rc<BoundOptions>> + 'static,
) -> Result<BoundHandle, BoundError> {
    use_bound_with(BoundaryFactory, handle, options)
}

/// Track an element with watchers built by `factory`.
///
/// `handle` and `options` are getters; signals read inside them schedule a
/// new cycle, which only does work when either value is a new reference.
///
/// Returns an error if the first cycle fails to construct or start a
/// watcher. Failures in later cycles are reported via
/// [`BoundHandle::last_error`] and leave the tracker idle until the next
/// input change.
pub fn use_bound_with<F>(
    factory: F,
    handle: impl Fn() -> ElementHandle + 'static,
    options: impl Fn() -> Option<Rc<BoundOptions>> + 'static,
) -> Result<BoundHandle, BoundError>
where
    F: WatcherFactory + 'static,
{
    let enter = signal(0.0_f64);
    let leave = signal(0.0_f64);
    let error: Signal<Option<BoundError>> = signal(None);
    let session = Rc::new(SessionGuard::default());

    let enter_for_cycle = enter.clone();
    let leave_for_cycle = leave.clone();
    let error_for_cycle = error.clone();
    let session_for_cycle = session.clone();
    let cycles = Cell::new(0_u64);

    let stop = use_effect(
        move || (handle(), options()),
        move |(handle, options): &(ElementHandle, Option<Rc<BoundOptions>>)| {
            let cycle = cycles.get() + 1;
            cycles.set(cycle);
            error_for_cycle.set(None);

            let Some(element) = resolve(handle) else {
                tracing::debug!(cycle, "bound handle unresolved, staying idle");
                return None;
            };

            let started = start_session(
                &factory,
                &element,
                options.as_deref(),
                &enter_for_cycle,
                &leave_for_cycle,
                &session_for_cycle,
            );

            match started {
                Ok(cleanup) => Some(cleanup),
                Err(err) => {
                    if cycle > 1 {
                        tracing::warn!(cycle, element = %element.id(), error = %err, "bound session failed");
                    }
                    error_for_cycle.set(Some(err));
                    None
                }
            }
        },
    );

    // Attached to the owner's scope (if any) so the owner's teardown marks
    // the tracker terminated, not just idle.
    let lifetime = effect_scope(false);
    let session_for_dispose = session.clone();
    lifetime.run(move || {
        on_scope_dispose(move || session_for_dispose.terminated.set(true));
    });

    let mut bound = BoundHandle {
        enter,
        leave,
        error,
        session,
        stop: Some(Box::new(move || {
            stop();
            lifetime.stop();
        })),
    };

    if let Some(err) = bound.error.get() {
        bound.dispose();
        return Err(err);
    }

    Ok(bound)
}

/// Build a watcher and start watching `element`, returning the teardown.
fn start_session<F: WatcherFactory>(
    factory: &F,
    element: &Element,
    options: Option<&BoundOptions>,
    enter: &Signal<f64>,
    leave: &Signal<f64>,
    session: &Rc<SessionGuard>,
) -> Result<Cleanup, BoundError> {
    let mut watcher = factory.create(options)?;
    let id = session.begin();

    let on_enter: RatioCallback = {
        let enter = enter.clone();
        let session = session.clone();
        Rc::new(move |ratio| {
            if session.is_active(id) {
                enter.set(ratio);
            }
        })
    };
    let on_leave: RatioCallback = {
        let leave = leave.clone();
        let session = session.clone();
        Rc::new(move |ratio| {
            if session.is_active(id) {
                leave.set(ratio);
            }
        })
    };

    if let Err(err) = watcher.watch(element, on_enter, on_leave) {
        session.end(id);
        return Err(err);
    }
    tracing::debug!(session = id, element = %element.id(), "bound session started");

    let session = session.clone();
    Ok(Box::new(move || {
        session.end(id);
        watcher.un_watch();
        tracing::debug!(session = id, "bound session stopped");
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementId, ElementRef};
    use crate::types::BoundRect;

    #[derive(Default)]
    struct Log {
        created: usize,
        watched: Vec<ElementId>,
        unwatched: usize,
        callbacks: Vec<(RatioCallback, RatioCallback)>,
    }

    struct MockWatcher {
        log: Rc<RefCell<Log>>,
        fail_watch: bool,
    }

    impl Watcher for MockWatcher {
        fn watch(
            &mut self,
            element: &Element,
            on_enter: RatioCallback,
            on_leave: RatioCallback,
        ) -> Result<(), BoundError> {
            if self.fail_watch {
                return Err(BoundError::Watch("refused".into()));
            }
            let mut log = self.log.borrow_mut();
            log.watched.push(element.id());
            log.callbacks.push((on_enter, on_leave));
            Ok(())
        }

        fn un_watch(&mut self) {
            self.log.borrow_mut().unwatched += 1;
        }
    }

    #[derive(Clone, Default)]
    struct MockFactory {
        log: Rc<RefCell<Log>>,
        fail_create: Rc<Cell<bool>>,
        fail_watch: Rc<Cell<bool>>,
    }

    impl MockFactory {
        fn emit_enter(&self, session: usize, ratio: f64) {
            let callback = self.log.borrow().callbacks[session].0.clone();
            callback(ratio);
        }

        fn emit_leave(&self, session: usize, ratio: f64) {
            let callback = self.log.borrow().callbacks[session].1.clone();
            callback(ratio);
        }
    }

    impl WatcherFactory for MockFactory {
        type Watcher = MockWatcher;

        fn create(&self, _options: Option<&BoundOptions>) -> Result<MockWatcher, BoundError> {
            if self.fail_create.get() {
                return Err(BoundError::InvalidThreshold(2.0));
            }
            self.log.borrow_mut().created += 1;
            Ok(MockWatcher {
                log: self.log.clone(),
                fail_watch: self.fail_watch.get(),
            })
        }
    }

    fn element() -> Element {
        Element::new(BoundRect::new(0.0, 0.0, 10.0, 4.0))
    }

    #[test]
    fn test_fixed_element_starts_watching() {
        let factory = MockFactory::default();
        let e = element();
        let inputs = BoundInputs::new(e.clone(), None);

        let bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        assert_eq!(bound.state(), TrackerState::Watching);
        assert_eq!(bound.ratios(), (0.0, 0.0));
        assert_eq!(factory.log.borrow().watched, vec![e.id()]);
        assert_eq!(factory.log.borrow().unwatched, 0);
    }

    #[test]
    fn test_empty_cell_stays_idle() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(ElementRef::new(), None);

        let mut bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        assert_eq!(bound.state(), TrackerState::Idle);
        assert_eq!(factory.log.borrow().created, 0);

        bound.dispose();
        assert_eq!(factory.log.borrow().watched.len(), 0);
        assert_eq!(factory.log.borrow().unwatched, 0);
    }

    #[test]
    fn test_unmounted_element_stays_idle() {
        let factory = MockFactory::default();
        let e = element();
        e.unmount();
        let inputs = BoundInputs::new(e, None);

        let bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        assert_eq!(bound.state(), TrackerState::Idle);
        assert_eq!(factory.log.borrow().created, 0);
    }

    #[test]
    fn test_callbacks_update_ratios() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(element(), None);
        let bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        factory.emit_enter(0, 0.5);
        assert_eq!(bound.ratios(), (0.5, 0.0));

        factory.emit_leave(0, 0.3);
        assert_eq!(bound.ratios(), (0.5, 0.3));
    }

    #[test]
    fn test_rerender_with_same_inputs_keeps_session() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(element(), Some(Rc::new(BoundOptions::default())));
        let _bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        inputs.rerender();
        inputs.rerender();

        assert_eq!(factory.log.borrow().created, 1);
        assert_eq!(factory.log.borrow().unwatched, 0);
    }

    #[test]
    fn test_new_options_reference_restarts_session() {
        let factory = MockFactory::default();
        let e = element();
        let inputs = BoundInputs::new(e.clone(), Some(Rc::new(BoundOptions::default())));
        let bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        inputs.set_options(Some(Rc::new(BoundOptions::default())));

        assert_eq!(factory.log.borrow().watched, vec![e.id(), e.id()]);
        assert_eq!(factory.log.borrow().unwatched, 1);
        assert!(bound.is_watching());
    }

    #[test]
    fn test_late_callbacks_from_old_session_are_ignored() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(element(), None);
        let bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        factory.emit_enter(0, 0.2);
        inputs.set_handle(element());

        factory.emit_enter(0, 0.9);
        factory.emit_leave(0, 0.9);
        assert_eq!(bound.ratios(), (0.2, 0.0));

        factory.emit_enter(1, 0.7);
        assert_eq!(bound.ratios(), (0.7, 0.0));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(element(), None);
        let mut bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        bound.dispose();
        bound.dispose();
        drop(bound);

        assert_eq!(factory.log.borrow().unwatched, 1);
    }

    #[test]
    fn test_closure_factory() {
        let log: Rc<RefCell<Log>> = Rc::default();
        let factory = {
            let log = log.clone();
            move |_: Option<&BoundOptions>| -> Result<MockWatcher, BoundError> {
                log.borrow_mut().created += 1;
                Ok(MockWatcher {
                    log: log.clone(),
                    fail_watch: false,
                })
            }
        };
        let e = element();
        let inputs = BoundInputs::new(e.clone(), None);

        let mut bound =
            use_bound_with(factory, inputs.handle_getter(), inputs.options_getter()).unwrap();
        assert!(bound.is_watching());
        assert_eq!(log.borrow().created, 1);
        assert_eq!(log.borrow().watched, vec![e.id()]);

        bound.dispose();
        assert_eq!(log.borrow().unwatched, 1);
    }

    #[test]
    fn test_owner_scope_stop_terminates_tracker() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(element(), None);
        let slot: Rc<RefCell<Option<BoundHandle>>> = Rc::new(RefCell::new(None));

        let owner = effect_scope(false);
        {
            let factory = factory.clone();
            let inputs = inputs.clone();
            let slot = slot.clone();
            owner.run(move || {
                let bound =
                    use_bound_with(factory, inputs.handle_getter(), inputs.options_getter())
                        .unwrap();
                *slot.borrow_mut() = Some(bound);
            });
        }

        assert_eq!(slot.borrow().as_ref().unwrap().state(), TrackerState::Watching);

        owner.stop();

        let bound = slot.borrow_mut().take().unwrap();
        assert_eq!(bound.state(), TrackerState::Terminated);
        assert_eq!(factory.log.borrow().unwatched, 1);

        // Input changes after the owner is gone start nothing
        inputs.set_handle(element());
        assert_eq!(factory.log.borrow().created, 1);

        drop(bound);
        assert_eq!(factory.log.borrow().unwatched, 1);
    }

    #[test]
    fn test_dispose_marks_terminated() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(element(), None);
        let mut bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        bound.dispose();
        assert_eq!(bound.state(), TrackerState::Terminated);
    }

    #[test]
    fn test_first_cycle_failure_is_returned() {
        let factory = MockFactory::default();
        factory.fail_create.set(true);
        let inputs = BoundInputs::new(element(), None);

        let result =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter());

        assert!(matches!(result, Err(BoundError::InvalidThreshold(_))));
    }

    #[test]
    fn test_later_failure_is_reported_and_idle() {
        let factory = MockFactory::default();
        let inputs = BoundInputs::new(element(), None);
        let bound =
            use_bound_with(factory.clone(), inputs.handle_getter(), inputs.options_getter())
                .unwrap();

        factory.fail_watch.set(true);
        inputs.set_handle(element());

        assert_eq!(bound.state(), TrackerState::Idle);
        assert_eq!(bound.last_error(), Some(BoundError::Watch("refused".into())));
        assert_eq!(factory.log.borrow().unwatched, 1);

        // Recovers on the next input change
        factory.fail_watch.set(false);
        inputs.set_handle(element());
        assert!(bound.is_watching());
        assert_eq!(bound.last_error(), None);
    }
}
