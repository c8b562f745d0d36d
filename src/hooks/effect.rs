//! Dependency-keyed effects with paired cleanup.
//!
//! [`use_effect`] runs a setup function whenever its dependency value changes
//! by identity, and runs the previous setup's cleanup first. It follows the
//! same EffectScope pattern as the rest of the crate:
//! 1. Create an EffectScope owning the tracking effect
//! 2. The effect reads the dependency getter (reactive) and compares it with
//!    the previous value using [`SameAs`]
//! 3. On change: run previous cleanup, then setup, and store the new cleanup
//! 4. `on_scope_dispose()` runs the last cleanup when the scope stops
//!
//! Identity, not equality: a caller that wants to re-run setup must hand over
//! a new reference.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose};

use crate::element::{Element, ElementHandle, ElementRef};
use crate::types::Cleanup;

// =============================================================================
// Identity Comparison
// =============================================================================

/// Identity comparison for effect dependencies.
pub trait SameAs {
    fn same_as(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameAs for Rc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: SameAs> SameAs for Option<T> {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_as(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<A: SameAs, B: SameAs> SameAs for (A, B) {
    fn same_as(&self, other: &Self) -> bool {
        self.0.same_as(&other.0) && self.1.same_as(&other.1)
    }
}

impl SameAs for Element {
    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl SameAs for ElementRef {
    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl SameAs for ElementHandle {
    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// =============================================================================
// use_effect
// =============================================================================

/// Run `setup` now and again whenever `deps()` yields a different identity.
///
/// `setup` may return a cleanup; it runs before the next setup and when the
/// returned [`Cleanup`] is called. Reading signals inside `deps` subscribes
/// the effect to them; reads inside `setup` are not compared.
///
/// # Example
///
/// ```ignore
/// use spark_bound::hooks::use_effect;
/// use spark_signals::signal;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let config = Rc::new(RefCell::new(Rc::new(42)));
/// let generation = signal(0u64);
///
/// let (config_clone, generation_clone) = (config.clone(), generation.clone());
/// let stop = use_effect(
///     move || {
///         generation_clone.get();
///         config_clone.borrow().clone()
///     },
///     |value| {
///         println!("setup {value}");
///         Some(Box::new(|| println!("cleanup")) as Cleanup)
///     },
/// );
///
/// *config.borrow_mut() = Rc::new(42);
/// generation.set(1); // new Rc: cleanup, then setup
/// stop();            // cleanup
/// ```
pub fn use_effect<D, S>(deps: impl Fn() -> D + 'static, setup: S) -> Cleanup
where
    D: SameAs + 'static,
    S: FnMut(&D) -> Option<Cleanup> + 'static,
{
    let cleanup: Rc<RefCell<Option<Cleanup>>> = Rc::new(RefCell::new(None));
    let previous: Rc<RefCell<Option<D>>> = Rc::new(RefCell::new(None));

    let scope = effect_scope(false);

    let cleanup_for_update = cleanup.clone();
    let cleanup_for_dispose = cleanup.clone();
    let mut setup = setup;

    scope.run(move || {
        let _effect_cleanup = effect(move || {
            let current = deps();

            // Skip if dependencies unchanged
            if let Some(prev) = previous.borrow().as_ref() {
                if prev.same_as(&current) {
                    return;
                }
            }

            // Take first so a cleanup that touches signals can't re-borrow
            let prev_cleanup = cleanup_for_update.borrow_mut().take();
            if let Some(prev_cleanup) = prev_cleanup {
                prev_cleanup();
            }

            let next_cleanup = setup(&current);

            *cleanup_for_update.borrow_mut() = next_cleanup;
            *previous.borrow_mut() = Some(current);
        });

        on_scope_dispose(move || {
            let last = cleanup_for_dispose.borrow_mut().take();
            if let Some(cleanup_fn) = last {
                cleanup_fn();
            }
        });
    });

    Box::new(move || {
        scope.stop();
    })
}

// =============================================================================
// Tests
// =============================================================================
