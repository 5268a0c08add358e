use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::reactive::{self, ObserverId};
use crate::scope::{current_depth, current_scope};

#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

/// Helper to register cleanup inside effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// Handle to a dependency-tracked effect.
///
/// Dropping the handle does not stop the effect: it lives until
/// [`Effect::dispose`] or until the scope it was created in is disposed.
#[derive(Clone)]
pub struct Effect(Rc<EffectInner>);

struct EffectInner {
    observer: Cell<Option<ObserverId>>,
    cleanup: RefCell<Option<Dispose>>,
}

impl Effect {
    pub fn dispose(&self) {
        if let Some(id) = self.0.observer.take() {
            reactive::remove_observer(id);
        }
        let cleanup = self.0.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.observer.get().is_some()
    }
}

/// Runs `f()` now under dependency tracking and again whenever a signal it
/// read changes. The returned cleanup (if any) runs before the next run and
/// when the effect is disposed.
pub fn effect<F>(f: F) -> Effect
where
    F: Fn() -> Option<Dispose> + 'static,
{
    let inner = Rc::new(EffectInner {
        observer: Cell::new(None),
        cleanup: RefCell::new(None),
    });

    let id = reactive::new_observer(current_depth(), {
        let inner = inner.clone();
        move || {
            let prev = inner.cleanup.borrow_mut().take();
            if let Some(prev) = prev {
                reactive::untrack(|| prev.run());
            }
            let next = f();
            *inner.cleanup.borrow_mut() = next;
        }
    });
    inner.observer.set(Some(id));
    reactive::run_observer_now(id);

    let handle = Effect(inner);
    // auto-register cleanup in the current scope if one exists
    if let Some(scope) = current_scope() {
        let h = handle.clone();
        scope.add_disposer(move || h.dispose());
    }
    handle
}
