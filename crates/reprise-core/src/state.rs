use std::rc::Rc;

use crate::reactive::{self, ObserverId};
use crate::scope::current_depth;
use crate::{Signal, signal};

/// Derived reactive value, recomputed whenever a signal read by `compute`
/// changes. Dependants are only notified when the result differs.
pub struct Memo<T: 'static> {
    value: Signal<T>,
    observer: Rc<MemoObserver>,
}

struct MemoObserver(ObserverId);

impl Drop for MemoObserver {
    fn drop(&mut self) {
        reactive::remove_observer(self.0);
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            observer: self.observer.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Memo<T> {
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        let compute = Rc::new(compute);
        let value = signal(reactive::untrack({
            let compute = compute.clone();
            move || compute()
        }));

        let id = reactive::new_observer(current_depth(), {
            let value = value.clone();
            move || {
                value.set_if_changed(compute());
            }
        });
        // Initial compute under tracking to establish dependencies
        reactive::run_observer_now(id);

        Self {
            value,
            observer: Rc::new(MemoObserver(id)),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn get_untracked(&self) -> T {
        self.value.get_untracked()
    }
}

pub fn memo<T: Clone + PartialEq + 'static>(compute: impl Fn() -> T + 'static) -> Memo<T> {
    Memo::new(compute)
}
