use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::reactive::{self, SignalId};

pub type SubId = usize;

/// Observable reactive cell.
///
/// Reads through [`Signal::get`] or [`Signal::with`] inside an effect or memo
/// register a dependency; writes re-run those dependants.
pub struct Signal<T: 'static> {
    id: SignalId,
    inner: Rc<RefCell<Inner<T>>>,
}

struct Inner<T> {
    value: T,
    next_sub: SubId,
    subs: Vec<(SubId, Rc<dyn Fn(&T)>)>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            id: reactive::next_signal_id(),
            inner: Rc::new(RefCell::new(Inner {
                value,
                next_sub: 0,
                subs: Vec::new(),
            })),
        }
    }

    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        reactive::register_signal_read(self.id);
        self.inner.borrow().value.clone()
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.borrow().value.clone()
    }

    /// Tracked read by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        reactive::register_signal_read(self.id);
        f(&self.inner.borrow().value)
    }

    pub fn set(&self, v: T) {
        self.inner.borrow_mut().value = v;
        self.notify();
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut self.inner.borrow_mut().value);
        self.notify();
    }

    /// Direct subscribers are called with the new value. They must not write
    /// back into this same signal.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_sub;
        inner.next_sub += 1;
        inner.subs.push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubId) {
        self.inner.borrow_mut().subs.retain(|(sub, _)| *sub != id);
    }

    fn notify(&self) {
        let subs: Vec<Rc<dyn Fn(&T)>> = self
            .inner
            .borrow()
            .subs
            .iter()
            .map(|(_, s)| s.clone())
            .collect();
        if !subs.is_empty() {
            let inner = self.inner.borrow();
            for s in subs {
                s(&inner.value);
            }
        }
        reactive::signal_changed(self.id);
    }
}

impl<T: PartialEq> Signal<T> {
    /// Writes only when the value differs. Returns whether it did.
    pub fn set_if_changed(&self, v: T) -> bool {
        if self.inner.borrow().value == v {
            return false;
        }
        self.set(v);
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &self.inner.borrow().value)
            .finish()
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}
