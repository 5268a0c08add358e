use std::cell::RefCell;
use std::rc::{Rc, Weak};

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

/// Ownership boundary for effects and registrations.
///
/// Everything added with [`Scope::add_disposer`] runs when the scope is
/// disposed, children first. A scope that is dropped without an explicit
/// `dispose` still runs its disposers.
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    depth: usize,
    parent: Option<Weak<ScopeInner>>,
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
    children: RefCell<Vec<Scope>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self::with_parent(0, None)
    }

    fn with_parent(depth: usize, parent: Option<Weak<ScopeInner>>) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                depth,
                parent,
                disposers: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Nesting depth; effects created in deeper scopes re-run after
    /// shallower ones.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<Weak<ScopeInner>>);
        impl Drop for Restore {
            fn drop(&mut self) {
                let prev = self.0.take();
                CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
            }
        }

        let prev = CURRENT_SCOPE.with(|current| {
            current
                .borrow_mut()
                .replace(Rc::downgrade(&self.inner))
        });
        let _restore = Restore(prev);
        f()
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn child(&self) -> Scope {
        let child = Scope::with_parent(self.inner.depth + 1, Some(Rc::downgrade(&self.inner)));
        self.inner.children.borrow_mut().push(child.clone());
        child
    }

    /// Live child scopes; disposed children detach themselves.
    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    pub fn dispose(self) {
        if let Some(parent) = self.inner.parent.as_ref().and_then(Weak::upgrade) {
            parent
                .children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(&c.inner, &self.inner));
        }

        // Dispose children first
        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        for child in children {
            child.dispose();
        }

        let disposers = std::mem::take(&mut *self.inner.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| Scope { inner }))
    })
}

/// Registers `f` with the current scope.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    match current_scope() {
        Some(scope) => scope.add_disposer(f),
        None => log::warn!("on_cleanup called outside of a scope; it will never run"),
    }
}

pub(crate) fn current_depth() -> usize {
    current_scope().map(|s| s.depth()).unwrap_or(0)
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            drop(child);
        }

        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }
}
