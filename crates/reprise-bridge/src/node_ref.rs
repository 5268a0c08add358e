use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use reprise_core::Element;

/// Holds the element a bridge rendered into, or nothing while unmounted.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<Element>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Element> {
        self.0.borrow().clone()
    }

    pub fn set(&self, el: Option<&Element>) {
        *self.0.borrow_mut() = el.cloned();
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.get()).finish()
    }
}

/// Anything a host can hand a bridge as `ref`.
#[derive(Clone)]
pub enum Ref {
    Node(NodeRef),
    Callback(Rc<dyn Fn(Option<&Element>)>),
    Composite(Vec<Ref>),
}

impl Ref {
    pub fn callback(f: impl Fn(Option<&Element>) + 'static) -> Self {
        Ref::Callback(Rc::new(f))
    }

    /// Points every target at `el`; `None` clears them.
    pub fn set(&self, el: Option<&Element>) {
        match self {
            Ref::Node(node) => node.set(el),
            Ref::Callback(f) => f(el),
            Ref::Composite(refs) => {
                for r in refs {
                    r.set(el);
                }
            }
        }
    }
}

impl From<NodeRef> for Ref {
    fn from(node: NodeRef) -> Self {
        Ref::Node(node)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Node(n) => fmt::Debug::fmt(n, f),
            Ref::Callback(_) => f.write_str("Ref::Callback(..)"),
            Ref::Composite(refs) => f.debug_list().entries(refs).finish(),
        }
    }
}

/// Merges several optional refs into one that sets all of them.
pub fn compose_refs(refs: impl IntoIterator<Item = Option<Ref>>) -> Ref {
    Ref::Composite(refs.into_iter().flatten().collect())
}
