//! # Document model
//!
//! A small in-memory element tree standing in for the host document. It is
//! what components attach to, install listeners on, and what portals move
//! subtrees around in. The same tree serialises to markup for server
//! rendering via [`Element::outer_html`].
//!
//! ```rust
//! use reprise_core::dom::{Document, RenderEnv};
//!
//! let doc = Document::new(RenderEnv::Browser);
//! let el = doc.create_element("media-menu");
//! el.set_attribute("data-open", "false");
//! doc.body().append_child(&el);
//!
//! assert!(el.is_connected());
//! assert_eq!(el.outer_html(), r#"<media-menu data-open="false"></media-menu>"#);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::effects::Dispose;
use crate::input::{KeyEvent, PointerKind};

new_key_type! {
    pub struct NodeId;
}

/// Where rendering happens. Browser-only behaviours (listeners, portals,
/// focus tracking) are suppressed on the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderEnv {
    #[default]
    Browser,
    Server,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    PointerDown,
    PointerUp,
    Click,
    PointerEnter,
    PointerLeave,
    KeyDown,
    KeyUp,
    Focus,
    Blur,
}

impl EventType {
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            EventType::Focus | EventType::Blur | EventType::PointerEnter | EventType::PointerLeave
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    PointerDown(PointerKind),
    PointerUp(PointerKind),
    Click(PointerKind),
    PointerEnter(PointerKind),
    PointerLeave(PointerKind),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    Focus,
    Blur,
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::PointerDown(_) => EventType::PointerDown,
            EventKind::PointerUp(_) => EventType::PointerUp,
            EventKind::Click(_) => EventType::Click,
            EventKind::PointerEnter(_) => EventType::PointerEnter,
            EventKind::PointerLeave(_) => EventType::PointerLeave,
            EventKind::KeyDown(_) => EventType::KeyDown,
            EventKind::KeyUp(_) => EventType::KeyUp,
            EventKind::Focus => EventType::Focus,
            EventKind::Blur => EventType::Blur,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: Element,
}

pub type DomHandler = Rc<dyn Fn(&DomEvent)>;

struct Listener {
    id: u64,
    ty: EventType,
    handler: DomHandler,
}

struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: SmallVec<[Listener; 2]>,
}

impl Node {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            listeners: SmallVec::new(),
        }
    }
}

struct DocInner {
    env: RenderEnv,
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    body: NodeId,
    portal_root: Option<NodeId>,
    focused: Option<NodeId>,
    next_listener: u64,
}

impl DocInner {
    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(id).and_then(|n| n.parent.take());
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
    }

    fn ancestors_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            if !self.nodes.contains_key(n) {
                break;
            }
            path.push(n);
            cur = self.nodes[n].parent;
        }
        path
    }
}

#[derive(Clone)]
pub struct Document(Rc<RefCell<DocInner>>);

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Document")
            .field("env", &inner.env)
            .field("nodes", &inner.nodes.len())
            .finish()
    }
}

impl Document {
    pub fn new(env: RenderEnv) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("#document"));
        let body = nodes.insert(Node::new("body"));
        nodes[body].parent = Some(root);
        nodes[root].children.push(body);
        Self(Rc::new(RefCell::new(DocInner {
            env,
            nodes,
            root,
            body,
            portal_root: None,
            focused: None,
            next_listener: 0,
        })))
    }

    pub fn env(&self) -> RenderEnv {
        self.0.borrow().env
    }

    pub fn is_browser(&self) -> bool {
        self.env() == RenderEnv::Browser
    }

    fn element(&self, id: NodeId) -> Element {
        Element {
            doc: self.clone(),
            id,
        }
    }

    pub fn root(&self) -> Element {
        let id = self.0.borrow().root;
        self.element(id)
    }

    pub fn body(&self) -> Element {
        let id = self.0.borrow().body;
        self.element(id)
    }

    pub fn create_element(&self, tag: impl Into<String>) -> Element {
        let id = self.0.borrow_mut().nodes.insert(Node::new(tag));
        self.element(id)
    }

    /// The fixed mount point portalled content is relocated into, created on
    /// first use as the last child of `body`.
    pub fn portal_root(&self) -> Element {
        let existing = self.0.borrow().portal_root;
        if let Some(id) = existing
            && self.0.borrow().nodes.contains_key(id)
        {
            return self.element(id);
        }
        let el = self.create_element("div");
        el.set_attribute("data-portal-root", "");
        self.body().append_child(&el);
        self.0.borrow_mut().portal_root = Some(el.id);
        el
    }

    pub fn node_count(&self) -> usize {
        self.0.borrow().nodes.len()
    }

    pub fn focused(&self) -> Option<Element> {
        let id = self.0.borrow().focused;
        id.map(|id| self.element(id))
    }

    /// Moves focus to `el`, firing `Blur` on the previous element first.
    pub fn focus(&self, el: &Element) {
        let prev = {
            let mut inner = self.0.borrow_mut();
            if inner.focused == Some(el.id) {
                return;
            }
            inner.focused.replace(el.id)
        };
        if let Some(prev) = prev {
            self.dispatch(&self.element(prev), EventKind::Blur);
        }
        self.dispatch(el, EventKind::Focus);
    }

    pub fn blur(&self) {
        let prev = self.0.borrow_mut().focused.take();
        if let Some(prev) = prev {
            self.dispatch(&self.element(prev), EventKind::Blur);
        }
    }

    /// Document-level listener; sees every bubbling event.
    pub fn add_listener(&self, ty: EventType, f: impl Fn(&DomEvent) + 'static) -> Dispose {
        self.root().add_listener(ty, f)
    }

    pub fn listener_count(&self) -> usize {
        let inner = self.0.borrow();
        inner.nodes[inner.root].listeners.len()
    }

    /// Delivers `kind` to `target` and, for bubbling events, to each ancestor.
    pub fn dispatch(&self, target: &Element, kind: EventKind) {
        let ty = kind.event_type();
        let path = {
            let inner = self.0.borrow();
            let path = inner.ancestors_inclusive(target.id);
            if ty.bubbles() { path } else { path.into_iter().take(1).collect() }
        };
        let event = DomEvent {
            kind,
            target: target.clone(),
        };
        for node in path {
            let handlers: Vec<DomHandler> = {
                let inner = self.0.borrow();
                match inner.nodes.get(node) {
                    Some(n) => n
                        .listeners
                        .iter()
                        .filter(|l| l.ty == ty)
                        .map(|l| l.handler.clone())
                        .collect(),
                    None => continue,
                }
            };
            for h in handlers {
                h(&event);
            }
        }
    }

    /// Pointer press on `target`: down, up, then click.
    pub fn press(&self, target: &Element, kind: PointerKind) {
        self.dispatch(target, EventKind::PointerDown(kind));
        self.dispatch(target, EventKind::PointerUp(kind));
        self.dispatch(target, EventKind::Click(kind));
    }

    pub fn key_down(&self, target: &Element, key: impl Into<KeyEvent>) {
        self.dispatch(target, EventKind::KeyDown(key.into()));
    }
}

#[derive(Clone)]
pub struct Element {
    doc: Document,
    id: NodeId,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc == other.doc
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}#{:?}>", self.tag(), self.id)
    }
}

impl Element {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tag(&self) -> String {
        self.doc
            .0
            .borrow()
            .nodes
            .get(self.id)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.doc
            .0
            .borrow()
            .nodes
            .get(self.id)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        if let Some(n) = self.doc.0.borrow_mut().nodes.get_mut(self.id) {
            n.attrs.insert(name.into(), value.into());
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let Some(n) = self.doc.0.borrow_mut().nodes.get_mut(self.id) {
            n.attrs.remove(name);
        }
    }

    /// Presence-style attribute: set to `""` when `on`, removed otherwise.
    pub fn toggle_attribute(&self, name: &str, on: bool) {
        if on {
            self.set_attribute(name, "");
        } else {
            self.remove_attribute(name);
        }
    }

    pub fn add_class(&self, class: &str) {
        let current = self.attribute("class").unwrap_or_default();
        if current.split_whitespace().any(|c| c == class) {
            return;
        }
        let next = if current.is_empty() {
            class.to_string()
        } else {
            format!("{current} {class}")
        };
        self.set_attribute("class", next);
    }

    pub fn remove_class(&self, class: &str) {
        let Some(current) = self.attribute("class") else {
            return;
        };
        let rest: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
        if rest.is_empty() {
            self.remove_attribute("class");
        } else {
            self.set_attribute("class", rest.join(" "));
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn text(&self) -> String {
        self.doc
            .0
            .borrow()
            .nodes
            .get(self.id)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        if let Some(n) = self.doc.0.borrow_mut().nodes.get_mut(self.id) {
            n.text = text.into();
        }
    }

    pub fn parent(&self) -> Option<Element> {
        let parent = self.doc.0.borrow().nodes.get(self.id).and_then(|n| n.parent);
        parent.map(|id| self.doc.element(id))
    }

    pub fn children(&self) -> Vec<Element> {
        let ids = self
            .doc
            .0
            .borrow()
            .nodes
            .get(self.id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        ids.into_iter().map(|id| self.doc.element(id)).collect()
    }

    /// Moves `child` (detaching it from any previous parent) to the end of
    /// this element's children.
    pub fn append_child(&self, child: &Element) {
        let mut inner = self.doc.0.borrow_mut();
        if !inner.nodes.contains_key(self.id) || !inner.nodes.contains_key(child.id) {
            return;
        }
        if inner.ancestors_inclusive(self.id).contains(&child.id) {
            log::warn!("append_child: refusing to create a cycle");
            return;
        }
        inner.detach(child.id);
        inner.nodes[child.id].parent = Some(self.id);
        inner.nodes[self.id].children.push(child.id);
    }

    /// Detaches this element from its parent; it can be re-inserted later.
    pub fn remove(&self) {
        self.doc.0.borrow_mut().detach(self.id);
    }

    /// Detaches and frees this element and its subtree, dropping their
    /// listeners.
    pub fn discard(&self) {
        let mut inner = self.doc.0.borrow_mut();
        inner.detach(self.id);
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            if let Some(node) = inner.nodes.remove(id) {
                stack.extend(node.children);
            }
            if inner.focused == Some(id) {
                inner.focused = None;
            }
            if inner.portal_root == Some(id) {
                inner.portal_root = None;
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.doc.0.borrow().nodes.contains_key(self.id)
    }

    /// Whether this element is reachable from the document root.
    pub fn is_connected(&self) -> bool {
        let inner = self.doc.0.borrow();
        inner.ancestors_inclusive(self.id).last() == Some(&inner.root)
    }

    /// Inclusive containment, like `Node.contains`.
    pub fn contains(&self, other: &Element) -> bool {
        if self.doc != other.doc {
            return false;
        }
        self.doc
            .0
            .borrow()
            .ancestors_inclusive(other.id)
            .contains(&self.id)
    }

    /// Last descendant (document order) whose `data-part` equals `part`.
    pub fn query_part(&self, part: &str) -> Option<Element> {
        let inner = self.doc.0.borrow();
        let mut found = None;
        let mut stack: Vec<NodeId> = inner
            .nodes
            .get(self.id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            let Some(node) = inner.nodes.get(id) else {
                continue;
            };
            if node.attrs.get("data-part").map(String::as_str) == Some(part) {
                found = Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        drop(inner);
        found.map(|id| self.doc.element(id))
    }

    pub fn add_listener(&self, ty: EventType, f: impl Fn(&DomEvent) + 'static) -> Dispose {
        let id = {
            let mut inner = self.doc.0.borrow_mut();
            let id = inner.next_listener;
            inner.next_listener += 1;
            if let Some(n) = inner.nodes.get_mut(self.id) {
                n.listeners.push(Listener {
                    id,
                    ty,
                    handler: Rc::new(f),
                });
            }
            id
        };
        let doc = self.doc.clone();
        let node = self.id;
        Dispose::new(move || {
            if let Some(n) = doc.0.borrow_mut().nodes.get_mut(node) {
                n.listeners.retain(|l| l.id != id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.doc
            .0
            .borrow()
            .nodes
            .get(self.id)
            .map(|n| n.listeners.len())
            .unwrap_or(0)
    }

    pub fn outer_html(&self) -> String {
        let inner = self.doc.0.borrow();
        let mut out = String::new();
        write_node(&inner, self.id, &mut out);
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_node(inner: &DocInner, id: NodeId, out: &mut String) {
    let Some(node) = inner.nodes.get(id) else {
        return;
    };
    let is_root = id == inner.root;
    if !is_root {
        out.push('<');
        out.push_str(&node.tag);
        for (k, v) in &node.attrs {
            out.push_str(&format!(" {k}=\"{}\"", escape(v)));
        }
        out.push('>');
    }
    out.push_str(&escape(&node.text));
    for child in &node.children {
        write_node(inner, *child, out);
    }
    if !is_root {
        out.push_str(&format!("</{}>", node.tag));
    }
}
