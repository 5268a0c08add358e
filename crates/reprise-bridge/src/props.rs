use std::fmt;
use std::rc::Rc;

use reprise_core::{Element, Event, PropValue};

use crate::node_ref::Ref;

pub type Callback = Rc<dyn Fn(&Event)>;

/// One entry of a host prop bag.
#[derive(Clone)]
pub enum HostValue {
    Value(PropValue),
    Callback(Callback),
    Ref(Ref),
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            HostValue::Callback(_) => f.write_str("Callback(..)"),
            HostValue::Ref(r) => f.debug_tuple("Ref").field(r).finish(),
        }
    }
}

/// The props a host framework passes to a bridge on one render, keyed by
/// the host's own names (`onSelect`, `asChild`, `ref`, ...). Setting a key
/// twice keeps the last value.
#[derive(Clone, Debug, Default)]
pub struct HostProps {
    entries: Vec<(String, HostValue)>,
}

impl HostProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: HostValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, HostValue::Value(value.into()));
        self
    }

    pub fn on(mut self, key: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.insert(key, HostValue::Callback(Rc::new(f)));
        self
    }

    /// Sets the caller ref under `ref`.
    pub fn node_ref(mut self, r: impl Into<Ref>) -> Self {
        self.insert("ref", HostValue::Ref(r.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&HostValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Static markup a host passes as children: plain elements, text, and
/// (for the single `asChild` child) its own ref.
#[derive(Clone, Debug)]
pub struct HostElement {
    tag: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    node_ref: Option<Ref>,
    children: Vec<HostElement>,
}

impl HostElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            text: None,
            node_ref: None,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn node_ref(mut self, r: impl Into<Ref>) -> Self {
        self.node_ref = Some(r.into());
        self
    }

    pub fn child(mut self, child: HostElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn own_ref(&self) -> Option<Ref> {
        self.node_ref.clone()
    }

    pub(crate) fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub(crate) fn text_content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub(crate) fn children(&self) -> &[HostElement] {
        &self.children
    }

    pub(crate) fn build_under(&self, parent: &Element) -> Built {
        let el = parent.document().create_element(self.tag.as_str());
        parent.append_child(&el);
        patch_attrs(&el, &[], &self.attrs);
        patch_text(&el, None, self.text.as_deref());
        let children = patch_children(&el, Vec::new(), &[], &self.children);
        if let Some(r) = &self.node_ref {
            r.set(Some(&el));
        }
        Built { el, children }
    }

    /// Brings `built`, rendered from `old`, in line with this description.
    fn patch(&self, old: &HostElement, built: Built) -> Built {
        let Built { el, children } = built;
        patch_attrs(&el, &old.attrs, &self.attrs);
        patch_text(&el, old.text.as_deref(), self.text.as_deref());
        let children = patch_children(&el, children, &old.children, &self.children);
        if let Some(r) = &old.node_ref {
            r.set(None);
        }
        if let Some(r) = &self.node_ref {
            r.set(Some(&el));
        }
        Built { el, children }
    }

    pub(crate) fn clear_refs(&self) {
        if let Some(r) = &self.node_ref {
            r.set(None);
        }
        for c in &self.children {
            c.clear_refs();
        }
    }
}

/// Elements created for a [`HostElement`] tree, kept so the next render
/// patches them in place.
#[derive(Debug)]
pub(crate) struct Built {
    el: Element,
    children: Vec<Built>,
}

/// Applies the change between two host attribute lists to `el`. Only keys
/// the host passed are touched, so attributes a component wrote survive.
/// `class` is merged token by token into the element's class list.
pub(crate) fn patch_attrs(el: &Element, old: &[(String, String)], new: &[(String, String)]) {
    let (old_classes, new_classes) = (class_tokens(old), class_tokens(new));
    for class in old_classes.iter().filter(|c| !new_classes.contains(*c)) {
        el.remove_class(class);
    }
    for class in &new_classes {
        el.add_class(class);
    }

    for (key, _) in old.iter().filter(|(k, _)| k != "class") {
        if lookup(new, key).is_none() {
            el.remove_attribute(key);
        }
    }
    for (key, value) in new.iter().filter(|(k, _)| k != "class") {
        if lookup(old, key) != Some(value.as_str()) {
            el.set_attribute(key.as_str(), value.as_str());
        }
    }
}

pub(crate) fn patch_text(el: &Element, old: Option<&str>, new: Option<&str>) {
    match (old, new) {
        (_, Some(text)) if old != Some(text) => el.set_text(text),
        (Some(_), None) => el.set_text(""),
        _ => {}
    }
}

/// Reuses elements position by position while tags match; from the first
/// mismatch on, old elements are discarded and the rest is built fresh.
pub(crate) fn patch_children(
    parent: &Element,
    built: Vec<Built>,
    old: &[HostElement],
    new: &[HostElement],
) -> Vec<Built> {
    let mut built = built.into_iter();
    let mut reuse = true;
    let mut out = Vec::with_capacity(new.len());
    for (i, desc) in new.iter().enumerate() {
        match (old.get(i), built.next()) {
            (Some(prev), Some(b)) if reuse && prev.tag == desc.tag && b.el.is_alive() => {
                out.push(desc.patch(prev, b));
            }
            (prev, existing) => {
                reuse = false;
                if let Some(prev) = prev {
                    prev.clear_refs();
                }
                if let Some(b) = existing {
                    b.el.discard();
                }
                out.push(desc.build_under(parent));
            }
        }
    }
    for b in built {
        b.el.discard();
    }
    for prev in old.iter().skip(new.len()) {
        prev.clear_refs();
    }
    out
}

fn class_tokens(attrs: &[(String, String)]) -> Vec<&str> {
    attrs
        .iter()
        .filter(|(k, _)| k == "class")
        .flat_map(|(_, v)| v.split_whitespace())
        .collect()
}

fn lookup<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
