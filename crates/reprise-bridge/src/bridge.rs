use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use reprise_core::*;

use crate::adapter::{HostAdapter, Jsx};
use crate::node_ref::{NodeRef, Ref, compose_refs};
use crate::props::{
    Built, Callback, HostElement, HostProps, HostValue, patch_attrs, patch_children, patch_text,
};

type Factory = Rc<dyn Fn(Option<&Instance>) -> Instance>;

struct BridgeDef {
    display_name: &'static str,
    factory: Factory,
    adapter: Rc<dyn HostAdapter>,
}

/// Describes how to mount one component type into a host tree. Cheap to
/// clone; each logical mount gets its own [`BridgeNode`].
#[derive(Clone)]
pub struct Bridge(Rc<BridgeDef>);

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("display_name", &self.0.display_name)
            .field("adapter", &self.0.adapter.name())
            .finish()
    }
}

impl Bridge {
    pub fn new<C: Component>(display_name: &'static str, make: impl Fn() -> C + 'static) -> Self {
        Self(Rc::new(BridgeDef {
            display_name,
            factory: Rc::new(move |parent| Instance::new(make(), parent)),
            adapter: Rc::new(Jsx),
        }))
    }

    pub fn with_adapter(self, adapter: impl HostAdapter) -> Self {
        Self(Rc::new(BridgeDef {
            display_name: self.0.display_name,
            factory: self.0.factory.clone(),
            adapter: Rc::new(adapter),
        }))
    }

    pub fn display_name(&self) -> &'static str {
        self.0.display_name
    }

    pub fn adapter(&self) -> &dyn HostAdapter {
        self.0.adapter.as_ref()
    }

    pub fn node(&self) -> BridgeNode {
        BridgeNode::new(self.clone())
    }
}

/// Where a bridge renders: the host element it appends to and the
/// component instance that encloses it, if any (contexts resolve through
/// that instance).
#[derive(Clone, Debug)]
pub struct Slot {
    element: Element,
    instance: Option<Instance>,
}

impl Slot {
    pub fn new(element: Element, instance: Option<Instance>) -> Self {
        Self { element, instance }
    }

    /// The document body, outside of any component.
    pub fn root(doc: &Document) -> Self {
        Self::new(doc.body(), None)
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    pub fn document(&self) -> &Document {
        self.element.document()
    }
}

struct Translated {
    as_child: bool,
    caller_ref: Option<Ref>,
    props: Vec<(&'static str, PropValue)>,
    callbacks: HashMap<&'static str, Callback>,
    attrs: Vec<(String, String)>,
}

fn translate(
    schema: &'static ComponentSchema,
    adapter: &dyn HostAdapter,
    props: &HostProps,
) -> Result<Translated> {
    let mut out = Translated {
        as_child: false,
        caller_ref: None,
        props: Vec::new(),
        callbacks: HashMap::new(),
        attrs: Vec::new(),
    };
    for (key, value) in props.iter() {
        match value {
            HostValue::Value(v) if key == adapter.as_child_key() => {
                out.as_child = to_bool(key, v)?;
            }
            HostValue::Ref(r) if key == adapter.ref_key() => {
                out.caller_ref = Some(r.clone());
            }
            HostValue::Callback(cb) => match adapter.event_for_key(schema, key) {
                Some(event) => {
                    out.callbacks.insert(event, cb.clone());
                }
                None => log::warn!("<{}> has no event for callback `{key}`", schema.tag),
            },
            HostValue::Value(v) => match schema.prop(key) {
                Some(decl) => out.props.push((decl.name, coerce(decl, v)?)),
                None => {
                    if let Some(text) = attribute_text(v) {
                        out.attrs.push((key.to_string(), text));
                    }
                }
            },
            HostValue::Ref(_) => log::warn!("<{}> ignoring ref passed as `{key}`", schema.tag),
        }
    }
    Ok(out)
}

fn to_bool(prop: &str, v: &PropValue) -> Result<bool> {
    match v {
        PropValue::Bool(b) => Ok(*b),
        PropValue::Text(t) => match t.as_ref() {
            "" | "true" => Ok(true),
            "false" => Ok(false),
            other => Err(Error::InvalidProp {
                prop: prop.to_string(),
                reason: format!("expected a boolean, got `{other}`"),
            }),
        },
        PropValue::Placement(_) => Err(Error::InvalidProp {
            prop: prop.to_string(),
            reason: "expected a boolean, got a placement".into(),
        }),
    }
}

/// Converts a host value to the type of the declared prop. Template hosts
/// pass everything as text.
fn coerce(decl: &PropDecl, v: &PropValue) -> Result<PropValue> {
    match (&decl.default, v) {
        (PropValue::Bool(_), _) => to_bool(decl.name, v).map(PropValue::Bool),
        (PropValue::Placement(_), PropValue::Text(t)) => Ok(PropValue::Placement(t.parse()?)),
        (PropValue::Placement(_), PropValue::Placement(_)) | (PropValue::Text(_), PropValue::Text(_)) => {
            Ok(v.clone())
        }
        (_, other) => Err(Error::InvalidProp {
            prop: decl.name.to_string(),
            reason: format!("unexpected value {other:?}"),
        }),
    }
}

fn attribute_text(v: &PropValue) -> Option<String> {
    match v {
        PropValue::Bool(true) => Some(String::new()),
        PropValue::Bool(false) => None,
        PropValue::Text(t) => Some(t.to_string()),
        PropValue::Placement(p) => Some(p.to_string()),
    }
}

fn single_child<'c>(tag: &'static str, children: &'c [HostElement]) -> Result<&'c HostElement> {
    match children {
        [child] => Ok(child),
        other => Err(Error::Composition {
            component: tag,
            found: other.len(),
        }),
    }
}

struct Mounted {
    instance: Instance,
    element: Element,
    as_child: bool,
    callbacks: Rc<RefCell<HashMap<&'static str, Callback>>>,
    forwarders: Vec<Dispose>,
    composite: Ref,
    attrs: Vec<(String, String)>,
    host_children: Vec<Built>,
    children: Vec<HostElement>,
}

impl Mounted {
    fn teardown(self) {
        log::debug!("<{}#{}> unmount", self.instance.tag(), self.instance.id());
        for f in &self.forwarders {
            f.run();
        }
        self.instance.destroy();
        self.composite.set(None);
        for c in &self.children {
            c.clear_refs();
        }
        self.element.discard();
    }

    fn set_refs(&mut self, node: &NodeRef, caller: Option<Ref>, child: Option<Ref>) {
        self.composite.set(None);
        self.composite = compose_refs([Some(Ref::Node(node.clone())), caller, child]);
        self.composite.set(Some(&self.element));
    }

    /// Patches what the host describes onto the element: the bag's
    /// attributes and, with `asChild`, the child's attributes, text and
    /// subtree. Returns the `asChild` child's own ref.
    fn render_host(
        &mut self,
        bag_attrs: Vec<(String, String)>,
        children: Vec<HostElement>,
    ) -> Result<Option<Ref>> {
        let child = if self.as_child {
            Some(single_child(self.instance.tag(), &children)?)
        } else {
            None
        };

        let attrs: Vec<(String, String)> = child
            .map(|c| c.attrs().to_vec())
            .unwrap_or_default()
            .into_iter()
            .chain(bag_attrs)
            .collect();
        patch_attrs(&self.element, &self.attrs, &attrs);
        self.attrs = attrs;

        let old = std::mem::take(&mut self.children);
        let built = std::mem::take(&mut self.host_children);
        let (old_kids, new_kids) = match child {
            Some(c) => {
                let prev = old.first();
                patch_text(
                    &self.element,
                    prev.and_then(HostElement::text_content),
                    c.text_content(),
                );
                (prev.map(HostElement::children).unwrap_or(&[]), c.children())
            }
            None => (old.as_slice(), children.as_slice()),
        };
        self.host_children = patch_children(&self.element, built, old_kids, new_kids);
        let child_ref = child.and_then(HostElement::own_ref);
        self.children = children;
        Ok(child_ref)
    }
}

/// One logical mount of a [`Bridge`]. The instance is created on the first
/// [`render`](BridgeNode::render), reused by every later render and
/// destroyed by [`unmount`](BridgeNode::unmount) or drop.
pub struct BridgeNode {
    bridge: Bridge,
    node: NodeRef,
    mounted: Option<Mounted>,
}

impl BridgeNode {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            node: NodeRef::new(),
            mounted: None,
        }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.mounted.as_ref().map(|m| &m.instance)
    }

    /// The element the component renders into.
    pub fn element(&self) -> Option<Element> {
        self.node.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Renders into `slot` and returns the slot nested bridges render into.
    pub fn render(
        &mut self,
        slot: &Slot,
        props: &HostProps,
        children: Vec<HostElement>,
    ) -> Result<Slot> {
        let current = self
            .mounted
            .as_ref()
            .map(|m| (m.instance.schema(), m.as_child));
        let Some((schema, as_child)) = current else {
            return self.mount(slot, props, children);
        };

        let t = translate(schema, self.bridge.adapter(), props)?;
        if t.as_child != as_child {
            log::debug!("<{}> asChild changed; remounting", schema.tag);
            self.unmount();
            return self.mount(slot, props, children);
        }
        if t.as_child {
            single_child(schema.tag, &children)?;
        }
        self.update(t, children)
    }

    fn mount(&mut self, slot: &Slot, props: &HostProps, children: Vec<HostElement>) -> Result<Slot> {
        let def = self.bridge.0.clone();
        let instance = (def.factory)(slot.instance());
        let t = translate(instance.schema(), def.adapter.as_ref(), props)?;

        let doc = slot.document();
        let element = if t.as_child {
            let child = single_child(instance.tag(), &children)?;
            doc.create_element(child.tag())
        } else {
            doc.create_element(instance.tag())
        };
        slot.element().append_child(&element);
        log::debug!(
            "<{}#{}> mount as {} ({})",
            instance.tag(),
            instance.id(),
            def.display_name,
            def.adapter.name()
        );

        let mut mounted = Mounted {
            instance: instance.clone(),
            element: element.clone(),
            as_child: t.as_child,
            callbacks: Rc::new(RefCell::new(t.callbacks)),
            forwarders: Vec::new(),
            composite: Ref::Composite(Vec::new()),
            attrs: Vec::new(),
            host_children: Vec::new(),
            children: Vec::new(),
        };

        let started = (|| -> Result<()> {
            let child_ref = mounted.render_host(t.attrs, children)?;
            instance.setup(t.props)?;
            for event in instance.schema().events {
                let callbacks = mounted.callbacks.clone();
                let forwarder = instance.listen(event, move |e| {
                    let cb = callbacks.borrow().get(e.name).cloned();
                    if let Some(cb) = cb {
                        cb(e);
                    }
                })?;
                mounted.forwarders.push(forwarder);
            }
            instance.attach(&element)?;
            mounted.set_refs(&self.node, t.caller_ref, child_ref);
            if doc.is_browser() && element.is_connected() {
                instance.connect()?;
            }
            Ok(())
        })();

        match started {
            Ok(()) => {
                self.mounted = Some(mounted);
                Ok(Slot::new(element, Some(instance)))
            }
            Err(err) => {
                log::warn!("<{}> failed to mount: {err}", instance.tag());
                mounted.teardown();
                Err(err)
            }
        }
    }

    fn update(&mut self, t: Translated, children: Vec<HostElement>) -> Result<Slot> {
        let (node, name) = (self.node.clone(), self.bridge.display_name());
        let Some(m) = self.mounted.as_mut() else {
            return Err(Error::NotConnected { component: name });
        };
        let instance = m.instance.clone();

        batch(|| -> Result<()> {
            for decl in instance.schema().props {
                match t.props.iter().find(|(name, _)| *name == decl.name) {
                    Some((_, value)) => instance.set_prop(decl.name, value.clone())?,
                    None => instance.reset_prop(decl.name)?,
                };
            }
            Ok(())
        })?;
        *m.callbacks.borrow_mut() = t.callbacks;
        let child_ref = m.render_host(t.attrs, children)?;
        m.set_refs(&node, t.caller_ref, child_ref);
        Ok(Slot::new(m.element.clone(), Some(instance)))
    }

    /// Destroys the instance, clears every ref and removes the element.
    pub fn unmount(&mut self) {
        if let Some(m) = self.mounted.take() {
            m.teardown();
        }
    }
}

impl Drop for BridgeNode {
    fn drop(&mut self) {
        self.unmount();
    }
}
