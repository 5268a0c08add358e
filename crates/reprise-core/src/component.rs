//! # Components
//!
//! A component is a framework-agnostic widget: a static [`ComponentSchema`]
//! (tag, declared props with defaults, declared events) plus behaviour hooks
//! implementing [`Component`]. Each mount gets its own [`Instance`], which
//! owns one reactive cell per declared prop, the listener lists for declared
//! events, the contexts it provides to descendants, and the [`Scope`] that
//! every effect and registration made by its hooks lives in.
//!
//! The lifecycle is linear:
//!
//! `Idle → Setup → Attached → Connected → Disconnected → Destroyed`
//!
//! - `setup` merges the supplied props over the schema defaults.
//! - `attach` binds the backing element; ancestor contexts are resolved here.
//! - `connect` runs once the element is in the live document; DOM listeners
//!   and text-sync effects belong here and are torn down on `disconnect`.
//! - `destroy` disposes everything the instance created. It also runs when
//!   the last handle is dropped without an explicit teardown.

use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dom::{Element, NodeId};
use crate::effects::Dispose;
use crate::error::{Error, Result};
use crate::input::InputModality;
use crate::placement::Placement;
use crate::reactive;
use crate::scope::Scope;
use crate::signal::{Signal, signal};

pub type InstanceId = u64;

thread_local! {
    static NEXT_INSTANCE: Cell<InstanceId> = const { Cell::new(1) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Idle,
    Setup,
    Attached,
    Connected,
    Disconnected,
    Destroyed,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PropValue {
    Bool(bool),
    Placement(Placement),
    Text(Cow<'static, str>),
}

impl PropValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_placement(&self) -> Option<Placement> {
        match self {
            PropValue::Placement(p) => Some(*p),
            PropValue::Text(t) => t.parse().ok(),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<&'static str> for PropValue {
    fn from(s: &'static str) -> Self {
        PropValue::Text(Cow::Borrowed(s))
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(Cow::Owned(s))
    }
}

impl From<Placement> for PropValue {
    fn from(p: Placement) -> Self {
        PropValue::Placement(p)
    }
}

#[derive(Debug)]
pub struct PropDecl {
    pub name: &'static str,
    pub default: PropValue,
}

/// Declared contract of a component: every bridge adapter honours the same
/// prop names, defaults and event names.
#[derive(Debug)]
pub struct ComponentSchema {
    pub tag: &'static str,
    pub props: &'static [PropDecl],
    pub events: &'static [&'static str],
}

impl ComponentSchema {
    pub fn prop(&self, name: &str) -> Option<&PropDecl> {
        self.props.iter().find(|p| p.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&'static str> {
        self.events.iter().copied().find(|e| *e == name)
    }
}

/// What caused an activation.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub modality: InputModality,
    pub node: Option<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventDetail {
    #[default]
    None,
    Trigger(Trigger),
}

#[derive(Clone, Debug)]
pub struct Event {
    pub name: &'static str,
    pub detail: EventDetail,
    pub target: InstanceId,
}

pub type Listener = Rc<dyn Fn(&Event)>;

/// Behaviour hooks of a component. Per-instance state lives in the
/// implementor (behind signals or cells); hooks run inside the instance's
/// scope, so effects they create are torn down with it.
pub trait Component: 'static {
    fn schema(&self) -> &'static ComponentSchema;

    fn on_setup(&self, _instance: &Instance) -> Result<()> {
        Ok(())
    }

    fn on_attach(&self, _instance: &Instance, _el: &Element) -> Result<()> {
        Ok(())
    }

    fn on_connect(&self, _instance: &Instance, _el: &Element) -> Result<()> {
        Ok(())
    }

    fn on_disconnect(&self, _instance: &Instance) {}

    fn on_destroy(&self, _instance: &Instance) {}
}

#[derive(Clone)]
pub struct Instance(Rc<InstanceInner>);

#[derive(Clone)]
pub struct WeakInstance(Weak<InstanceInner>);

struct InstanceInner {
    id: InstanceId,
    schema: &'static ComponentSchema,
    component: Rc<dyn Component>,
    any: Rc<dyn Any>,
    state: Cell<LifecycleState>,
    props: HashMap<&'static str, Signal<PropValue>>,
    listeners: RefCell<HashMap<&'static str, Vec<(u64, Listener)>>>,
    next_listener: Cell<u64>,
    contexts: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
    parent: Option<WeakInstance>,
    element: RefCell<Option<Element>>,
    scope: Scope,
    connect_scope: RefCell<Option<Scope>>,
}

impl Drop for InstanceInner {
    fn drop(&mut self) {
        if self.state.get() != LifecycleState::Destroyed {
            log::debug!("<{}#{}> dropped without destroy", self.schema.tag, self.id);
            let connected = self.connect_scope.borrow_mut().take();
            if let Some(scope) = connected {
                scope.dispose();
            }
            self.scope.clone().dispose();
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("tag", &self.0.schema.tag)
            .field("id", &self.0.id)
            .field("state", &self.0.state.get())
            .finish()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl WeakInstance {
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }
}

impl Instance {
    pub fn new<C: Component>(component: C, parent: Option<&Instance>) -> Instance {
        let component = Rc::new(component);
        let schema = component.schema();
        let props = schema
            .props
            .iter()
            .map(|decl| (decl.name, signal(decl.default.clone())))
            .collect();
        let scope = match parent {
            Some(p) => p.0.scope.child(),
            None => Scope::new(),
        };
        let id = NEXT_INSTANCE.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        Instance(Rc::new(InstanceInner {
            id,
            schema,
            any: component.clone(),
            component,
            state: Cell::new(LifecycleState::Idle),
            props,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
            contexts: RefCell::new(HashMap::new()),
            parent: parent.map(Instance::downgrade),
            element: RefCell::new(None),
            scope,
            connect_scope: RefCell::new(None),
        }))
    }

    pub fn id(&self) -> InstanceId {
        self.0.id
    }

    pub fn schema(&self) -> &'static ComponentSchema {
        self.0.schema
    }

    pub fn tag(&self) -> &'static str {
        self.0.schema.tag
    }

    pub fn state(&self) -> LifecycleState {
        self.0.state.get()
    }

    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.0))
    }

    pub fn parent(&self) -> Option<Instance> {
        self.0.parent.as_ref().and_then(WeakInstance::upgrade)
    }

    pub fn element(&self) -> Option<Element> {
        self.0.element.borrow().clone()
    }

    pub fn scope(&self) -> &Scope {
        &self.0.scope
    }

    /// Typed access to the behaviour object, e.g. to read a button's
    /// `expanded` state.
    pub fn component<C: Component>(&self) -> Option<Rc<C>> {
        self.0.any.clone().downcast::<C>().ok()
    }

    fn check(&self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        let current = self.state();
        if current == from {
            Ok(())
        } else {
            Err(Error::Lifecycle {
                component: self.tag(),
                from: current,
                to,
            })
        }
    }

    fn enter(&self, to: LifecycleState) {
        log::debug!("<{}#{}> {:?} -> {:?}", self.tag(), self.id(), self.state(), to);
        self.0.state.set(to);
    }

    /// Merges `supplied` over the schema defaults. Undeclared names are
    /// ignored.
    pub fn setup<I, K>(&self, supplied: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, PropValue)>,
        K: AsRef<str>,
    {
        self.check(LifecycleState::Idle, LifecycleState::Setup)?;
        let mut given: HashMap<&'static str, PropValue> = HashMap::new();
        for (name, value) in supplied {
            match self.schema().prop(name.as_ref()) {
                Some(decl) => {
                    given.insert(decl.name, value);
                }
                None => log::warn!(
                    "<{}> ignoring undeclared prop `{}`",
                    self.tag(),
                    name.as_ref()
                ),
            }
        }
        reactive::batch(|| {
            for decl in self.schema().props {
                let value = given
                    .remove(decl.name)
                    .unwrap_or_else(|| decl.default.clone());
                if let Some(cell) = self.0.props.get(decl.name) {
                    cell.set_if_changed(value);
                }
            }
        });
        self.enter(LifecycleState::Setup);
        let component = self.0.component.clone();
        self.0.scope.run(|| component.on_setup(self))
    }

    pub fn attach(&self, el: &Element) -> Result<()> {
        self.check(LifecycleState::Setup, LifecycleState::Attached)?;
        *self.0.element.borrow_mut() = Some(el.clone());
        let component = self.0.component.clone();
        self.0.scope.run(|| component.on_attach(self, el))?;
        self.enter(LifecycleState::Attached);
        Ok(())
    }

    pub fn connect(&self) -> Result<()> {
        self.check(LifecycleState::Attached, LifecycleState::Connected)?;
        let Some(el) = self.element().filter(Element::is_connected) else {
            return Err(Error::NotConnected {
                component: self.tag(),
            });
        };
        let scope = self.0.scope.child();
        let component = self.0.component.clone();
        if let Err(err) = scope.run(|| component.on_connect(self, &el)) {
            scope.dispose();
            return Err(err);
        }
        *self.0.connect_scope.borrow_mut() = Some(scope);
        self.enter(LifecycleState::Connected);
        Ok(())
    }

    pub fn disconnect(&self) -> Result<()> {
        self.check(LifecycleState::Connected, LifecycleState::Disconnected)?;
        let scope = self.0.connect_scope.borrow_mut().take();
        if let Some(scope) = scope {
            scope.dispose();
        }
        self.enter(LifecycleState::Disconnected);
        let component = self.0.component.clone();
        component.on_disconnect(self);
        Ok(())
    }

    /// Tears everything down. Safe to call more than once.
    pub fn destroy(&self) {
        match self.state() {
            LifecycleState::Destroyed => return,
            LifecycleState::Connected => {
                let _ = self.disconnect();
            }
            _ => {}
        }
        let component = self.0.component.clone();
        component.on_destroy(self);
        self.0.scope.clone().dispose();
        self.0.listeners.borrow_mut().clear();
        self.0.contexts.borrow_mut().clear();
        *self.0.element.borrow_mut() = None;
        self.enter(LifecycleState::Destroyed);
    }

    pub fn prop(&self, name: &str) -> Option<Signal<PropValue>> {
        self.0.props.get(name).cloned()
    }

    /// Tracked read of a boolean prop; `false` when undeclared.
    pub fn prop_bool(&self, name: &str) -> bool {
        self.0
            .props
            .get(name)
            .and_then(|cell| cell.with(PropValue::as_bool))
            .unwrap_or(false)
    }

    pub fn prop_text(&self, name: &str) -> String {
        self.0
            .props
            .get(name)
            .and_then(|cell| cell.with(|v| v.as_text().map(str::to_owned)))
            .unwrap_or_default()
    }

    pub fn prop_placement(&self, name: &str) -> Placement {
        self.0
            .props
            .get(name)
            .and_then(|cell| cell.with(PropValue::as_placement))
            .unwrap_or_default()
    }

    /// Writes a declared prop; dependants only re-run when the value changed.
    pub fn set_prop(&self, name: &str, value: PropValue) -> Result<bool> {
        match self.0.props.get(name) {
            Some(cell) => Ok(cell.set_if_changed(value)),
            None => Err(Error::UnknownProp {
                component: self.tag(),
                prop: name.to_string(),
            }),
        }
    }

    pub fn reset_prop(&self, name: &str) -> Result<bool> {
        let default = self
            .schema()
            .prop(name)
            .map(|decl| decl.default.clone())
            .ok_or_else(|| Error::UnknownProp {
                component: self.tag(),
                prop: name.to_string(),
            })?;
        self.set_prop(name, default)
    }

    pub fn listen(&self, event: &str, f: impl Fn(&Event) + 'static) -> Result<Dispose> {
        let name = self.schema().event(event).ok_or_else(|| Error::UnknownEvent {
            component: self.tag(),
            event: event.to_string(),
        })?;
        let id = self.0.next_listener.get();
        self.0.next_listener.set(id + 1);
        self.0
            .listeners
            .borrow_mut()
            .entry(name)
            .or_default()
            .push((id, Rc::new(f)));

        let weak = self.downgrade();
        Ok(Dispose::new(move || {
            if let Some(inst) = weak.upgrade() {
                let mut listeners = inst.0.listeners.borrow_mut();
                if let Some(list) = listeners.get_mut(name) {
                    list.retain(|(l, _)| *l != id);
                }
            }
        }))
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.0
            .listeners
            .borrow()
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Invokes the current listeners of `event` in subscription order and
    /// returns how many ran. Does not bubble.
    pub fn dispatch(&self, event: &str, detail: EventDetail) -> usize {
        let Some(name) = self.schema().event(event) else {
            log::warn!("<{}> dispatching undeclared event `{}`", self.tag(), event);
            return 0;
        };
        let listeners: Vec<Listener> = self
            .0
            .listeners
            .borrow()
            .get(name)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();
        let ev = Event {
            name,
            detail,
            target: self.id(),
        };
        for l in &listeners {
            l(&ev);
        }
        listeners.len()
    }

    /// Makes `value` visible to this instance and its descendants.
    pub fn provide<T: 'static>(&self, value: T) {
        self.0
            .contexts
            .borrow_mut()
            .insert(TypeId::of::<T>(), Rc::new(value));
    }

    /// Nearest `T` provided by this instance or an ancestor.
    pub fn context<T: Clone + 'static>(&self) -> Option<T> {
        let mut cur = Some(self.clone());
        while let Some(inst) = cur {
            if let Some(v) = inst.0.contexts.borrow().get(&TypeId::of::<T>())
                && let Some(t) = v.downcast_ref::<T>()
            {
                return Some(t.clone());
            }
            cur = inst.parent();
        }
        None
    }

    pub fn require_context<T: Clone + 'static>(&self) -> Result<T> {
        self.context::<T>().ok_or(Error::MissingContext {
            component: self.tag(),
            context: short_type_name::<T>(),
        })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
