use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use reprise_core::*;

new_key_type! {
    pub struct MenuId;
}

struct ButtonSlot {
    instance: WeakInstance,
    element: Element,
    disabled: bool,
}

struct MenuNode {
    expanded: Signal<bool>,
    hint: Signal<String>,
    highlighted: Option<InstanceId>,
    button: Option<ButtonSlot>,
    parent: Option<MenuId>,
    children: SmallVec<[MenuId; 4]>,
    regions: SmallVec<[(u64, Element); 2]>,
    menu: WeakInstance,
}

impl MenuNode {
    fn new(menu: &Instance, parent: Option<MenuId>) -> Self {
        Self {
            expanded: signal(false),
            hint: signal(String::new()),
            highlighted: None,
            button: None,
            parent,
            children: SmallVec::new(),
            regions: SmallVec::new(),
            menu: menu.downgrade(),
        }
    }
}

#[derive(Default)]
struct Registry {
    nodes: SlotMap<MenuId, MenuNode>,
    next_region: u64,
}

/// Owns every node of one menu tree. Nodes refer to each other by
/// [`MenuId`]; widgets only ever hold a [`MenuContext`].
#[derive(Clone, Default)]
pub struct MenuRegistry(Rc<RefCell<Registry>>);

impl MenuRegistry {
    pub fn len(&self) -> usize {
        self.0.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node<R>(&self, id: MenuId, f: impl FnOnce(&MenuNode) -> R) -> Option<R> {
        self.0.borrow().nodes.get(id).map(f)
    }

    fn node_mut<R>(&self, id: MenuId, f: impl FnOnce(&mut MenuNode) -> R) -> Option<R> {
        self.0.borrow_mut().nodes.get_mut(id).map(f)
    }

    fn is_expanded(&self, id: MenuId) -> bool {
        self.node(id, |n| n.expanded.clone())
            .is_some_and(|s| s.get_untracked())
    }

    fn children(&self, id: MenuId) -> SmallVec<[MenuId; 4]> {
        self.node(id, |n| n.children.clone()).unwrap_or_default()
    }

    fn root_of(&self, mut id: MenuId) -> MenuId {
        while let Some(Some(parent)) = self.node(id, |n| n.parent) {
            id = parent;
        }
        id
    }

    fn depth(&self, mut id: MenuId) -> usize {
        let mut depth = 0;
        while let Some(Some(parent)) = self.node(id, |n| n.parent) {
            depth += 1;
            id = parent;
        }
        depth
    }

    /// Collapses `id` and everything below it, children before parents.
    /// Returns the contexts that actually closed. Callers wrap this in a
    /// batch.
    fn collapse_subtree(&self, id: MenuId, closed: &mut Vec<MenuId>) {
        for child in self.children(id) {
            self.collapse_subtree(child, closed);
        }
        let cells = self.node_mut(id, |n| {
            n.highlighted = None;
            (n.expanded.clone(), n.hint.clone())
        });
        if let Some((expanded, hint)) = cells
            && expanded.get_untracked()
        {
            expanded.set(false);
            hint.set_if_changed(String::new());
            closed.push(id);
        }
    }

    /// True when `target` lies in the rendered region of `id` or any of
    /// its descendants: the button, registered regions, portalled content.
    fn region_contains(&self, id: MenuId, target: &Element) -> bool {
        let (button, regions) = match self.node(id, |n| {
            (
                n.button.as_ref().map(|b| b.element.clone()),
                n.regions.iter().map(|(_, el)| el.clone()).collect::<Vec<_>>(),
            )
        }) {
            Some(parts) => parts,
            None => return false,
        };
        button.iter().chain(regions.iter()).any(|el| el.contains(target))
            || self
                .children(id)
                .into_iter()
                .any(|child| self.region_contains(child, target))
    }

    fn menu_instance(&self, id: MenuId) -> Option<Instance> {
        self.node(id, |n| n.menu.upgrade()).flatten()
    }

    fn emit(&self, ids: &[MenuId], event: &str) {
        let menus: Vec<Instance> = ids.iter().filter_map(|id| self.menu_instance(*id)).collect();
        for menu in menus {
            log::debug!("<{}#{}> {}", menu.tag(), menu.id(), event);
            menu.dispatch(event, EventDetail::None);
        }
    }
}

/// Handle onto one node of a menu tree, provided as context by each menu
/// to its descendants.
///
/// Each node is either collapsed or expanded. At most one child of a
/// parent is expanded at a time, a node only expands under an expanded
/// parent, and collapsing a node collapses its whole subtree inside one
/// batch so no effect sees a child open under a closed parent.
#[derive(Clone)]
pub struct MenuContext {
    registry: MenuRegistry,
    id: MenuId,
}

impl PartialEq for MenuContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry.0, &other.registry.0) && self.id == other.id
    }
}

impl std::fmt::Debug for MenuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuContext")
            .field("id", &self.id)
            .field("expanded", &self.is_expanded())
            .finish()
    }
}

impl MenuContext {
    /// Starts a new, independent menu tree rooted at `menu`.
    pub fn root(menu: &Instance) -> Self {
        let registry = MenuRegistry::default();
        let id = registry
            .0
            .borrow_mut()
            .nodes
            .insert(MenuNode::new(menu, None));
        Self { registry, id }
    }

    /// Registers `menu` as a child of this context.
    pub fn submenu(&self, menu: &Instance) -> Self {
        let id = {
            let mut reg = self.registry.0.borrow_mut();
            let id = reg.nodes.insert(MenuNode::new(menu, Some(self.id)));
            if let Some(parent) = reg.nodes.get_mut(self.id) {
                parent.children.push(id);
            }
            id
        };
        Self {
            registry: self.registry.clone(),
            id,
        }
    }

    pub fn id(&self) -> MenuId {
        self.id
    }

    pub fn registry(&self) -> &MenuRegistry {
        &self.registry
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn parent(&self) -> Option<MenuContext> {
        self.registry
            .node(self.id, |n| n.parent)
            .flatten()
            .map(|id| MenuContext {
                registry: self.registry.clone(),
                id,
            })
    }

    /// Number of ancestors; a root menu is at depth 0.
    pub fn depth(&self) -> usize {
        self.registry.depth(self.id)
    }

    /// Tracked.
    pub fn expanded(&self) -> bool {
        self.expanded_signal().is_some_and(|s| s.get())
    }

    pub fn is_expanded(&self) -> bool {
        self.registry.is_expanded(self.id)
    }

    pub fn expanded_signal(&self) -> Option<Signal<bool>> {
        self.registry.node(self.id, |n| n.expanded.clone())
    }

    /// Tracked.
    pub fn hint(&self) -> String {
        self.registry
            .node(self.id, |n| n.hint.clone())
            .map(|s| s.get())
            .unwrap_or_default()
    }

    pub fn highlighted(&self) -> Option<InstanceId> {
        self.registry.node(self.id, |n| n.highlighted).flatten()
    }

    /// Marks `item` as the highlighted item and shows `text` as the hint.
    /// Ignored while collapsed; returns whether the item is now highlighted.
    pub fn highlight(&self, item: InstanceId, text: impl Into<String>) -> bool {
        if !self.is_expanded() {
            log::trace!("ignoring highlight of #{item} in a collapsed menu");
            return false;
        }
        let hint = self.registry.node_mut(self.id, |n| {
            n.highlighted = Some(item);
            n.hint.clone()
        });
        match hint {
            Some(hint) => {
                hint.set_if_changed(text.into());
                true
            }
            None => false,
        }
    }

    /// Clears the hint if `item` is still the highlighted one.
    pub fn unhighlight(&self, item: InstanceId) {
        let hint = self.registry.node_mut(self.id, |n| {
            if n.highlighted == Some(item) {
                n.highlighted = None;
                Some(n.hint.clone())
            } else {
                None
            }
        });
        if let Some(Some(hint)) = hint {
            hint.set_if_changed(String::new());
        }
    }

    /// Binds `button` as this context's trigger: its `select` event toggles
    /// the context. Running the returned handle reverses the registration.
    pub fn attach_button(&self, button: &Instance, el: &Element) -> Result<Dispose> {
        let replaced = self.registry.node_mut(self.id, |n| {
            n.button.replace(ButtonSlot {
                instance: button.downgrade(),
                element: el.clone(),
                disabled: false,
            })
        });
        if let Some(Some(old)) = replaced {
            log::warn!(
                "menu already had a button (#{}); replacing it",
                old.instance.upgrade().map(|i| i.id()).unwrap_or_default()
            );
        }

        let ctx = self.clone();
        let listener = button.listen("select", move |_| ctx.toggle())?;

        let (ctx, button_id) = (self.clone(), button.id());
        Ok(Dispose::new(move || {
            listener.run();
            ctx.registry.node_mut(ctx.id, |n| {
                let ours = n
                    .button
                    .as_ref()
                    .and_then(|b| b.instance.upgrade())
                    .is_none_or(|i| i.id() == button_id);
                if ours {
                    n.button = None;
                }
            });
        }))
    }

    pub fn set_button_disabled(&self, disabled: bool) {
        self.registry.node_mut(self.id, |n| {
            if let Some(b) = n.button.as_mut() {
                b.disabled = disabled;
            }
        });
    }

    pub fn button_disabled(&self) -> bool {
        self.registry
            .node(self.id, |n| n.button.as_ref().is_some_and(|b| b.disabled))
            .unwrap_or(false)
    }

    pub fn button_element(&self) -> Option<Element> {
        self.registry
            .node(self.id, |n| n.button.as_ref().map(|b| b.element.clone()))
            .flatten()
    }

    pub fn button(&self) -> Option<Instance> {
        self.registry
            .node(self.id, |n| n.button.as_ref().and_then(|b| b.instance.upgrade()))
            .flatten()
    }

    /// Adds an element to this context's rendered region, used to decide
    /// whether a pointer press happened outside the menu.
    pub fn add_region(&self, el: &Element) -> Dispose {
        let key = {
            let mut reg = self.registry.0.borrow_mut();
            let key = reg.next_region;
            reg.next_region += 1;
            if let Some(n) = reg.nodes.get_mut(self.id) {
                n.regions.push((key, el.clone()));
            }
            key
        };
        let ctx = self.clone();
        Dispose::new(move || {
            ctx.registry.node_mut(ctx.id, |n| n.regions.retain(|(k, _)| *k != key));
        })
    }

    pub fn contains(&self, target: &Element) -> bool {
        self.registry.region_contains(self.id, target)
    }

    /// Activation from the bound button. A disabled button neither opens
    /// nor closes the menu.
    pub fn toggle(&self) {
        if self.button_disabled() {
            log::trace!("ignoring activation of a disabled menu button");
            return;
        }
        if self.is_expanded() {
            self.collapse();
        } else {
            self.expand();
        }
    }

    /// Expands this context, collapsing any expanded sibling. Refused when
    /// there is no enabled button or the parent is collapsed.
    pub fn expand(&self) -> bool {
        let state = self.registry.node(self.id, |n| {
            (
                n.expanded.clone(),
                n.parent,
                n.button.as_ref().map(|b| b.disabled),
            )
        });
        let Some((expanded, parent, button)) = state else {
            return false;
        };
        if expanded.get_untracked() {
            return false;
        }
        match button {
            None => {
                log::warn!("refusing to expand a menu without a button");
                return false;
            }
            Some(true) => {
                log::trace!("refusing to expand a menu with a disabled button");
                return false;
            }
            Some(false) => {}
        }
        if let Some(parent) = parent
            && !self.registry.is_expanded(parent)
        {
            log::warn!("refusing to expand a submenu whose parent is collapsed");
            return false;
        }

        let siblings: SmallVec<[MenuId; 4]> = parent
            .map(|p| self.registry.children(p))
            .unwrap_or_default()
            .into_iter()
            .filter(|s| *s != self.id)
            .collect();

        let mut closed = Vec::new();
        batch(|| {
            for sibling in siblings {
                self.registry.collapse_subtree(sibling, &mut closed);
            }
            expanded.set(true);
        });
        self.emit_closed(closed);
        self.registry.emit(&[self.id], "open");
        true
    }

    /// Collapses this context and every descendant in one batch, then
    /// dispatches `close` deepest-first.
    pub fn collapse(&self) -> bool {
        if !self.is_expanded() {
            return false;
        }
        let mut closed = Vec::new();
        batch(|| self.registry.collapse_subtree(self.id, &mut closed));
        self.emit_closed(closed);
        true
    }

    fn emit_closed(&self, mut closed: Vec<MenuId>) {
        if closed.is_empty() {
            return;
        }
        closed.sort_by_key(|id| std::cmp::Reverse(self.registry.depth(*id)));
        self.registry.emit(&closed, "close");
    }

    /// Deepest expanded context of this tree, if any.
    pub fn deepest_expanded(&self) -> Option<MenuContext> {
        let mut cur = self.registry.root_of(self.id);
        if !self.registry.is_expanded(cur) {
            return None;
        }
        while let Some(child) = self
            .registry
            .children(cur)
            .into_iter()
            .find(|c| self.registry.is_expanded(*c))
        {
            cur = child;
        }
        Some(MenuContext {
            registry: self.registry.clone(),
            id: cur,
        })
    }

    /// Collapses only the deepest expanded context of this tree and moves
    /// focus back to its button.
    pub fn escape(&self) -> bool {
        let Some(deepest) = self.deepest_expanded() else {
            return false;
        };
        deepest.collapse();
        if let Some(button) = deepest.button_element()
            && button.document().is_browser()
            && button.is_connected()
        {
            button.document().focus(&button);
        }
        true
    }

    /// Collapses the outermost expanded context whose region does not
    /// contain `target`.
    pub fn outside_press(&self, target: &Element) -> bool {
        let mut cur = self.registry.root_of(self.id);
        loop {
            if !self.registry.is_expanded(cur) {
                return false;
            }
            if !self.registry.region_contains(cur, target) {
                let ctx = MenuContext {
                    registry: self.registry.clone(),
                    id: cur,
                };
                return ctx.collapse();
            }
            match self
                .registry
                .children(cur)
                .into_iter()
                .find(|c| self.registry.is_expanded(*c))
            {
                Some(child) => cur = child,
                None => return false,
            }
        }
    }

    /// Unregisters this context and its subtree. No events are emitted.
    pub fn remove(&self) {
        let mut reg = self.registry.0.borrow_mut();
        if let Some(parent) = reg.nodes.get(self.id).and_then(|n| n.parent)
            && let Some(p) = reg.nodes.get_mut(parent)
        {
            p.children.retain(|c| *c != self.id);
        }
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            if let Some(node) = reg.nodes.remove(id) {
                stack.extend(node.children);
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registry.0.borrow().nodes.contains_key(self.id)
    }
}
