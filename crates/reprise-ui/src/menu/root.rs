use std::cell::RefCell;

use reprise_core::*;

use super::MenuContext;

static MENU: ComponentSchema = ComponentSchema {
    tag: "media-menu",
    props: &[],
    events: &["open", "close"],
};

/// `<media-menu>`: owns one node of the menu tree. A menu nested inside
/// another menu becomes its submenu; otherwise it starts a new tree and,
/// while open, listens for Escape and outside presses on the document.
#[derive(Default)]
pub struct Menu {
    context: RefCell<Option<MenuContext>>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Option<MenuContext> {
        self.context.borrow().clone()
    }

    /// Tracked.
    pub fn expanded(&self) -> bool {
        self.context().is_some_and(|c| c.expanded())
    }
}

impl Component for Menu {
    fn schema(&self) -> &'static ComponentSchema {
        &MENU
    }

    fn on_attach(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = match instance.context::<MenuContext>() {
            Some(parent) => {
                el.set_attribute("data-submenu", "");
                parent.submenu(instance)
            }
            None => MenuContext::root(instance),
        };
        log::debug!(
            "<{}#{}> registered at depth {}",
            instance.tag(),
            instance.id(),
            ctx.depth()
        );
        instance.provide(ctx.clone());
        *self.context.borrow_mut() = Some(ctx.clone());

        let region = ctx.add_region(el);
        on_cleanup({
            let ctx = ctx.clone();
            move || {
                region.run();
                ctx.remove();
            }
        });

        let el = el.clone();
        effect(move || {
            el.toggle_attribute("data-open", ctx.expanded());
            None
        });
        Ok(())
    }

    fn on_connect(&self, _instance: &Instance, el: &Element) -> Result<()> {
        let Some(ctx) = self.context().filter(MenuContext::is_root) else {
            return Ok(());
        };
        let doc = el.document().clone();
        if !doc.is_browser() {
            return Ok(());
        }
        effect(move || {
            if !ctx.expanded() {
                return None;
            }
            let on_key = doc.add_listener(EventType::KeyDown, {
                let ctx = ctx.clone();
                move |e| {
                    if let EventKind::KeyDown(k) = &e.kind
                        && k.key == Key::Escape
                    {
                        ctx.escape();
                    }
                }
            });
            let on_pointer = doc.add_listener(EventType::PointerDown, {
                let ctx = ctx.clone();
                move |e| {
                    ctx.outside_press(&e.target);
                }
            });
            Some(Dispose::new(move || {
                on_key.run();
                on_pointer.run();
            }))
        });
        Ok(())
    }
}
