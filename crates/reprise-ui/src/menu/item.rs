use std::borrow::Cow;

use reprise_core::*;

use super::MenuContext;
use crate::press::on_press;

static ITEM: ComponentSchema = ComponentSchema {
    tag: "media-menu-item",
    props: &[
        PropDecl {
            name: "disabled",
            default: PropValue::Bool(false),
        },
        PropDecl {
            name: "hint",
            default: PropValue::Text(Cow::Borrowed("")),
        },
    ],
    events: &["select"],
};

/// `<media-menu-item>`: one entry of a menu. Highlighting it (pointer or
/// focus) publishes its hint to the menu; pressing it dispatches `select`.
pub struct MenuItem {
    highlighted: Signal<bool>,
}

impl Default for MenuItem {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuItem {
    pub fn new() -> Self {
        Self {
            highlighted: signal(false),
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted.get()
    }
}

impl Component for MenuItem {
    fn schema(&self) -> &'static ComponentSchema {
        &ITEM
    }

    fn on_attach(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<MenuContext>()?;
        el.set_attribute("role", "menuitem");

        let disabled = instance
            .prop("disabled")
            .unwrap_or_else(|| signal(false.into()));
        effect({
            let el = el.clone();
            move || {
                let disabled = disabled.with(PropValue::as_bool).unwrap_or(false);
                el.set_attribute("aria-disabled", disabled.to_string());
                None
            }
        });

        let (el, highlighted) = (el.clone(), self.highlighted.clone());
        effect(move || {
            let open = ctx.expanded();
            if !open {
                highlighted.set_if_changed(false);
            }
            el.toggle_attribute("data-highlighted", open && highlighted.get());
            None
        });
        Ok(())
    }

    fn on_connect(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<MenuContext>()?;
        let id = instance.id();
        let hint = instance
            .prop("hint")
            .unwrap_or_else(|| signal(PropValue::from("")));

        let highlight = {
            let (ctx, el, highlighted) = (ctx.clone(), el.clone(), self.highlighted.clone());
            move |_: &DomEvent| {
                let text = hint
                    .with(|v| v.as_text().map(str::to_owned))
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| el.text());
                if ctx.highlight(id, text) {
                    highlighted.set_if_changed(true);
                }
            }
        };
        let unhighlight = {
            let (ctx, highlighted) = (ctx.clone(), self.highlighted.clone());
            move |_: &DomEvent| {
                highlighted.set_if_changed(false);
                ctx.unhighlight(id);
            }
        };
        let highlight = std::rc::Rc::new(highlight);
        let unhighlight = std::rc::Rc::new(unhighlight);
        let listeners = [
            el.add_listener(EventType::PointerEnter, {
                let f = highlight.clone();
                move |e| f(e)
            }),
            el.add_listener(EventType::Focus, move |e| highlight(e)),
            el.add_listener(EventType::PointerLeave, {
                let f = unhighlight.clone();
                move |e| f(e)
            }),
            el.add_listener(EventType::Blur, move |e| unhighlight(e)),
        ];
        on_cleanup({
            let highlighted = self.highlighted.clone();
            move || {
                for l in listeners {
                    l.run();
                }
                highlighted.set_if_changed(false);
                ctx.unhighlight(id);
            }
        });

        let weak = instance.downgrade();
        let disabled = instance
            .prop("disabled")
            .unwrap_or_else(|| signal(false.into()));
        on_press(el, move |trigger| {
            if disabled.with(PropValue::as_bool).unwrap_or(false) {
                log::trace!("ignoring press on a disabled menu item");
                return;
            }
            if let Some(item) = weak.upgrade() {
                item.dispatch("select", EventDetail::Trigger(trigger));
            }
        });
        Ok(())
    }
}
