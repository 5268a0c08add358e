use std::cell::RefCell;

use reprise_core::*;

use super::MenuContext;
use crate::focus_visible::FocusVisibleController;
use crate::press::on_press;

static BUTTON: ComponentSchema = ComponentSchema {
    tag: "media-menu-button",
    props: &[PropDecl {
        name: "disabled",
        default: PropValue::Bool(false),
    }],
    events: &["select"],
};

/// `<media-menu-button>`: the trigger of the nearest enclosing menu.
///
/// Pressing it dispatches `select`, and the menu toggles in response to
/// that event. A disabled button ignores presses entirely. Inside a
/// submenu the button takes the `menuitem` role.
#[derive(Default)]
pub struct MenuButton {
    context: RefCell<Option<MenuContext>>,
    focus: FocusVisibleController,
}

impl MenuButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracked; mirrors the menu's state. Always `false` before attach.
    pub fn expanded(&self) -> bool {
        self.context.borrow().as_ref().is_some_and(|c| c.expanded())
    }

    pub fn focus_visible(&self) -> &FocusVisibleController {
        &self.focus
    }
}

fn disabled_signal(instance: &Instance) -> Signal<PropValue> {
    instance
        .prop("disabled")
        .unwrap_or_else(|| signal(PropValue::Bool(false)))
}

impl Component for MenuButton {
    fn schema(&self) -> &'static ComponentSchema {
        &BUTTON
    }

    fn on_attach(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<MenuContext>()?;
        let registration = ctx.attach_button(instance, el)?;
        on_cleanup(move || registration.run());
        *self.context.borrow_mut() = Some(ctx.clone());

        el.set_attribute("aria-haspopup", "true");
        if !ctx.is_root() {
            el.set_attribute("role", "menuitem");
        }

        effect({
            let (ctx, el, disabled) = (ctx.clone(), el.clone(), disabled_signal(instance));
            move || {
                let disabled = disabled.with(PropValue::as_bool).unwrap_or(false);
                ctx.set_button_disabled(disabled);
                el.set_attribute("aria-disabled", disabled.to_string());
                el.toggle_attribute("data-disabled", disabled);
                None
            }
        });
        effect({
            let el = el.clone();
            move || {
                let expanded = ctx.expanded();
                el.set_attribute("aria-expanded", expanded.to_string());
                el.toggle_attribute("data-expanded", expanded);
                None
            }
        });
        Ok(())
    }

    fn on_connect(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<MenuContext>()?;
        self.focus.observe(el);

        effect({
            let el = el.clone();
            move || {
                let hint = ctx.hint();
                if !hint.is_empty()
                    && let Some(part) = el.query_part("hint")
                {
                    part.set_text(hint);
                }
                None
            }
        });

        let (weak, disabled) = (instance.downgrade(), disabled_signal(instance));
        on_press(el, move |trigger| {
            if disabled.with(PropValue::as_bool).unwrap_or(false) {
                log::trace!("ignoring press on a disabled menu button");
                return;
            }
            if let Some(button) = weak.upgrade() {
                button.dispatch("select", EventDetail::Trigger(trigger));
            }
        });
        Ok(())
    }

    fn on_destroy(&self, _instance: &Instance) {
        self.context.borrow_mut().take();
    }
}
