use reprise_core::*;

use super::MenuContext;

static ITEMS: ComponentSchema = ComponentSchema {
    tag: "media-menu-items",
    props: &[PropDecl {
        name: "placement",
        default: PropValue::Placement(Placement::BOTTOM),
    }],
    events: &[],
};

/// `<media-menu-items>`: the popup holding a menu's items. Its element
/// counts as part of the menu for outside-press detection, wherever it is
/// rendered.
#[derive(Default)]
pub struct MenuItems;

impl MenuItems {
    pub fn new() -> Self {
        Self
    }
}

impl Component for MenuItems {
    fn schema(&self) -> &'static ComponentSchema {
        &ITEMS
    }

    fn on_attach(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<MenuContext>()?;
        el.add_class("vds-menu-items");
        el.set_attribute("role", "menu");

        let region = ctx.add_region(el);
        on_cleanup(move || region.run());

        effect({
            let el = el.clone();
            move || {
                let open = ctx.expanded();
                el.toggle_attribute("data-open", open);
                el.set_attribute("aria-hidden", (!open).to_string());
                None
            }
        });

        let placement = instance
            .prop("placement")
            .unwrap_or_else(|| signal(Placement::BOTTOM.into()));
        let el = el.clone();
        effect(move || {
            let placement = placement
                .with(PropValue::as_placement)
                .unwrap_or(Placement::BOTTOM);
            el.set_attribute("data-placement", placement.to_string());
            None
        });
        Ok(())
    }
}
