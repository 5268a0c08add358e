//! Tooltips: `<media-tooltip>` shares a [`TooltipContext`] between its
//! trigger and its content. There are no show/hide delays.

use reprise_core::*;

use crate::focus_visible::FocusVisibleController;

#[derive(Clone, Debug)]
pub struct TooltipContext {
    showing: Signal<bool>,
}

impl Default for TooltipContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TooltipContext {
    pub fn new() -> Self {
        Self {
            showing: signal(false),
        }
    }

    /// Tracked.
    pub fn is_showing(&self) -> bool {
        self.showing.get()
    }

    pub fn show(&self) {
        self.showing.set_if_changed(true);
    }

    pub fn hide(&self) {
        self.showing.set_if_changed(false);
    }
}

static TOOLTIP: ComponentSchema = ComponentSchema {
    tag: "media-tooltip",
    props: &[],
    events: &[],
};

static TRIGGER: ComponentSchema = ComponentSchema {
    tag: "media-tooltip-trigger",
    props: &[],
    events: &[],
};

static CONTENT: ComponentSchema = ComponentSchema {
    tag: "media-tooltip-content",
    props: &[PropDecl {
        name: "placement",
        default: PropValue::Placement(Placement::TOP),
    }],
    events: &[],
};

#[derive(Default)]
pub struct Tooltip {
    context: TooltipContext,
}

impl Tooltip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &TooltipContext {
        &self.context
    }
}

impl Component for Tooltip {
    fn schema(&self) -> &'static ComponentSchema {
        &TOOLTIP
    }

    fn on_setup(&self, instance: &Instance) -> Result<()> {
        instance.provide(self.context.clone());
        Ok(())
    }

    fn on_destroy(&self, _instance: &Instance) {
        self.context.hide();
    }
}

/// Shows the tooltip on pointer hover or keyboard focus.
#[derive(Default)]
pub struct TooltipTrigger {
    focus: FocusVisibleController,
}

impl TooltipTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for TooltipTrigger {
    fn schema(&self) -> &'static ComponentSchema {
        &TRIGGER
    }

    fn on_attach(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<TooltipContext>()?;
        let el = el.clone();
        effect(move || {
            el.toggle_attribute("data-showing", ctx.is_showing());
            None
        });
        Ok(())
    }

    fn on_connect(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<TooltipContext>()?;
        self.focus.observe(el);

        // Focus listeners run after the controller's, so visibility is
        // already decided when we read it.
        let listeners = [
            el.add_listener(EventType::PointerEnter, {
                let ctx = ctx.clone();
                move |_| ctx.show()
            }),
            el.add_listener(EventType::PointerLeave, {
                let ctx = ctx.clone();
                move |_| ctx.hide()
            }),
            el.add_listener(EventType::Focus, {
                let (ctx, focus) = (ctx.clone(), self.focus.clone());
                move |_| {
                    if untrack(|| focus.is_focus_visible()) {
                        ctx.show();
                    }
                }
            }),
            el.add_listener(EventType::Blur, {
                let ctx = ctx.clone();
                move |_| ctx.hide()
            }),
            el.add_listener(EventType::KeyDown, {
                let ctx = ctx.clone();
                move |e| {
                    if let EventKind::KeyDown(k) = &e.kind
                        && k.key == Key::Escape
                    {
                        ctx.hide();
                    }
                }
            }),
        ];
        on_cleanup(move || {
            for l in listeners {
                l.run();
            }
            ctx.hide();
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct TooltipContent;

impl TooltipContent {
    pub fn new() -> Self {
        Self
    }
}

impl Component for TooltipContent {
    fn schema(&self) -> &'static ComponentSchema {
        &CONTENT
    }

    fn on_attach(&self, instance: &Instance, el: &Element) -> Result<()> {
        let ctx = instance.require_context::<TooltipContext>()?;
        el.add_class("vds-tooltip-content");
        el.set_attribute("role", "tooltip");

        effect({
            let el = el.clone();
            move || {
                let visible = ctx.is_showing();
                el.toggle_attribute("data-visible", visible);
                el.set_attribute("aria-hidden", (!visible).to_string());
                None
            }
        });

        let placement = instance
            .prop("placement")
            .unwrap_or_else(|| signal(Placement::TOP.into()));
        let el = el.clone();
        effect(move || {
            let placement = placement
                .with(PropValue::as_placement)
                .unwrap_or(Placement::TOP);
            el.set_attribute("data-placement", placement.to_string());
            None
        });
        Ok(())
    }
}
