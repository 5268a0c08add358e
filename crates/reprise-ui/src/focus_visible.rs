use reprise_core::*;

/// Tracks how the user last interacted with one element and marks it
/// `data-focus-visible` only when focus arrived by keyboard.
///
/// Each controller owns its state; nothing is shared process-wide. Call
/// [`FocusVisibleController::observe`] from a component's connect hook: the
/// listeners it installs belong to the current scope and go away on
/// disconnect.
#[derive(Clone)]
pub struct FocusVisibleController {
    modality: Signal<InputModality>,
    focused: Signal<bool>,
    visible: Signal<bool>,
}

impl Default for FocusVisibleController {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusVisibleController {
    pub fn new() -> Self {
        Self {
            modality: signal(InputModality::Pointer),
            focused: signal(false),
            visible: signal(false),
        }
    }

    pub fn modality(&self) -> InputModality {
        self.modality.get()
    }

    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    /// Tracked; re-runs dependants when keyboard focus comes or goes.
    pub fn is_focus_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn observe(&self, el: &Element) {
        let doc = el.document().clone();
        if !doc.is_browser() {
            return;
        }

        let on_key = doc.add_listener(EventType::KeyDown, {
            let modality = self.modality.clone();
            move |e| {
                if let EventKind::KeyDown(k) = &e.kind
                    && k.key.is_navigation()
                {
                    modality.set_if_changed(InputModality::Keyboard);
                }
            }
        });
        let on_pointer = doc.add_listener(EventType::PointerDown, {
            let modality = self.modality.clone();
            move |e| {
                if let EventKind::PointerDown(kind) = e.kind {
                    modality.set_if_changed(kind.into());
                }
            }
        });
        let on_focus = el.add_listener(EventType::Focus, {
            let (modality, focused, visible) = (
                self.modality.clone(),
                self.focused.clone(),
                self.visible.clone(),
            );
            move |_| {
                batch(|| {
                    focused.set_if_changed(true);
                    visible.set_if_changed(modality.get_untracked() == InputModality::Keyboard);
                });
            }
        });
        let on_blur = el.add_listener(EventType::Blur, {
            let (focused, visible) = (self.focused.clone(), self.visible.clone());
            move |_| {
                batch(|| {
                    focused.set_if_changed(false);
                    visible.set_if_changed(false);
                });
            }
        });

        effect({
            let (el, visible) = (el.clone(), self.visible.clone());
            move || {
                el.toggle_attribute("data-focus-visible", visible.get());
                None
            }
        });

        on_cleanup({
            let (focused, visible, el) = (self.focused.clone(), self.visible.clone(), el.clone());
            move || {
                for d in [on_key, on_pointer, on_focus, on_blur] {
                    d.run();
                }
                focused.set_if_changed(false);
                visible.set_if_changed(false);
                el.remove_attribute("data-focus-visible");
            }
        });
    }
}
