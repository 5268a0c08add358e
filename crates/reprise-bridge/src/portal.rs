use reprise_core::*;
use reprise_ui::{MediaState, PortalController, PortalDisabled};

use crate::bridge::Slot;

/// Renders its children either in place or under the document's portal
/// root. The fullscreen flag comes from the nearest [`MediaState`]; without
/// one the player is treated as never fullscreen.
#[derive(Default)]
pub struct PortalNode {
    mounted: Option<Portalled>,
}

struct Portalled {
    scope: Scope,
    controller: PortalController,
    disabled: Signal<PortalDisabled>,
    instance: Option<Instance>,
}

impl PortalNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_relocated(&self) -> bool {
        self.mounted
            .as_ref()
            .is_some_and(|m| m.controller.is_relocated())
    }

    pub fn container(&self) -> Option<Element> {
        self.mounted.as_ref().map(|m| m.controller.container().clone())
    }

    /// Renders into `slot`; children render into the returned slot, which
    /// keeps the enclosing instance so contexts still resolve.
    pub fn render(&mut self, slot: &Slot, disabled: impl Into<PortalDisabled>) -> Slot {
        let disabled = disabled.into();
        if let Some(m) = &self.mounted {
            m.disabled.set_if_changed(disabled);
            return Slot::new(m.controller.container().clone(), m.instance.clone());
        }

        let instance = slot.instance().cloned();
        let fullscreen = instance
            .as_ref()
            .and_then(|i| i.context::<MediaState>())
            .map(|state| state.fullscreen_signal())
            .unwrap_or_else(|| signal(false));
        let scope = match &instance {
            Some(i) => i.scope().child(),
            None => Scope::new(),
        };
        let disabled = signal(disabled);
        let controller = scope.run(|| {
            PortalController::new(slot.element(), disabled.clone(), fullscreen)
        });
        let out = Slot::new(controller.container().clone(), instance.clone());
        self.mounted = Some(Portalled {
            scope,
            controller,
            disabled,
            instance,
        });
        out
    }

    pub fn unmount(&mut self) {
        if let Some(m) = self.mounted.take() {
            m.scope.dispose();
            m.controller.container().discard();
        }
    }
}

impl Drop for PortalNode {
    fn drop(&mut self) {
        self.unmount();
    }
}
