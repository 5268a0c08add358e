use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use reprise_core::*;

/// The portal's `disabled` prop: `false`, `true`, or `"fullscreen"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Disabled {
    #[default]
    No,
    Yes,
    /// Render in place only while the player is fullscreen.
    Fullscreen,
}

impl From<bool> for Disabled {
    fn from(b: bool) -> Self {
        if b { Disabled::Yes } else { Disabled::No }
    }
}

impl FromStr for Disabled {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "true" => Ok(Disabled::Yes),
            "false" => Ok(Disabled::No),
            "fullscreen" => Ok(Disabled::Fullscreen),
            other => Err(Error::InvalidProp {
                prop: "disabled".into(),
                reason: format!("expected a boolean or \"fullscreen\", got `{other}`"),
            }),
        }
    }
}

impl TryFrom<&PropValue> for Disabled {
    type Error = Error;

    fn try_from(v: &PropValue) -> Result<Self> {
        match v {
            PropValue::Bool(b) => Ok((*b).into()),
            PropValue::Text(t) => t.parse(),
            PropValue::Placement(_) => Err(Error::InvalidProp {
                prop: "disabled".into(),
                reason: "a placement is not a portal mode".into(),
            }),
        }
    }
}

/// Whether content should be relocated to the document's portal root.
pub fn should_portal(disabled: Disabled, fullscreen: bool) -> bool {
    match disabled {
        Disabled::No => true,
        Disabled::Yes => false,
        Disabled::Fullscreen => !fullscreen,
    }
}

/// Owns a container element and keeps it either under its anchor or under
/// the document's portal root, following [`should_portal`].
///
/// Must be created inside a scope; disposing the scope stops relocation.
/// Outside a browser the container always stays in place.
pub struct PortalController {
    container: Element,
    relocated: Option<Memo<bool>>,
}

impl PortalController {
    pub fn new(anchor: &Element, disabled: Signal<Disabled>, fullscreen: Signal<bool>) -> Self {
        let doc = anchor.document().clone();
        let container = doc.create_element("div");
        container.set_attribute("data-portal", "");
        anchor.append_child(&container);

        if !doc.is_browser() {
            return Self {
                container,
                relocated: None,
            };
        }

        let relocated = memo(move || should_portal(disabled.get(), fullscreen.get()));
        effect({
            let (relocated, container, anchor) =
                (relocated.clone(), container.clone(), anchor.clone());
            move || {
                let portalled = relocated.get();
                if portalled {
                    doc.portal_root().append_child(&container);
                } else {
                    anchor.append_child(&container);
                }
                log::debug!("portal container relocated={portalled}");
                container.toggle_attribute("data-portalled", portalled);
                None
            }
        });

        Self {
            container,
            relocated: Some(relocated),
        }
    }

    /// Where children render.
    pub fn container(&self) -> &Element {
        &self.container
    }

    pub fn is_relocated(&self) -> bool {
        self.relocated
            .as_ref()
            .is_some_and(|r| r.get_untracked())
    }
}
