//! Ready-made menu bridges: `Root`, `Button`, `Items` (also exported as
//! `Content`), `Item` and `Portal`.

use reprise_ui::{Menu, MenuButton, MenuItem, MenuItems};

use crate::bridge::Bridge;
use crate::portal::PortalNode;

pub fn Root() -> Bridge {
    Bridge::new("Menu", Menu::new)
}

/// Becomes a `menuitem` when used inside a submenu.
pub fn Button() -> Bridge {
    Bridge::new("MenuButton", MenuButton::new)
}

pub fn Items() -> Bridge {
    Bridge::new("MenuItems", MenuItems::new)
}

pub use self::Items as Content;

pub fn Item() -> Bridge {
    Bridge::new("MenuItem", MenuItem::new)
}

pub fn Portal() -> PortalNode {
    PortalNode::new()
}
