//! # Media-player widgets
//!
//! Behaviour for the interactive parts of a player UI, built on
//! `reprise-core` components and independent of any host framework:
//!
//! - [`menu`]: nested menus sharing a [`MenuContext`] tree.
//! - [`tooltip`]: hover and keyboard-focus tooltips.
//! - [`FocusVisibleController`]: `data-focus-visible` for keyboard focus only.
//! - [`PortalController`]: moves popup content to the document's portal root.
//! - [`MediaProvider`]: exposes the player's [`MediaState`] to descendants.
//!
//! Host frameworks drive these through `reprise-bridge`; tests and servers
//! can also mount them directly with [`Instance`](reprise_core::Instance).

pub mod focus_visible;
pub mod media;
pub mod menu;
pub mod portal;
pub mod press;
pub mod tooltip;
mod tests;

pub use focus_visible::FocusVisibleController;
pub use media::{MediaProvider, MediaState};
pub use menu::{Menu, MenuButton, MenuContext, MenuId, MenuItem, MenuItems, MenuRegistry};
pub use portal::{Disabled as PortalDisabled, PortalController, should_portal};
pub use press::on_press;
pub use tooltip::{Tooltip, TooltipContent, TooltipContext, TooltipTrigger};
