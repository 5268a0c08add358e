//! Menus: a tree of [`MenuContext`] nodes, one per `<media-menu>`, and the
//! widgets that read and drive it.
//!
//! ```text
//! media-menu                 (root context)
//! ├── media-menu-button      toggles the root
//! └── media-menu-items
//!     ├── media-menu-item
//!     └── media-menu         (submenu context, child of the root)
//!         ├── media-menu-button
//!         └── media-menu-items
//! ```

mod button;
mod context;
mod item;
mod items;
mod root;

pub use button::MenuButton;
pub use context::{MenuContext, MenuId, MenuRegistry};
pub use item::MenuItem;
pub use items::MenuItems;
pub use root::Menu;
