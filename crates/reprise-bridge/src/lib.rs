#![allow(non_snake_case)]
//! Host-framework bridges.
//!
//! A [`Bridge`] mounts one `reprise-ui` component inside a host render
//! tree. Each logical mount is a [`BridgeNode`]: the host calls
//! [`BridgeNode::render`] on every render with its prop bag and children,
//! and [`BridgeNode::unmount`] (or drops the node) when it goes away.
//!
//! - Declared props are forwarded on every render; props missing from a
//!   later render fall back to their defaults.
//! - Declared events reach the callback from the most recent render.
//! - `asChild` renders onto the single child element instead of a wrapper.
//! - The bridge's own ref, the caller's ref and the child's ref are merged.
//! - Outside a browser nothing is connected, relocated or observed.
//!
//! ```rust
//! use reprise_bridge::*;
//! use reprise_core::{Document, RenderEnv};
//!
//! let doc = Document::new(RenderEnv::Browser);
//! let mut root = menu::Root().node();
//! let mut button = menu::Button().node();
//!
//! let slot = root.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();
//! button
//!     .render(&slot, &HostProps::new(), vec![HostElement::new("span").text("Settings")])
//!     .unwrap();
//! assert_eq!(
//!     button.element().unwrap().attribute("aria-expanded").as_deref(),
//!     Some("false")
//! );
//! ```

pub mod adapter;
pub mod bridge;
pub mod menu;
pub mod node_ref;
pub mod player;
pub mod portal;
pub mod props;
pub mod tooltip;

pub use adapter::{HostAdapter, Jsx, Template};
pub use bridge::{Bridge, BridgeNode, Slot};
pub use node_ref::{NodeRef, Ref, compose_refs};
pub use player::Player;
pub use portal::PortalNode;
pub use props::{Callback, HostElement, HostProps, HostValue};
