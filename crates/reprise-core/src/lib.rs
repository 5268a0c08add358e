//! # Signals, Effects, and Components
//!
//! Reprise keeps widget behaviour out of any particular rendering framework.
//! The core has four pieces:
//!
//! - `Signal<T>` / `Memo<T>`: observable and derived reactive values.
//! - `effect`: side effects that re-run when the signals they read change.
//! - `Scope`: ownership boundary that disposes effects and registrations.
//! - `Instance`: one mounted component: props, events, lifecycle, contexts.
//!
//! ## Signals
//!
//! ```rust
//! use reprise_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! ## Effects and cleanup
//!
//! Reads inside an effect are tracked; writing any of them re-runs the
//! effect after its previous cleanup:
//!
//! ```rust
//! use reprise_core::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let open = signal(false);
//! let cleanups = Rc::new(Cell::new(0));
//!
//! let fx = effect({
//!     let open = open.clone();
//!     let cleanups = cleanups.clone();
//!     move || {
//!         let _ = open.get();
//!         let cleanups = cleanups.clone();
//!         Some(on_unmount(move || cleanups.set(cleanups.get() + 1)))
//!     }
//! });
//!
//! open.set(true);
//! assert_eq!(cleanups.get(), 1);
//! fx.dispose();
//! assert_eq!(cleanups.get(), 2);
//! ```
//!
//! Effects created while a `Scope` is running are disposed with it. Within
//! one update, effects of shallower scopes run before deeper ones, so a
//! child component never observes a stale parent value.

pub mod component;
pub mod dom;
pub mod effects;
pub mod error;
pub mod input;
pub mod placement;
pub mod prelude;
pub mod reactive;
pub mod scope;
pub mod signal;
pub mod state;

pub use component::*;
pub use effects::*;
pub use error::{Error, Result};
pub use placement::*;
pub use prelude::*;
pub use reactive::{batch, untrack};
pub use signal::*;
pub use state::*;
