pub use crate::component::{
    Component, ComponentSchema, Event, EventDetail, Instance, InstanceId, LifecycleState,
    PropDecl, PropValue, Trigger, WeakInstance,
};
pub use crate::dom::{Document, DomEvent, Element, EventKind, EventType, NodeId, RenderEnv};
pub use crate::effects::{Dispose, Effect, effect, on_unmount};
pub use crate::error::{Error, Result};
pub use crate::input::*;
pub use crate::placement::{Align, Placement, Side};
pub use crate::reactive::{batch, untrack};
pub use crate::scope::{Scope, current_scope, on_cleanup};
pub use crate::signal::{Signal, signal};
pub use crate::state::{Memo, memo};
