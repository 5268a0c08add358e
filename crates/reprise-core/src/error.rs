use crate::component::LifecycleState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A component was attached outside of the ancestor that provides the
    /// context it needs (e.g. a menu button outside of a menu).
    #[error("<{component}> must be placed inside a component providing `{context}`")]
    MissingContext {
        component: &'static str,
        context: &'static str,
    },
    #[error("<{component}> with asChild expects exactly one child element, found {found}")]
    Composition {
        component: &'static str,
        found: usize,
    },
    #[error("<{component}> cannot move from {from:?} to {to:?}")]
    Lifecycle {
        component: &'static str,
        from: LifecycleState,
        to: LifecycleState,
    },
    #[error("<{component}> cannot connect: its element is not part of the document")]
    NotConnected { component: &'static str },
    #[error("<{component}> does not declare an event named `{event}`")]
    UnknownEvent {
        component: &'static str,
        event: String,
    },
    #[error("<{component}> does not declare a prop named `{prop}`")]
    UnknownProp {
        component: &'static str,
        prop: String,
    },
    #[error("invalid value for `{prop}`: {reason}")]
    InvalidProp { prop: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
