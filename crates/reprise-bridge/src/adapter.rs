//! Host naming conventions. A component declares `select`; a JSX host
//! passes `onSelect`, a template host passes `on:select`. Adapters only
//! translate names; the component contract is the same for every host.

use reprise_core::ComponentSchema;

pub trait HostAdapter: 'static {
    fn name(&self) -> &'static str;

    /// Host key carrying the callback for a declared event.
    fn callback_name(&self, event: &str) -> String;

    fn as_child_key(&self) -> &'static str;

    fn ref_key(&self) -> &'static str {
        "ref"
    }

    /// Declared event a host key delivers, if the key is a callback key.
    fn event_for_key(&self, schema: &ComponentSchema, key: &str) -> Option<&'static str> {
        schema
            .events
            .iter()
            .copied()
            .find(|event| self.callback_name(event) == key)
    }
}

/// `onSelect`, `asChild`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Jsx;

impl HostAdapter for Jsx {
    fn name(&self) -> &'static str {
        "jsx"
    }

    fn callback_name(&self, event: &str) -> String {
        let mut chars = event.chars();
        match chars.next() {
            Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => "on".to_string(),
        }
    }

    fn as_child_key(&self) -> &'static str {
        "asChild"
    }
}

/// `on:select`, `as-child`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Template;

impl HostAdapter for Template {
    fn name(&self) -> &'static str {
        "template"
    }

    fn callback_name(&self, event: &str) -> String {
        format!("on:{event}")
    }

    fn as_child_key(&self) -> &'static str {
        "as-child"
    }
}
