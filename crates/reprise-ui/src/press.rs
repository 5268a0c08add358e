use reprise_core::*;

/// Calls `f` when `el` is activated: a click or tap, or Enter/Space while it
/// has keyboard focus. Listeners belong to the current scope.
pub fn on_press(el: &Element, f: impl Fn(Trigger) + 'static) {
    let f = std::rc::Rc::new(f);
    let click = el.add_listener(EventType::Click, {
        let f = f.clone();
        move |e| {
            if let EventKind::Click(kind) = e.kind {
                f(Trigger {
                    modality: kind.into(),
                    node: Some(e.target.id()),
                });
            }
        }
    });
    let key = el.add_listener(EventType::KeyDown, move |e| {
        if let EventKind::KeyDown(k) = &e.kind
            && k.key.is_activation()
            && !k.is_repeat
        {
            f(Trigger {
                modality: InputModality::Keyboard,
                node: Some(e.target.id()),
            });
        }
    });
    on_cleanup(move || {
        click.run();
        key.run();
    });
}
