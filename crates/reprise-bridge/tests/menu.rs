use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reprise_bridge::*;
use reprise_core::*;
use reprise_ui::{MediaState, MenuButton, PortalDisabled};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn count() -> (Rc<Cell<usize>>, impl Fn(&Event) + 'static) {
    let n = Rc::new(Cell::new(0));
    let m = n.clone();
    (n, move |_: &Event| m.set(m.get() + 1))
}

fn expanded(button: &BridgeNode) -> bool {
    button
        .instance()
        .and_then(|i| i.component::<MenuButton>())
        .is_some_and(|b| b.expanded())
}

#[test]
fn press_opens_then_closes() {
    init_logs();
    let doc = Document::new(RenderEnv::Browser);
    let (opens, on_open) = count();
    let (closes, on_close) = count();
    let (selects, on_select) = count();

    let mut root = menu::Root().node();
    let slot = root
        .render(
            &Slot::root(&doc),
            &HostProps::new().on("onOpen", on_open).on("onClose", on_close),
            vec![],
        )
        .unwrap();
    let mut button = menu::Button().node();
    button
        .render(&slot, &HostProps::new().on("onSelect", on_select), vec![])
        .unwrap();
    let mut items = menu::Items().node();
    items.render(&slot, &HostProps::new(), vec![]).unwrap();

    let b1 = button.element().unwrap();
    doc.press(&b1, PointerKind::Mouse);
    assert_eq!(selects.get(), 1);
    assert_eq!(opens.get(), 1);
    assert!(expanded(&button));

    doc.press(&b1, PointerKind::Mouse);
    assert_eq!(selects.get(), 2);
    assert_eq!(closes.get(), 1);
    assert!(!expanded(&button));
}

#[test]
fn escape_closes_nested_menu_only() {
    let doc = Document::new(RenderEnv::Browser);
    let mut root = menu::Root().node();
    let mut root_button = menu::Button().node();
    let mut root_items = menu::Items().node();
    let mut sub = menu::Root().node();
    let mut sub_button = menu::Button().node();
    let mut sub_items = menu::Content().node();

    let props = HostProps::new();
    let r = root.render(&Slot::root(&doc), &props, vec![]).unwrap();
    root_button.render(&r, &props, vec![]).unwrap();
    let ri = root_items.render(&r, &props, vec![]).unwrap();
    let s = sub.render(&ri, &props, vec![]).unwrap();
    sub_button.render(&s, &props, vec![]).unwrap();
    sub_items.render(&s, &props, vec![]).unwrap();

    doc.press(&root_button.element().unwrap(), PointerKind::Mouse);
    doc.press(&sub_button.element().unwrap(), PointerKind::Mouse);
    assert!(expanded(&root_button) && expanded(&sub_button));
    assert_eq!(
        sub_button.element().unwrap().attribute("role").as_deref(),
        Some("menuitem")
    );

    doc.key_down(&doc.body(), Key::Escape);
    assert!(!expanded(&sub_button));
    assert!(expanded(&root_button));
}

#[test]
fn rerender_reuses_instance_and_calls_latest_callback() {
    let doc = Document::new(RenderEnv::Browser);
    let mut root = menu::Root().node();
    let slot = root.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();

    let calls = Rc::new(RefCell::new(Vec::new()));
    let on = |tag: &'static str| {
        let calls = calls.clone();
        move |_: &Event| calls.borrow_mut().push(tag)
    };

    let mut button = menu::Button().node();
    button
        .render(&slot, &HostProps::new().on("onSelect", on("first")), vec![])
        .unwrap();
    let id = button.instance().unwrap().id();
    let el = button.element().unwrap();

    button
        .render(&slot, &HostProps::new().on("onSelect", on("second")), vec![])
        .unwrap();
    assert_eq!(button.instance().unwrap().id(), id);
    assert_eq!(button.element(), Some(el.clone()));

    doc.press(&el, PointerKind::Mouse);
    assert_eq!(*calls.borrow(), vec!["second"]);

    // no callback on this render: the event still fires, nothing is called
    button.render(&slot, &HostProps::new(), vec![]).unwrap();
    doc.press(&el, PointerKind::Mouse);
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn omitted_prop_falls_back_to_default() {
    let doc = Document::new(RenderEnv::Browser);
    let mut root = menu::Root().node();
    let slot = root.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();
    let (selects, on_select) = count();
    let on_select = Rc::new(on_select);

    let mut button = menu::Button().node();
    let props = |disabled: Option<bool>| {
        let f = on_select.clone();
        let p = HostProps::new().on("onSelect", move |e: &Event| f(e));
        match disabled {
            Some(d) => p.set("disabled", d),
            None => p,
        }
    };
    button.render(&slot, &props(Some(true)), vec![]).unwrap();
    let el = button.element().unwrap();
    doc.press(&el, PointerKind::Mouse);
    assert_eq!(selects.get(), 0);
    assert_eq!(el.attribute("aria-disabled").as_deref(), Some("true"));

    button.render(&slot, &props(None), vec![]).unwrap();
    assert_eq!(el.attribute("aria-disabled").as_deref(), Some("false"));
    doc.press(&el, PointerKind::Mouse);
    assert_eq!(selects.get(), 1);
    assert!(expanded(&button));
}

#[test]
fn button_outside_menu_fails_and_leaves_nothing_behind() {
    let doc = Document::new(RenderEnv::Browser);
    let mut button = menu::Button().node();
    let err = button
        .render(&Slot::root(&doc), &HostProps::new(), vec![])
        .unwrap_err();
    assert!(matches!(err, Error::MissingContext { component: "media-menu-button", .. }));
    assert!(!button.is_mounted());
    assert!(doc.body().children().is_empty());
    assert_eq!(doc.listener_count(), 0);
}

#[test]
fn invalid_placement_is_rejected() {
    let doc = Document::new(RenderEnv::Browser);
    let mut root = menu::Root().node();
    let slot = root.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();
    let mut items = menu::Items().node();
    let err = items
        .render(&slot, &HostProps::new().set("placement", "diagonal"), vec![])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProp { .. }));

    items
        .render(&slot, &HostProps::new().set("placement", "left start"), vec![])
        .unwrap();
    assert_eq!(
        items.element().unwrap().attribute("data-placement").as_deref(),
        Some("left start")
    );
}

#[test]
fn unmount_tears_down_registrations() {
    let doc = Document::new(RenderEnv::Browser);
    let mut root = menu::Root().node();
    let slot = root.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();
    let mut button = menu::Button().node();
    button.render(&slot, &HostProps::new(), vec![]).unwrap();
    let el = button.element().unwrap();
    assert!(doc.listener_count() > 0);

    doc.press(&el, PointerKind::Mouse);
    let instance = button.instance().unwrap().clone();
    drop(button);
    assert_eq!(instance.state(), LifecycleState::Destroyed);
    assert!(!el.is_alive());

    root.unmount();
    assert_eq!(doc.listener_count(), 0);
    assert!(doc.body().children().is_empty());
}

#[test]
fn portal_follows_player_fullscreen() {
    let doc = Document::new(RenderEnv::Browser);
    let state = MediaState::new();
    state.set_fullscreen(true);

    let mut player = Player(state.clone()).node();
    let p = player.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();
    let mut root = menu::Root().node();
    let r = root.render(&p, &HostProps::new(), vec![]).unwrap();
    let mut button = menu::Button().node();
    button.render(&r, &HostProps::new(), vec![]).unwrap();
    let mut portal = menu::Portal();
    let ps = portal.render(&r, PortalDisabled::Fullscreen);
    let mut items = menu::Items().node();
    items.render(&ps, &HostProps::new(), vec![]).unwrap();
    let items_el = items.element().unwrap();

    assert!(!portal.is_relocated());
    assert!(r.element().contains(&items_el));

    state.set_fullscreen(false);
    assert!(portal.is_relocated());
    assert!(!r.element().contains(&items_el));
    assert!(doc.portal_root().contains(&items_el));

    // items stay part of the menu for outside presses
    doc.press(&button.element().unwrap(), PointerKind::Mouse);
    doc.press(&items_el, PointerKind::Mouse);
    assert!(expanded(&button));
    doc.press(&doc.body(), PointerKind::Mouse);
    assert!(!expanded(&button));

    portal.render(&r, false);
    assert!(portal.is_relocated());
    portal.render(&r, true);
    assert!(!portal.is_relocated());
}

#[test]
fn server_render_is_static_markup() {
    let doc = Document::new(RenderEnv::Server);
    let mut root = menu::Root().node();
    let slot = root.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();
    let mut button = menu::Button().node();
    button
        .render(
            &slot,
            &HostProps::new().set("aria-label", "Settings"),
            vec![HostElement::new("span").attr("data-part", "hint")],
        )
        .unwrap();
    let mut portal = menu::Portal();
    let ps = portal.render(&slot, false);
    let mut items = menu::Items().node();
    let is = items
        .render(&ps, &HostProps::new().set("placement", "top end"), vec![])
        .unwrap();
    let mut item = menu::Item().node();
    item.render(
        &is,
        &HostProps::new().set("hint", "1080p"),
        vec![HostElement::new("span").text("Quality")],
    )
    .unwrap();

    assert!(!portal.is_relocated());
    assert_eq!(doc.listener_count(), 0);
    assert_eq!(
        button.instance().map(Instance::state),
        Some(LifecycleState::Attached)
    );
    insta::assert_snapshot!(
        doc.body().outer_html(),
        @r#"<body><media-menu><media-menu-button aria-disabled="false" aria-expanded="false" aria-haspopup="true" aria-label="Settings"><span data-part="hint"></span></media-menu-button><div data-portal=""><media-menu-items aria-hidden="true" class="vds-menu-items" data-placement="top end" role="menu"><media-menu-item aria-disabled="false" role="menuitem"><span>Quality</span></media-menu-item></media-menu-items></div></media-menu></body>"#
    );
}

#[test]
fn button_rerender_keeps_hint_of_highlighted_item() {
    let doc = Document::new(RenderEnv::Browser);
    let mut root = menu::Root().node();
    let slot = root.render(&Slot::root(&doc), &HostProps::new(), vec![]).unwrap();
    let hint_span = || vec![HostElement::new("span").attr("data-part", "hint")];
    let mut button = menu::Button().node();
    button.render(&slot, &HostProps::new(), hint_span()).unwrap();
    let mut items = menu::Items().node();
    let is = items.render(&slot, &HostProps::new(), vec![]).unwrap();
    let mut item = menu::Item().node();
    item.render(&is, &HostProps::new().set("hint", "1080p"), vec![])
        .unwrap();

    let button_el = button.element().unwrap();
    doc.press(&button_el, PointerKind::Mouse);
    doc.focus(&item.element().unwrap());
    let hint = button_el.query_part("hint").unwrap();
    assert_eq!(hint.text(), "1080p");

    button.render(&slot, &HostProps::new(), hint_span()).unwrap();
    assert_eq!(button_el.query_part("hint"), Some(hint.clone()));
    assert_eq!(hint.text(), "1080p");
}
