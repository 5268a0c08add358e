#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use reprise_core::*;

    use crate::*;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn mount<C: Component>(
        doc: &Document,
        host: &Element,
        parent: Option<&Instance>,
        component: C,
        props: &[(&str, PropValue)],
    ) -> Result<(Instance, Element)> {
        let inst = Instance::new(component, parent);
        let el = doc.create_element(inst.tag());
        host.append_child(&el);
        inst.setup(props.iter().cloned())?;
        inst.attach(&el)?;
        if doc.is_browser() {
            inst.connect()?;
        }
        Ok((inst, el))
    }

    struct MenuFixture {
        menu: Instance,
        menu_el: Element,
        button: Instance,
        button_el: Element,
        items: Instance,
        items_el: Element,
    }

    impl MenuFixture {
        fn new(doc: &Document, host: &Element, parent: Option<&Instance>) -> Self {
            Self::with_button_props(doc, host, parent, &[])
        }

        fn with_button_props(
            doc: &Document,
            host: &Element,
            parent: Option<&Instance>,
            button_props: &[(&str, PropValue)],
        ) -> Self {
            let (menu, menu_el) = mount(doc, host, parent, Menu::new(), &[]).unwrap();
            let (button, button_el) =
                mount(doc, &menu_el, Some(&menu), MenuButton::new(), button_props).unwrap();
            let (items, items_el) =
                mount(doc, &menu_el, Some(&menu), MenuItems::new(), &[]).unwrap();
            Self {
                menu,
                menu_el,
                button,
                button_el,
                items,
                items_el,
            }
        }

        fn submenu(&self, doc: &Document) -> Self {
            Self::new(doc, &self.items_el, Some(&self.items))
        }

        fn ctx(&self) -> MenuContext {
            self.menu.component::<Menu>().unwrap().context().unwrap()
        }

        fn expanded(&self) -> bool {
            self.ctx().is_expanded()
        }

        fn press(&self) {
            self.button_el
                .document()
                .press(&self.button_el, PointerKind::Mouse);
        }
    }

    fn counter(inst: &Instance, event: &str) -> Rc<Cell<usize>> {
        let n = Rc::new(Cell::new(0));
        let _ = inst
            .listen(event, {
                let n = n.clone();
                move |_| n.set(n.get() + 1)
            })
            .unwrap();
        n
    }

    #[test]
    fn test_button_press_toggles_once_per_activation() {
        init_logs();
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        let selects = counter(&m.button, "select");
        let opens = counter(&m.menu, "open");
        let closes = counter(&m.menu, "close");

        m.press();
        assert_eq!(selects.get(), 1);
        assert_eq!(opens.get(), 1);
        assert!(m.expanded());
        assert_eq!(m.button_el.attribute("aria-expanded").as_deref(), Some("true"));
        assert!(m.button_el.has_attribute("data-expanded"));
        assert!(m.items_el.has_attribute("data-open"));
        assert!(m.menu.component::<Menu>().unwrap().expanded());
        assert!(m.button.component::<MenuButton>().unwrap().expanded());

        m.press();
        assert_eq!(selects.get(), 2);
        assert_eq!(closes.get(), 1);
        assert!(!m.expanded());
        assert_eq!(m.button_el.attribute("aria-expanded").as_deref(), Some("false"));
        assert_eq!(m.items_el.attribute("aria-hidden").as_deref(), Some("true"));

        // keyboard activation toggles too
        doc.key_down(&m.button_el, Key::Enter);
        doc.key_down(&m.button_el, Key::Space);
        assert_eq!(selects.get(), 4);
        assert!(!m.expanded());
        assert_eq!(opens.get(), 2);
        assert_eq!(closes.get(), 2);
    }

    #[test]
    fn test_select_carries_modality() {
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _ = m
            .button
            .listen("select", {
                let seen = seen.clone();
                move |e| {
                    if let EventDetail::Trigger(t) = &e.detail {
                        seen.borrow_mut().push(t.modality);
                    }
                }
            })
            .unwrap();

        doc.press(&m.button_el, PointerKind::Touch);
        doc.key_down(&m.button_el, Key::Enter);
        assert_eq!(
            *seen.borrow(),
            vec![InputModality::Touch, InputModality::Keyboard]
        );
    }

    #[test]
    fn test_disabled_button_never_selects() {
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::with_button_props(
            &doc,
            &doc.body(),
            None,
            &[("disabled", true.into())],
        );
        let selects = counter(&m.button, "select");

        m.press();
        doc.press(&m.button_el, PointerKind::Touch);
        doc.key_down(&m.button_el, Key::Enter);
        doc.key_down(&m.button_el, Key::Space);
        assert_eq!(selects.get(), 0);
        assert!(!m.expanded());
        assert_eq!(m.button_el.attribute("aria-disabled").as_deref(), Some("true"));

        // a disabled button also blocks programmatic expansion
        assert!(!m.ctx().expand());

        m.button.set_prop("disabled", false.into()).unwrap();
        m.press();
        assert_eq!(selects.get(), 1);
        assert!(m.expanded());
    }

    #[test]
    fn test_disabled_button_does_not_close_open_menu() {
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        m.press();
        assert!(m.expanded());

        m.button.set_prop("disabled", true.into()).unwrap();
        m.button.dispatch("select", EventDetail::None);
        m.press();
        assert!(m.expanded());

        // closing through other paths still works
        doc.key_down(&doc.body(), Key::Escape);
        assert!(!m.expanded());
    }

    #[test]
    fn test_sibling_collapses_parent_unchanged() {
        let doc = Document::new(RenderEnv::Browser);
        let root = MenuFixture::new(&doc, &doc.body(), None);
        let a = root.submenu(&doc);
        let b = root.submenu(&doc);
        let a_closes = counter(&a.menu, "close");

        root.press();
        a.press();
        assert!(root.expanded() && a.expanded());

        b.press();
        assert!(b.expanded());
        assert!(!a.expanded());
        assert!(root.expanded());
        assert_eq!(a_closes.get(), 1);
        assert_eq!(a.button_el.attribute("role").as_deref(), Some("menuitem"));
        assert!(a.menu_el.has_attribute("data-submenu"));
    }

    #[test]
    fn test_programmatic_sibling_expansion() {
        let doc = Document::new(RenderEnv::Browser);
        let root = MenuFixture::new(&doc, &doc.body(), None);
        let a = root.submenu(&doc);
        let b = root.submenu(&doc);

        assert!(root.ctx().expand());
        assert!(a.ctx().expand());
        assert!(b.ctx().expand());
        assert!(!a.expanded());
        assert!(root.expanded());
        assert_eq!(root.ctx().depth(), 0);
        assert_eq!(b.ctx().depth(), 1);
        assert_eq!(b.ctx().parent(), Some(root.ctx()));
    }

    #[test]
    fn test_submenu_refused_under_collapsed_parent() {
        let doc = Document::new(RenderEnv::Browser);
        let root = MenuFixture::new(&doc, &doc.body(), None);
        let child = root.submenu(&doc);

        assert!(!child.ctx().expand());
        assert!(!child.expanded());
    }

    #[test]
    fn test_collapse_cascades_without_window() {
        init_logs();
        let doc = Document::new(RenderEnv::Browser);
        let root = MenuFixture::new(&doc, &doc.body(), None);
        let child = root.submenu(&doc);
        let grandchild = child.submenu(&doc);

        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, m) in [("root", &root), ("child", &child), ("grandchild", &grandchild)] {
            let _ = m
                .menu
                .listen("close", {
                    let order = order.clone();
                    move |_| order.borrow_mut().push(name)
                })
                .unwrap();
        }

        root.press();
        child.press();
        grandchild.press();
        assert!(grandchild.expanded());

        let violations = Rc::new(Cell::new(0));
        let (r, c, g) = (root.ctx(), child.ctx(), grandchild.ctx());
        let _watch = effect({
            let violations = violations.clone();
            move || {
                let (r, c, g) = (r.expanded(), c.expanded(), g.expanded());
                if (c && !r) || (g && !c) {
                    violations.set(violations.get() + 1);
                }
                None
            }
        });

        assert!(root.ctx().collapse());
        assert_eq!(violations.get(), 0);
        assert!(!root.expanded() && !child.expanded() && !grandchild.expanded());
        assert_eq!(*order.borrow(), vec!["grandchild", "child", "root"]);
    }

    #[test]
    fn test_escape_collapses_deepest_only() {
        let doc = Document::new(RenderEnv::Browser);
        let root = MenuFixture::new(&doc, &doc.body(), None);
        let child = root.submenu(&doc);

        root.press();
        child.press();
        assert!(child.expanded());

        doc.key_down(&doc.body(), Key::Escape);
        assert!(!child.expanded());
        assert!(root.expanded());
        assert_eq!(doc.focused(), Some(child.button_el.clone()));
        assert!(child.button_el.has_attribute("data-focus-visible"));

        doc.key_down(&doc.body(), Key::Escape);
        assert!(!root.expanded());
        assert_eq!(doc.focused(), Some(root.button_el.clone()));
    }

    #[test]
    fn test_outside_press_collapses() {
        let doc = Document::new(RenderEnv::Browser);
        let root = MenuFixture::new(&doc, &doc.body(), None);
        let child = root.submenu(&doc);
        let outside = doc.create_element("div");
        doc.body().append_child(&outside);
        let idle = doc.listener_count();

        root.press();
        child.press();
        assert_eq!(doc.listener_count(), idle + 2);

        // inside the root but outside the submenu: only the submenu closes
        doc.press(&root.items_el, PointerKind::Mouse);
        assert!(!child.expanded());
        assert!(root.expanded());

        doc.press(&outside, PointerKind::Mouse);
        assert!(!root.expanded());
        assert_eq!(doc.listener_count(), idle);
    }

    #[test]
    fn test_outside_press_counts_portalled_items() {
        let doc = Document::new(RenderEnv::Browser);
        let (menu, menu_el) = mount(&doc, &doc.body(), None, Menu::new(), &[]).unwrap();
        let (_button, button_el) =
            mount(&doc, &menu_el, Some(&menu), MenuButton::new(), &[]).unwrap();

        let scope = Scope::new();
        let portal = scope.run(|| {
            PortalController::new(&menu_el, signal(PortalDisabled::No), signal(false))
        });
        assert!(portal.is_relocated());
        let (items, items_el) = mount(
            &doc,
            portal.container(),
            Some(&menu),
            MenuItems::new(),
            &[],
        )
        .unwrap();
        let (_item, item_el) =
            mount(&doc, &items_el, Some(&items), MenuItem::new(), &[]).unwrap();
        assert!(!menu_el.contains(&item_el));

        doc.press(&button_el, PointerKind::Mouse);
        let menu_comp = menu.component::<Menu>().unwrap();
        assert!(menu_comp.expanded());

        doc.press(&item_el, PointerKind::Mouse);
        assert!(menu_comp.expanded());

        doc.press(&doc.body(), PointerKind::Mouse);
        assert!(!menu_comp.expanded());
        scope.dispose();
    }

    #[test]
    fn test_hint_syncs_into_button() {
        let doc = Document::new(RenderEnv::Browser);
        let (menu, menu_el) = mount(&doc, &doc.body(), None, Menu::new(), &[]).unwrap();
        let button = Instance::new(MenuButton::new(), Some(&menu));
        let button_el = doc.create_element(button.tag());
        let hint_el = doc.create_element("span");
        hint_el.set_attribute("data-part", "hint");
        button_el.append_child(&hint_el);
        menu_el.append_child(&button_el);
        button.setup(Vec::<(&str, PropValue)>::new()).unwrap();
        button.attach(&button_el).unwrap();
        button.connect().unwrap();

        let (items, items_el) =
            mount(&doc, &menu_el, Some(&menu), MenuItems::new(), &[]).unwrap();
        let (_hd, hd_el) = mount(
            &doc,
            &items_el,
            Some(&items),
            MenuItem::new(),
            &[("hint", "1080p".into())],
        )
        .unwrap();
        let (_auto, auto_el) =
            mount(&doc, &items_el, Some(&items), MenuItem::new(), &[]).unwrap();
        auto_el.set_text("Auto");

        doc.press(&button_el, PointerKind::Mouse);
        let ctx = menu.component::<Menu>().unwrap().context().unwrap();

        doc.dispatch(&hd_el, EventKind::PointerEnter(PointerKind::Mouse));
        assert_eq!(ctx.hint(), "1080p");
        assert_eq!(hint_el.text(), "1080p");
        assert!(hd_el.has_attribute("data-highlighted"));

        doc.dispatch(&hd_el, EventKind::PointerLeave(PointerKind::Mouse));
        assert_eq!(ctx.hint(), "");
        // an empty hint leaves the last text in place
        assert_eq!(hint_el.text(), "1080p");

        doc.focus(&auto_el);
        assert_eq!(hint_el.text(), "Auto");

        assert!(ctx.collapse());
        assert_eq!(ctx.hint(), "");
        assert!(!auto_el.has_attribute("data-highlighted"));
    }

    #[test]
    fn test_highlight_needs_open_menu_and_resets_on_close() {
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        let (item, item_el) = mount(
            &doc,
            &m.items_el,
            Some(&m.items),
            MenuItem::new(),
            &[("hint", "1080p".into())],
        )
        .unwrap();
        let highlighted = || item.component::<MenuItem>().unwrap().is_highlighted();

        doc.dispatch(&item_el, EventKind::PointerEnter(PointerKind::Mouse));
        assert_eq!(m.ctx().hint(), "");
        assert!(!highlighted());

        m.press();
        doc.dispatch(&item_el, EventKind::PointerEnter(PointerKind::Mouse));
        assert_eq!(m.ctx().hint(), "1080p");
        assert!(item_el.has_attribute("data-highlighted"));

        m.press();
        assert!(!highlighted());
        m.press();
        assert!(m.expanded());
        assert!(!item_el.has_attribute("data-highlighted"));
        assert_eq!(m.ctx().hint(), "");
    }

    #[test]
    fn test_item_select_and_disabled_item() {
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        let (on, on_el) = mount(&doc, &m.items_el, Some(&m.items), MenuItem::new(), &[]).unwrap();
        let (off, off_el) = mount(
            &doc,
            &m.items_el,
            Some(&m.items),
            MenuItem::new(),
            &[("disabled", true.into())],
        )
        .unwrap();
        let (on_n, off_n) = (counter(&on, "select"), counter(&off, "select"));

        m.press();
        doc.press(&on_el, PointerKind::Mouse);
        doc.press(&off_el, PointerKind::Mouse);
        doc.key_down(&off_el, Key::Enter);
        assert_eq!(on_n.get(), 1);
        assert_eq!(off_n.get(), 0);
        assert_eq!(off_el.attribute("aria-disabled").as_deref(), Some("true"));
        assert_eq!(on_el.attribute("role").as_deref(), Some("menuitem"));
    }

    #[test]
    fn test_button_outside_menu_is_configuration_error() {
        let doc = Document::new(RenderEnv::Browser);
        let err = mount(&doc, &doc.body(), None, MenuButton::new(), &[]).unwrap_err();
        assert_eq!(
            err,
            Error::MissingContext {
                component: "media-menu-button",
                context: "MenuContext",
            }
        );
    }

    #[test]
    fn test_removing_expanded_submenu_is_silent() {
        let doc = Document::new(RenderEnv::Browser);
        let root = MenuFixture::new(&doc, &doc.body(), None);
        let child = root.submenu(&doc);
        let closes = counter(&child.menu, "close");
        let registry = root.ctx().registry().clone();
        assert_eq!(registry.len(), 2);

        root.press();
        child.press();
        let child_ctx = child.ctx();
        child.items.destroy();
        child.button.destroy();
        child.menu.destroy();

        assert_eq!(closes.get(), 0);
        assert_eq!(registry.len(), 1);
        assert!(!child_ctx.is_registered());
        assert!(root.expanded());
    }

    #[test]
    fn test_menu_items_placement() {
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        assert!(m.items_el.has_class("vds-menu-items"));
        assert_eq!(m.items_el.attribute("role").as_deref(), Some("menu"));
        assert_eq!(m.items_el.attribute("data-placement").as_deref(), Some("bottom"));

        m.items
            .set_prop("placement", Placement::new(Side::Top, Align::End).into())
            .unwrap();
        assert_eq!(m.items_el.attribute("data-placement").as_deref(), Some("top end"));

        m.items.set_prop("placement", "left".into()).unwrap();
        assert_eq!(m.items_el.attribute("data-placement").as_deref(), Some("left"));
    }

    #[test]
    fn test_focus_visible_by_modality() {
        let doc = Document::new(RenderEnv::Browser);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        let fv = m
            .button
            .component::<MenuButton>()
            .unwrap()
            .focus_visible()
            .clone();
        let before = doc.listener_count();
        assert!(before >= 2);

        doc.key_down(&doc.body(), Key::Tab);
        doc.focus(&m.button_el);
        assert_eq!(fv.modality(), InputModality::Keyboard);
        assert!(m.button_el.has_attribute("data-focus-visible"));

        doc.blur();
        assert!(!m.button_el.has_attribute("data-focus-visible"));

        doc.dispatch(&doc.body(), EventKind::PointerDown(PointerKind::Touch));
        doc.focus(&m.button_el);
        assert_eq!(fv.modality(), InputModality::Touch);
        assert!(fv.is_focused());
        assert!(!m.button_el.has_attribute("data-focus-visible"));

        // character keys do not count as keyboard navigation
        doc.blur();
        doc.key_down(&doc.body(), Key::Character('k'));
        doc.focus(&m.button_el);
        assert!(!fv.is_focus_visible());

        m.button.disconnect().unwrap();
        assert_eq!(doc.listener_count(), before - 2);
        assert!(!fv.is_focused());
    }

    #[test]
    fn test_portal_decision_table() {
        use crate::portal::Disabled;

        assert!(should_portal(Disabled::No, false));
        assert!(should_portal(Disabled::No, true));
        assert!(!should_portal(Disabled::Yes, false));
        assert!(!should_portal(Disabled::Fullscreen, true));
        assert!(should_portal(Disabled::Fullscreen, false));

        assert_eq!("fullscreen".parse::<Disabled>(), Ok(Disabled::Fullscreen));
        assert_eq!(Disabled::try_from(&PropValue::Bool(true)), Ok(Disabled::Yes));
        assert!("sometimes".parse::<Disabled>().is_err());
    }

    #[test]
    fn test_portal_follows_fullscreen() {
        let doc = Document::new(RenderEnv::Browser);
        let anchor = doc.create_element("div");
        doc.body().append_child(&anchor);
        let (disabled, fullscreen) = (signal(PortalDisabled::Fullscreen), signal(true));

        let scope = Scope::new();
        let portal =
            scope.run(|| PortalController::new(&anchor, disabled.clone(), fullscreen.clone()));
        assert!(!portal.is_relocated());
        assert_eq!(portal.container().parent(), Some(anchor.clone()));

        fullscreen.set(false);
        assert!(portal.is_relocated());
        assert_eq!(portal.container().parent(), Some(doc.portal_root()));
        assert!(portal.container().has_attribute("data-portalled"));

        disabled.set(PortalDisabled::Yes);
        assert!(!portal.is_relocated());
        assert_eq!(portal.container().parent(), Some(anchor.clone()));
        scope.dispose();
    }

    #[test]
    fn test_portal_stays_in_place_on_server() {
        let doc = Document::new(RenderEnv::Server);
        let anchor = doc.create_element("div");
        doc.body().append_child(&anchor);
        let portal = PortalController::new(&anchor, signal(PortalDisabled::No), signal(false));
        assert!(!portal.is_relocated());
        assert_eq!(portal.container().parent(), Some(anchor));
    }

    #[test]
    fn test_server_menu_has_no_listeners() {
        let doc = Document::new(RenderEnv::Server);
        let m = MenuFixture::new(&doc, &doc.body(), None);
        assert_eq!(m.button.state(), LifecycleState::Attached);
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(m.button_el.listener_count(), 0);
        assert_eq!(m.button_el.attribute("aria-expanded").as_deref(), Some("false"));
    }

    #[test]
    fn test_tooltip_shows_on_hover_and_keyboard_focus() {
        let doc = Document::new(RenderEnv::Browser);
        let (tip, tip_el) = mount(&doc, &doc.body(), None, Tooltip::new(), &[]).unwrap();
        let (_trigger, trigger_el) =
            mount(&doc, &tip_el, Some(&tip), TooltipTrigger::new(), &[]).unwrap();
        let (_content, content_el) = mount(
            &doc,
            &tip_el,
            Some(&tip),
            TooltipContent::new(),
            &[("placement", "bottom start".into())],
        )
        .unwrap();
        assert!(content_el.has_class("vds-tooltip-content"));
        assert_eq!(content_el.attribute("data-placement").as_deref(), Some("bottom start"));

        doc.dispatch(&trigger_el, EventKind::PointerEnter(PointerKind::Mouse));
        assert!(content_el.has_attribute("data-visible"));
        doc.dispatch(&trigger_el, EventKind::PointerLeave(PointerKind::Mouse));
        assert!(!content_el.has_attribute("data-visible"));

        doc.dispatch(&doc.body(), EventKind::PointerDown(PointerKind::Mouse));
        doc.focus(&trigger_el);
        assert!(!content_el.has_attribute("data-visible"));
        doc.blur();

        doc.key_down(&doc.body(), Key::Tab);
        doc.focus(&trigger_el);
        assert!(content_el.has_attribute("data-visible"));
        assert!(trigger_el.has_attribute("data-showing"));
        doc.key_down(&trigger_el, Key::Escape);
        assert!(!content_el.has_attribute("data-visible"));
    }

    #[test]
    fn test_media_provider_exposes_state() {
        let doc = Document::new(RenderEnv::Browser);
        let state = MediaState::new();
        let (player, player_el) = mount(
            &doc,
            &doc.body(),
            None,
            MediaProvider::new(state.clone()),
            &[],
        )
        .unwrap();
        let (child, _) = mount(&doc, &player_el, Some(&player), Tooltip::new(), &[]).unwrap();

        let seen = child.require_context::<MediaState>().unwrap();
        state.set_fullscreen(true);
        assert!(seen.fullscreen());
        assert!(player_el.has_attribute("data-fullscreen"));
    }
}
