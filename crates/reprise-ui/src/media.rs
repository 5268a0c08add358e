use reprise_core::*;

/// Media state owned by the surrounding player. Widgets only read it.
#[derive(Clone, Debug)]
pub struct MediaState {
    fullscreen: Signal<bool>,
}

impl Default for MediaState {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaState {
    pub fn new() -> Self {
        Self {
            fullscreen: signal(false),
        }
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen.get()
    }

    pub fn fullscreen_signal(&self) -> Signal<bool> {
        self.fullscreen.clone()
    }

    /// Called by the playback side when fullscreen is entered or left.
    pub fn set_fullscreen(&self, on: bool) {
        self.fullscreen.set_if_changed(on);
    }
}

static PLAYER: ComponentSchema = ComponentSchema {
    tag: "media-player",
    props: &[],
    events: &[],
};

/// Provides a [`MediaState`] to every widget rendered inside it.
pub struct MediaProvider {
    state: MediaState,
}

impl MediaProvider {
    pub fn new(state: MediaState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MediaState {
        &self.state
    }
}

impl Component for MediaProvider {
    fn schema(&self) -> &'static ComponentSchema {
        &PLAYER
    }

    fn on_setup(&self, instance: &Instance) -> Result<()> {
        instance.provide(self.state.clone());
        Ok(())
    }

    fn on_attach(&self, _instance: &Instance, el: &Element) -> Result<()> {
        let (el, fullscreen) = (el.clone(), self.state.fullscreen_signal());
        effect(move || {
            el.toggle_attribute("data-fullscreen", fullscreen.get());
            None
        });
        Ok(())
    }
}
