use reprise_ui::{MediaProvider, MediaState};

use crate::bridge::Bridge;

/// `<media-player>` providing `state` to everything rendered inside it.
pub fn Player(state: MediaState) -> Bridge {
    Bridge::new("MediaPlayer", move || MediaProvider::new(state.clone()))
}
