//! Application actions/events that drive state changes.

use crate::catalog::Track;

/// Actions that can be dispatched to update application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Application lifecycle
    Quit,
    Tick,
    Resize(u16, u16),

    // Navigation intents and raw input for the adapters
    Advance,
    Retreat,
    Wheel(i32),
    SwipePress(u16),
    SwipeRelease(u16),

    // Transport controls
    PlayPause,
    SeekForward,
    SeekBackward,
    SeekToFraction(f64),
    VolumeUp,
    VolumeDown,

    // Discovery controls
    ToggleSave,
    Restart,

    // Async task results
    RoundLoaded { session: u64, tracks: Vec<Track> },
    FavoritesLoaded(Vec<Track>),
    FavoritePersistFailed { id: u64, saving: bool },

    // Overlays
    ShowHelp,
    HideHelp,

    // Errors
    Error(String),
    ClearError,

    // No-op
    None,
}

/// Direction of the last navigation, used for transition styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavDirection {
    #[default]
    Forward,
    Backward,
}

impl NavDirection {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Forward => "▼",
            Self::Backward => "▲",
        }
    }
}
