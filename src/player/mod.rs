//! Playback synchronizer: one audio session, lazily built, event-driven.

pub mod analyzer;
pub mod backend;
pub mod session;

pub use analyzer::{Spectrum, BANDS};
pub use backend::{Player, PlayerCommand, PlayerEvent};
pub use session::{PlaybackSession, SessionPhase, Transport};
