//! Pure playback session state machine.
//!
//! Mirrors the audio thread's state on the app side so transport logic is a
//! plain state transition, testable without a device. The audio thread
//! confirms or corrects it through events (`playing`/`paused`/`ended`).

use std::time::Duration;

/// Lifecycle of the single audio session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No source loaded.
    #[default]
    Empty,
    /// Source set, playback not yet confirmed.
    Loaded,
    Playing,
    Paused,
}

/// Transport intent produced by a toggle, executed against the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Play,
    Pause,
    None,
}

#[derive(Debug, Default)]
pub struct PlaybackSession {
    phase: SessionPhase,
    source_url: Option<String>,
    position: Duration,
    duration: Duration,
    volume: f32,
}

impl PlaybackSession {
    pub fn new(volume: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            0.0
        } else {
            (self.position.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        }
    }

    /// Swap the source. Always stops reported playback and rewinds; a later
    /// `load` overrides an earlier one, so the most recent source wins.
    pub fn load(&mut self, url: impl Into<String>, duration: Duration) {
        self.source_url = Some(url.into());
        self.position = Duration::ZERO;
        self.duration = duration;
        self.phase = SessionPhase::Loaded;
    }

    /// Decide what a play/pause toggle should do, and flip the mirror
    /// optimistically. With no source this is a no-op.
    pub fn toggle(&mut self) -> Transport {
        match self.phase {
            SessionPhase::Playing => {
                self.phase = SessionPhase::Paused;
                Transport::Pause
            }
            SessionPhase::Loaded | SessionPhase::Paused => {
                self.phase = SessionPhase::Playing;
                Transport::Play
            }
            SessionPhase::Empty => Transport::None,
        }
    }

    /// Audio thread confirmed playback started.
    pub fn playing(&mut self) {
        if self.source_url.is_some() {
            self.phase = SessionPhase::Playing;
        }
    }

    /// Audio thread paused, or a play attempt was rejected.
    pub fn paused(&mut self) {
        if self.source_url.is_some() {
            self.phase = SessionPhase::Paused;
        }
    }

    /// Natural end of the source: treated as paused at position zero.
    pub fn ended(&mut self) {
        self.position = Duration::ZERO;
        if self.source_url.is_some() {
            self.phase = SessionPhase::Paused;
        }
    }

    pub fn set_progress(&mut self, position: Duration, duration: Duration) {
        self.position = position;
        if !duration.is_zero() {
            self.duration = duration;
        }
    }

    /// Clamp and set the position. Play/pause state is unchanged.
    pub fn seek(&mut self, position: Duration) -> Duration {
        self.position = position.min(self.duration);
        self.position
    }

    /// Clamp to [0, 1]; kept as the session default across track changes.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = volume.clamp(0.0, 1.0);
        self.volume
    }

    /// Drop the source entirely (explicit stop/reset), keeping the volume.
    pub fn clear(&mut self) {
        self.source_url = None;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
        self.phase = SessionPhase::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREVIEW: Duration = Duration::from_secs(30);

    #[test]
    fn test_load_resets_position_and_playback() {
        let mut session = PlaybackSession::new(1.0);
        session.load("https://audio.example/a.m4a", PREVIEW);
        session.playing();
        session.set_progress(Duration::from_secs(12), PREVIEW);

        session.load("https://audio.example/b.m4a", PREVIEW);
        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert_eq!(session.position(), Duration::ZERO);
        assert!(!session.is_playing());
    }

    #[test]
    fn test_latest_load_wins() {
        let mut session = PlaybackSession::new(1.0);
        session.load("https://audio.example/a.m4a", PREVIEW);
        session.load("https://audio.example/b.m4a", PREVIEW);

        assert_eq!(session.toggle(), Transport::Play);
        assert_eq!(session.source_url(), Some("https://audio.example/b.m4a"));
    }

    #[test]
    fn test_toggle_is_involution() {
        let mut session = PlaybackSession::new(1.0);
        session.load("https://audio.example/a.m4a", PREVIEW);
        session.playing();

        let before = session.is_playing();
        session.toggle();
        session.toggle();
        assert_eq!(session.is_playing(), before);
    }

    #[test]
    fn test_toggle_without_source_is_noop() {
        let mut session = PlaybackSession::new(1.0);
        assert_eq!(session.toggle(), Transport::None);
        assert_eq!(session.phase(), SessionPhase::Empty);
    }

    #[test]
    fn test_seek_clamps_and_keeps_phase() {
        let mut session = PlaybackSession::new(1.0);
        session.load("https://audio.example/a.m4a", PREVIEW);
        session.paused();

        assert_eq!(session.seek(Duration::from_secs(90)), PREVIEW);
        assert_eq!(session.phase(), SessionPhase::Paused);

        session.playing();
        session.seek(Duration::from_secs(5));
        assert!(session.is_playing());
    }

    #[test]
    fn test_volume_clamps_and_persists() {
        let mut session = PlaybackSession::new(0.8);
        assert_eq!(session.set_volume(1.7), 1.0);
        assert_eq!(session.set_volume(-0.2), 0.0);

        session.set_volume(0.5);
        session.load("https://audio.example/a.m4a", PREVIEW);
        assert_eq!(session.volume(), 0.5);
    }

    #[test]
    fn test_natural_end_is_paused_at_zero() {
        let mut session = PlaybackSession::new(1.0);
        session.load("https://audio.example/a.m4a", PREVIEW);
        session.playing();
        session.set_progress(PREVIEW, PREVIEW);

        session.ended();
        assert_eq!(session.phase(), SessionPhase::Paused);
        assert_eq!(session.position(), Duration::ZERO);

        // The next toggle plays again from the start.
        assert_eq!(session.toggle(), Transport::Play);
    }
}
