//! Main application state and logic.
//!
//! Reconciles the three independently-timed processes: aggregation rounds
//! completing over the network, user navigation intents, and the audio
//! session lifecycle. Every index change runs the same sequenced operation —
//! pause, load, play — so two sources can never decode at once, and stale
//! round results are filtered by the feed's session token.

use std::time::{Duration, Instant};

use color_eyre::Result;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::catalog::{CatalogClient, Track};
use crate::config::Config;
use crate::favorites::{FavoritesClient, FavoritesSet};
use crate::feed::{self, Feed};
use crate::nav::{NavIntent, Navigator, SwipeAdapter, WheelAdapter};
use crate::player::{PlaybackSession, Player, PlayerEvent, Transport, BANDS};

/// Small seek step for the , and . transport keys.
const SEEK_STEP: Duration = Duration::from_secs(5);

/// Volume step for the + and - keys, on the 0.0-1.0 scale.
const VOLUME_STEP: f32 = 0.05;

/// Main application state.
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,

    /// Configuration
    pub config: Config,

    /// Catalog client
    catalog: CatalogClient,

    /// Favorites persistence client, if a service is configured
    favorites_client: Option<FavoritesClient>,

    /// Optimistic local favorites set
    pub favorites: FavoritesSet,

    /// The growing track sequence
    pub feed: Feed,

    /// Navigation state machine
    pub nav: Navigator,

    /// Wheel input adapter
    wheel: WheelAdapter,

    /// Swipe input adapter
    swipe: SwipeAdapter,

    /// Audio player handle
    pub player: Option<Player>,

    /// App-side mirror of the audio session
    pub session: PlaybackSession,

    /// Last visualizer snapshot, zeroed while not playing
    pub spectrum: [f32; BANDS],

    /// "Scroll to explore" hint, shown until the first navigation
    pub show_hint: bool,

    /// Help overlay visible
    pub show_help: bool,

    /// Error message to display
    pub error_message: Option<String>,

    /// Action sender for async operations
    pub action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config, action_tx: mpsc::UnboundedSender<Action>) -> Result<Self> {
        let timeout = Duration::from_secs(config.feed.request_timeout_secs);
        let catalog = CatalogClient::new(timeout)?;

        let favorites_client = match &config.favorites.base_url {
            Some(base_url) => Some(FavoritesClient::new(base_url, &config.user.id, timeout)?),
            None => None,
        };

        let nav = Navigator::new(
            Duration::from_millis(config.feed.cooldown_ms),
            config.feed.lookahead,
        );
        let wheel = WheelAdapter::new(config.feed.wheel_threshold);
        let swipe = SwipeAdapter::new(config.feed.swipe_threshold);
        let session = PlaybackSession::new(config.volume_level());

        Ok(Self {
            should_quit: false,
            config,
            catalog,
            favorites_client,
            favorites: FavoritesSet::new(),
            feed: Feed::new(),
            nav,
            wheel,
            swipe,
            player: None,
            session,
            spectrum: [0.0; BANDS],
            show_hint: true,
            show_help: false,
            error_message: None,
            action_tx,
        })
    }

    /// Initialize the application: audio player, favorites seed, first round.
    pub fn init(&mut self) -> Result<()> {
        match Player::new(self.config.volume_level()) {
            Ok(player) => self.player = Some(player),
            Err(e) => {
                tracing::error!("failed to initialize audio player: {}", e);
                self.error_message = Some(format!("Audio player error: {}", e));
            }
        }

        if let Some(client) = self.favorites_client.clone() {
            let tx = self.action_tx.clone();
            tokio::spawn(async move {
                match client.list().await {
                    Ok(tracks) => {
                        let _ = tx.send(Action::FavoritesLoaded(tracks));
                    }
                    Err(e) => tracing::warn!("failed to load favorites: {}", e),
                }
            });
        }

        self.feed.reset();
        self.spawn_round();
        Ok(())
    }

    /// The track at the current feed position.
    pub fn current_track(&self) -> Option<&Track> {
        self.feed.get(self.nav.index())
    }

    /// Whether the initial round is still loading.
    pub fn is_loading(&self) -> bool {
        self.feed.is_empty() && self.feed.in_flight()
    }

    /// Handle an action and update state.
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }

            Action::Tick => {
                // Drain player events first to avoid a double borrow.
                let events: Vec<PlayerEvent> = if let Some(player) = &mut self.player {
                    let mut events = Vec::new();
                    while let Some(event) = player.try_recv_event() {
                        events.push(event);
                    }
                    events
                } else {
                    Vec::new()
                };
                for event in events {
                    self.handle_player_event(event);
                }

                self.nav.tick(Instant::now());

                self.spectrum = match (&self.player, self.session.is_playing()) {
                    (Some(player), true) => player.spectrum_snapshot(),
                    _ => [0.0; BANDS],
                };
            }

            Action::Resize(_, _) => {
                // Layout is recomputed from the frame on every draw.
            }

            Action::Advance => self.navigate(NavIntent::Advance)?,
            Action::Retreat => self.navigate(NavIntent::Retreat)?,

            Action::Wheel(delta) => {
                if let Some(intent) = self.wheel.feed(delta) {
                    self.navigate(intent)?;
                }
            }

            Action::SwipePress(row) => {
                self.swipe.press(row);
            }

            Action::SwipeRelease(row) => {
                if let Some(intent) = self.swipe.release(row) {
                    self.navigate(intent)?;
                }
            }

            Action::PlayPause => {
                let transport = self.session.toggle();
                if let Some(player) = &self.player {
                    match transport {
                        Transport::Play => player.play()?,
                        Transport::Pause => player.pause()?,
                        Transport::None => {}
                    }
                }
            }

            Action::SeekForward => self.seek_relative(SEEK_STEP, true)?,
            Action::SeekBackward => self.seek_relative(SEEK_STEP, false)?,

            Action::SeekToFraction(fraction) => {
                let target = self.session.duration().mul_f64(fraction.clamp(0.0, 1.0));
                let clamped = self.session.seek(target);
                if let Some(player) = &self.player {
                    player.seek(clamped)?;
                }
            }

            Action::VolumeUp => self.set_volume(self.session.volume() + VOLUME_STEP)?,
            Action::VolumeDown => self.set_volume(self.session.volume() - VOLUME_STEP)?,

            Action::ToggleSave => self.toggle_save()?,

            Action::Restart => {
                tracing::info!("restarting discovery session");
                self.feed.reset();
                self.nav.reset();
                self.session.clear();
                self.spectrum = [0.0; BANDS];
                self.show_hint = true;
                if let Some(player) = &self.player {
                    player.stop()?;
                }
                self.spawn_round();
            }

            Action::RoundLoaded { session, tracks } => {
                let was_empty = self.feed.is_empty();
                self.feed
                    .complete_round(session, tracks, &mut rand::thread_rng());

                if was_empty && !self.feed.is_empty() {
                    // First load: feed becomes navigable and the first card's
                    // preview starts.
                    self.nav.ready();
                    self.sync_playback()?;
                }
                self.maybe_prefetch();
            }

            Action::FavoritesLoaded(tracks) => {
                self.favorites.seed(tracks.iter().map(|t| t.id));
                tracing::info!(count = self.favorites.len(), "favorites loaded");
            }

            Action::FavoritePersistFailed { id, saving } => {
                // Local set stays optimistic; only the notice is surfaced.
                let verb = if saving { "save" } else { "unsave" };
                self.error_message = Some(format!("Failed to {verb} track {id}"));
            }

            Action::ShowHelp => {
                self.show_help = true;
            }

            Action::HideHelp => {
                self.show_help = false;
            }

            Action::Error(msg) => {
                self.error_message = Some(msg);
            }

            Action::ClearError => {
                self.error_message = None;
            }

            Action::None => {}
        }

        Ok(())
    }

    /// Handle player events, reconciling the session mirror.
    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Playing => self.session.playing(),
            PlayerEvent::Paused => self.session.paused(),
            PlayerEvent::Progress { position, duration } => {
                self.session.set_progress(position, duration);
            }
            PlayerEvent::TrackEnded => {
                self.session.ended();
                self.spectrum = [0.0; BANDS];
            }
            PlayerEvent::Error(msg) => {
                // Non-fatal: navigation stays usable without sound.
                tracing::error!("playback error: {}", msg);
                self.error_message = Some(format!("Playback: {msg}"));
            }
        }
    }

    /// Apply a navigation intent; on an actual move, resync playback and
    /// check the prefetch window.
    fn navigate(&mut self, intent: NavIntent) -> Result<()> {
        if !self.feed.is_empty() {
            self.show_hint = false;
        }

        if self.nav.apply(intent, self.feed.len(), Instant::now()).is_some() {
            self.sync_playback()?;
        }
        self.maybe_prefetch();
        Ok(())
    }

    /// The one sequenced operation keeping audio in step with the position:
    /// pause the old source, load the new one, then attempt playback.
    fn sync_playback(&mut self) -> Result<()> {
        let Some(track) = self.current_track() else {
            return Ok(());
        };
        let url = track.preview_url.clone();
        let duration = Duration::from_millis(track.track_time_millis);

        if let Some(player) = &self.player {
            player.pause()?;
            player.load(url.clone(), Some(duration))?;
            player.play()?;
        }

        // Mirror stays Loaded until the thread confirms Playing.
        self.session.load(url, duration);
        Ok(())
    }

    /// Request another aggregation round when the position nears the tail.
    /// The feed's in-flight guard makes duplicate requests a no-op.
    fn maybe_prefetch(&mut self) {
        if self.nav.needs_more(self.feed.len()) {
            self.spawn_round();
        }
    }

    /// Kick an aggregation round onto the runtime, if none is in flight.
    fn spawn_round(&mut self) {
        let Some(plan) = self
            .feed
            .begin_round(&self.config.user.favorite_genres, &mut rand::thread_rng())
        else {
            return;
        };
        tracing::debug!(offset = plan.offset, genres = ?plan.genres, "starting round");

        let catalog = self.catalog.clone();
        let per_genre = self.config.feed.tracks_per_genre;
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let tracks = feed::run_round(&catalog, &plan, per_genre).await;
            let _ = tx.send(Action::RoundLoaded {
                session: plan.session,
                tracks,
            });
        });
    }

    /// Save/unsave the current track: mutate the local set immediately, then
    /// persist in the background. Failures surface as a notice without
    /// rolling the local set back.
    fn toggle_save(&mut self) -> Result<()> {
        let Some(track) = self.current_track().cloned() else {
            return Ok(());
        };

        let saving = !self.favorites.contains(track.id);
        if saving {
            self.favorites.insert(track.id);
        } else {
            self.favorites.remove(track.id);
        }

        if let Some(client) = self.favorites_client.clone() {
            let tx = self.action_tx.clone();
            tokio::spawn(async move {
                let result = if saving {
                    client.add(&track).await
                } else {
                    client.remove(track.id).await
                };
                if let Err(e) = result {
                    tracing::warn!("favorites persistence failed: {}", e);
                    let _ = tx.send(Action::FavoritePersistFailed {
                        id: track.id,
                        saving,
                    });
                }
            });
        }
        Ok(())
    }

    fn seek_relative(&mut self, step: Duration, forward: bool) -> Result<()> {
        let position = self.session.position();
        let target = if forward {
            position.saturating_add(step)
        } else {
            position.saturating_sub(step)
        };

        let clamped = self.session.seek(target);
        if let Some(player) = &self.player {
            player.seek(clamped)?;
        }
        Ok(())
    }

    fn set_volume(&mut self, level: f32) -> Result<()> {
        let clamped = self.session.set_volume(level);
        if let Some(player) = &self.player {
            player.set_volume(clamped)?;
        }
        Ok(())
    }
}
