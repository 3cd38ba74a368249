//! Audio playback backend using rodio.
//!
//! The backend runs on a dedicated thread driven by a command channel, so the
//! UI loop never blocks on the device or on preview downloads. The decode
//! graph (output stream + sink + analyzer tap) is constructed lazily on the
//! first Play command, never at startup or on Load: opening the device is
//! deferred until a play is actually wanted, and a failed open is swallowed
//! (the session stays paused and the next play gesture retries).
//!
//! Commands are processed strictly in order. A Load replaces the pending
//! source before any later Play runs, so after Load(A), Load(B), Play only
//! B's audio can reach the sink.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tokio::sync::mpsc;

use super::analyzer::{Spectrum, SpectrumTap, BANDS};

/// Loop tick; progress telemetry advances by this much while playing.
const TICK: Duration = Duration::from_millis(100);

/// Bound on a single preview download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Messages sent to the audio thread.
#[derive(Debug)]
pub enum PlayerCommand {
    /// Swap the source: pauses current playback, rewinds, does not play.
    Load {
        url: String,
        duration: Option<Duration>,
    },
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f32),
    Stop,
}

/// Messages sent from the audio thread.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Playing,
    Paused,
    Progress {
        position: Duration,
        duration: Duration,
    },
    TrackEnded,
    /// Decode/hardware problem; playback stays usable for navigation.
    Error(String),
}

/// Telemetry shared with the app, updated by the audio thread.
struct PlayerShared {
    is_playing: AtomicBool,
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
    volume_bits: AtomicU32,
}

/// Handle to the audio thread.
pub struct Player {
    command_tx: mpsc::UnboundedSender<PlayerCommand>,
    event_rx: mpsc::UnboundedReceiver<PlayerEvent>,
    shared: Arc<PlayerShared>,
    spectrum: Arc<Spectrum>,
}

impl Player {
    pub fn new(initial_volume: f32) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(PlayerShared {
            is_playing: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
            volume_bits: AtomicU32::new(initial_volume.clamp(0.0, 1.0).to_bits()),
        });
        let spectrum = Spectrum::new();

        let thread_shared = Arc::clone(&shared);
        let thread_spectrum = Arc::clone(&spectrum);
        std::thread::spawn(move || {
            if let Err(e) = run_audio_thread(command_rx, event_tx, thread_shared, thread_spectrum) {
                tracing::error!("audio thread error: {}", e);
            }
        });

        Ok(Self {
            command_tx,
            event_rx,
            shared,
            spectrum,
        })
    }

    pub fn load(&self, url: String, duration: Option<Duration>) -> Result<()> {
        self.command_tx.send(PlayerCommand::Load { url, duration })?;
        Ok(())
    }

    pub fn play(&self) -> Result<()> {
        self.command_tx.send(PlayerCommand::Play)?;
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.command_tx.send(PlayerCommand::Pause)?;
        Ok(())
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.command_tx.send(PlayerCommand::Seek(position))?;
        Ok(())
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        self.command_tx.send(PlayerCommand::SetVolume(volume))?;
        self.shared
            .volume_bits
            .store(volume.to_bits(), Ordering::SeqCst);
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.command_tx.send(PlayerCommand::Stop)?;
        Ok(())
    }

    /// Try to receive a player event (non-blocking).
    pub fn try_recv_event(&mut self) -> Option<PlayerEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn is_playing(&self) -> bool {
        self.shared.is_playing.load(Ordering::SeqCst)
    }

    /// Live frequency-magnitude snapshot; only meaningful while playing.
    pub fn spectrum_snapshot(&self) -> [f32; BANDS] {
        self.spectrum.snapshot()
    }
}

/// The lazily-built decode graph. Constructed at most once per session; the
/// sink is rebuilt on source swaps and seeks, the stream is reused.
struct DecodeGraph {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Sink,
}

impl DecodeGraph {
    fn open() -> Result<Self> {
        let (_stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        Ok(Self {
            _stream,
            handle,
            sink,
        })
    }

    fn fresh_sink(&mut self) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::try_new(&self.handle)?;
        Ok(())
    }
}

/// The source most recently loaded. Bytes are fetched on the first play
/// attempt and cached for seeks.
struct PendingSource {
    url: String,
    duration: Option<Duration>,
    data: Option<Vec<u8>>,
    /// Whether the data has been appended to the current sink.
    in_sink: bool,
}

fn run_audio_thread(
    mut command_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    event_tx: mpsc::UnboundedSender<PlayerEvent>,
    shared: Arc<PlayerShared>,
    spectrum: Arc<Spectrum>,
) -> Result<()> {
    let http = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;

    let mut graph: Option<DecodeGraph> = None;
    let mut pending: Option<PendingSource> = None;

    loop {
        match command_rx.try_recv() {
            Ok(command) => {
                if let Err(e) = handle_command(
                    command,
                    &http,
                    &mut graph,
                    &mut pending,
                    &event_tx,
                    &shared,
                    &spectrum,
                ) {
                    tracing::error!("playback error: {}", e);
                    let _ = event_tx.send(PlayerEvent::Error(e.to_string()));
                    shared.is_playing.store(false, Ordering::SeqCst);
                    let _ = event_tx.send(PlayerEvent::Paused);
                }
            }
            Err(mpsc::error::TryRecvError::Empty) => {}
            Err(mpsc::error::TryRecvError::Disconnected) => break,
        }

        // Natural end: sink drained while we thought we were playing.
        let drained = graph.as_ref().is_some_and(|g| g.sink.empty());
        if drained && shared.is_playing.load(Ordering::SeqCst) {
            shared.is_playing.store(false, Ordering::SeqCst);
            shared.position_ms.store(0, Ordering::SeqCst);
            spectrum.clear();
            if let Some(p) = pending.as_mut() {
                p.in_sink = false;
            }
            let _ = event_tx.send(PlayerEvent::TrackEnded);
        }

        if shared.is_playing.load(Ordering::SeqCst) {
            let duration = shared.duration_ms.load(Ordering::SeqCst);
            let position = shared
                .position_ms
                .load(Ordering::SeqCst)
                .saturating_add(TICK.as_millis() as u64)
                .min(duration.max(TICK.as_millis() as u64));
            shared.position_ms.store(position, Ordering::SeqCst);

            let _ = event_tx.send(PlayerEvent::Progress {
                position: Duration::from_millis(position),
                duration: Duration::from_millis(duration),
            });
        }

        std::thread::sleep(TICK);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_command(
    command: PlayerCommand,
    http: &reqwest::blocking::Client,
    graph: &mut Option<DecodeGraph>,
    pending: &mut Option<PendingSource>,
    event_tx: &mpsc::UnboundedSender<PlayerEvent>,
    shared: &PlayerShared,
    spectrum: &Arc<Spectrum>,
) -> Result<()> {
    match command {
        PlayerCommand::Load { url, duration } => {
            // Pause the old source before anything about the new one starts.
            if let Some(g) = graph.as_mut() {
                g.fresh_sink()?;
            }
            shared.is_playing.store(false, Ordering::SeqCst);
            shared.position_ms.store(0, Ordering::SeqCst);
            shared.duration_ms.store(
                duration.map(|d| d.as_millis() as u64).unwrap_or(0),
                Ordering::SeqCst,
            );
            spectrum.clear();
            *pending = Some(PendingSource {
                url,
                duration,
                data: None,
                in_sink: false,
            });
        }

        PlayerCommand::Play => {
            let Some(source) = pending.as_mut() else {
                return Ok(());
            };

            if graph.is_none() {
                match DecodeGraph::open() {
                    Ok(g) => *graph = Some(g),
                    Err(e) => {
                        // No output device yet: the desktop analog of an
                        // autoplay rejection. Stay paused, retry on the next
                        // play gesture.
                        tracing::debug!("audio output unavailable, staying paused: {}", e);
                        let _ = event_tx.send(PlayerEvent::Paused);
                        return Ok(());
                    }
                }
            }
            let g = graph.as_mut().ok_or_else(|| eyre!("decode graph missing"))?;

            if source.in_sink {
                // Same source, paused mid-track: just resume.
                g.sink.play();
            } else {
                if source.data.is_none() {
                    let bytes = http.get(&source.url).send()?.error_for_status()?.bytes()?;
                    source.data = Some(bytes.to_vec());
                }
                start_source(g, source, shared, spectrum, Duration::ZERO)?;
                shared.position_ms.store(0, Ordering::SeqCst);
            }

            shared.is_playing.store(true, Ordering::SeqCst);
            let _ = event_tx.send(PlayerEvent::Playing);
        }

        PlayerCommand::Pause => {
            if let Some(g) = graph.as_ref() {
                g.sink.pause();
            }
            shared.is_playing.store(false, Ordering::SeqCst);
            let _ = event_tx.send(PlayerEvent::Paused);
        }

        PlayerCommand::Seek(position) => {
            let Some(source) = pending.as_mut() else {
                return Ok(());
            };
            if source.data.is_none() || graph.is_none() {
                // Nothing decoded yet; remember the hint only.
                shared
                    .position_ms
                    .store(position.as_millis() as u64, Ordering::SeqCst);
                return Ok(());
            }

            let duration = Duration::from_millis(shared.duration_ms.load(Ordering::SeqCst));
            let target = if duration.is_zero() {
                position
            } else {
                position.min(duration)
            };

            let was_playing = shared.is_playing.load(Ordering::SeqCst);
            let g = graph.as_mut().ok_or_else(|| eyre!("decode graph missing"))?;
            start_source(g, source, shared, spectrum, target)?;
            if !was_playing {
                g.sink.pause();
            }
            shared
                .position_ms
                .store(target.as_millis() as u64, Ordering::SeqCst);
        }

        PlayerCommand::SetVolume(volume) => {
            shared.volume_bits.store(volume.to_bits(), Ordering::SeqCst);
            if let Some(g) = graph.as_ref() {
                g.sink.set_volume(volume);
            }
        }

        PlayerCommand::Stop => {
            if let Some(g) = graph.as_mut() {
                g.fresh_sink()?;
            }
            *pending = None;
            shared.is_playing.store(false, Ordering::SeqCst);
            shared.position_ms.store(0, Ordering::SeqCst);
            shared.duration_ms.store(0, Ordering::SeqCst);
            spectrum.clear();
        }
    }

    Ok(())
}

/// Decode the cached bytes into a fresh sink, attach the analyzer tap, and
/// start playing, optionally skipping into the source.
fn start_source(
    graph: &mut DecodeGraph,
    source: &mut PendingSource,
    shared: &PlayerShared,
    spectrum: &Arc<Spectrum>,
    skip: Duration,
) -> Result<()> {
    let data = source
        .data
        .as_ref()
        .ok_or_else(|| eyre!("no audio data for {}", source.url))?;

    let decoder = Decoder::new(Cursor::new(data.clone()))?;
    if let Some(total) = decoder.total_duration().or(source.duration) {
        shared
            .duration_ms
            .store(total.as_millis() as u64, Ordering::SeqCst);
    }

    let samples = decoder.convert_samples::<f32>();

    // Skip before tapping so a seek does not flood the analyzer.
    graph.fresh_sink()?;
    if skip > Duration::ZERO {
        let tap = SpectrumTap::new(samples.skip_duration(skip), Arc::clone(spectrum));
        graph.sink.append(tap);
    } else {
        let tap = SpectrumTap::new(samples, Arc::clone(spectrum));
        graph.sink.append(tap);
    }
    graph
        .sink
        .set_volume(f32::from_bits(shared.volume_bits.load(Ordering::SeqCst)));
    graph.sink.play();
    source.in_sink = true;

    Ok(())
}
