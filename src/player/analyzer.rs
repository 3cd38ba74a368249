//! Frequency analysis tap over the decoded sample stream.
//!
//! `SpectrumTap` sits between the decoder and the sink, folding samples into
//! fixed windows and computing a bank of log-spaced band magnitudes via the
//! Goertzel algorithm. Magnitudes are exponentially smoothed and published
//! through atomics so the UI can take lock-free snapshots on every frame.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::Source;

/// Number of frequency bands in a snapshot.
pub const BANDS: usize = 16;

/// Samples per analysis window.
const WINDOW: usize = 1024;

/// Weight of the previous magnitude in the smoothed value.
const SMOOTHING: f32 = 0.3;

/// Analysis range endpoints in Hz; bands are log-spaced between them.
const FREQ_LO: f32 = 60.0;
const FREQ_HI: f32 = 12_000.0;

/// Shared magnitude snapshot, written by the audio thread.
#[derive(Debug)]
pub struct Spectrum {
    bands: [AtomicU32; BANDS],
}

impl Spectrum {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bands: std::array::from_fn(|_| AtomicU32::new(0)),
        })
    }

    /// Current band magnitudes, roughly in [0, 1].
    pub fn snapshot(&self) -> [f32; BANDS] {
        std::array::from_fn(|i| f32::from_bits(self.bands[i].load(Ordering::Relaxed)))
    }

    pub fn clear(&self) {
        for band in &self.bands {
            band.store(0, Ordering::Relaxed);
        }
    }

    fn publish(&self, magnitudes: &[f32; BANDS]) {
        for (band, magnitude) in self.bands.iter().zip(magnitudes) {
            let previous = f32::from_bits(band.load(Ordering::Relaxed));
            let smoothed = previous * SMOOTHING + magnitude * (1.0 - SMOOTHING);
            band.store(smoothed.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Center frequency of band `i`, log-spaced across the analysis range.
fn band_frequency(i: usize) -> f32 {
    let t = i as f32 / (BANDS - 1) as f32;
    FREQ_LO * (FREQ_HI / FREQ_LO).powf(t)
}

/// Goertzel power of `freq` over one window of mono samples.
fn goertzel(samples: &[f32], freq: f32, sample_rate: f32) -> f32 {
    let k = (freq * samples.len() as f32 / sample_rate).round();
    let omega = 2.0 * std::f32::consts::PI * k / samples.len() as f32;
    let coeff = 2.0 * omega.cos();

    let (mut s_prev, mut s_prev2) = (0.0f32, 0.0f32);
    for &sample in samples {
        let s = sample + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }

    let power = s_prev2 * s_prev2 + s_prev * s_prev - coeff * s_prev * s_prev2;
    (power.max(0.0) / (samples.len() * samples.len() / 4) as f32).sqrt()
}

/// Pass-through source that feeds the analyzer.
pub struct SpectrumTap<S> {
    inner: S,
    spectrum: Arc<Spectrum>,
    window: Vec<f32>,
    /// Per-frame accumulator for folding interleaved channels to mono.
    frame_sum: f32,
    frame_pos: u16,
}

impl<S> SpectrumTap<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, spectrum: Arc<Spectrum>) -> Self {
        Self {
            inner,
            spectrum,
            window: Vec::with_capacity(WINDOW),
            frame_sum: 0.0,
            frame_pos: 0,
        }
    }

    fn push_mono(&mut self, sample: f32, sample_rate: f32) {
        self.window.push(sample);
        if self.window.len() < WINDOW {
            return;
        }

        let magnitudes = std::array::from_fn(|i| {
            goertzel(&self.window, band_frequency(i), sample_rate)
        });
        self.spectrum.publish(&magnitudes);
        self.window.clear();
    }
}

impl<S> Iterator for SpectrumTap<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;

        let channels = self.inner.channels().max(1);
        self.frame_sum += sample;
        self.frame_pos += 1;
        if self.frame_pos >= channels {
            let mono = self.frame_sum / f32::from(channels);
            let rate = self.inner.sample_rate() as f32;
            self.frame_sum = 0.0;
            self.frame_pos = 0;
            self.push_mono(mono, rate);
        }

        Some(sample)
    }
}

impl<S> Source for SpectrumTap<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::source::SineWave;

    #[test]
    fn test_band_frequencies_ascend() {
        for i in 1..BANDS {
            assert!(band_frequency(i) > band_frequency(i - 1));
        }
        assert!((band_frequency(0) - FREQ_LO).abs() < 1.0);
        assert!((band_frequency(BANDS - 1) - FREQ_HI).abs() < 1.0);
    }

    #[test]
    fn test_goertzel_detects_tone() {
        let rate = 48_000.0;
        let freq = 1_000.0;
        let samples: Vec<f32> = (0..WINDOW)
            .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / rate).sin())
            .collect();

        let at_tone = goertzel(&samples, freq, rate);
        let off_tone = goertzel(&samples, 6_000.0, rate);
        assert!(at_tone > 0.5, "tone magnitude was {at_tone}");
        assert!(at_tone > off_tone * 10.0);
    }

    #[test]
    fn test_tap_passes_samples_through_and_publishes() {
        let spectrum = Spectrum::new();
        let source = SineWave::new(440.0).take_duration(Duration::from_millis(100));
        let tap = SpectrumTap::new(source, Arc::clone(&spectrum));

        let passed: Vec<f32> = tap.collect();
        assert!(passed.len() >= WINDOW, "enough samples to fill a window");

        let snapshot = spectrum.snapshot();
        assert!(snapshot.iter().any(|&m| m > 0.0));
    }

    #[test]
    fn test_clear_zeroes_snapshot() {
        let spectrum = Spectrum::new();
        spectrum.publish(&[0.5; BANDS]);
        assert!(spectrum.snapshot()[0] > 0.0);

        spectrum.clear();
        assert_eq!(spectrum.snapshot(), [0.0; BANDS]);
    }
}
