// SpectralExtractor - waveform to log-mel spectrogram pipeline
//
// This module coordinates the spectral feature extraction used by every
// channel view: STFT with a Blackman-Harris window, magnitude-only
// spectra, 40-band mel warping, log-domain compression.
//
// Module organization:
// - stft: windowed FFT magnitude frames
// - mel: triangular mel filterbank and log compression
// - channels: channel kinds (pitch/tempo/bass) and derived views
// - mod.rs: coordinator (SpectralExtractor)

pub mod channels;
mod mel;
mod stft;

pub use channels::{onset_strength, ChannelKind, BASS_FMAX_HZ};
pub use mel::{log_compress, MelFilterbank};
pub use stft::StftProcessor;

use crate::audio::Waveform;
use crate::config::FeatureConfig;
use crate::corpus::Spectrogram;
use crate::error::FormatError;

/// SpectralExtractor turns waveforms into log-mel spectrograms
///
/// Holds a precomputed STFT plan and mel filterbank per analysis window
/// (2048 for pitch/tempo, 4096 for bass). Extraction is deterministic and
/// side-effect-free: the same waveform always yields the same spectrogram.
pub struct SpectralExtractor {
    sample_rate: u32,
    short: ChannelStage,
    long: ChannelStage,
}

/// One STFT + filterbank pairing for a fixed window size
struct ChannelStage {
    stft: StftProcessor,
    filterbank: MelFilterbank,
}

impl ChannelStage {
    fn new(config: &FeatureConfig, window_size: usize, fmin: f32, fmax: f32) -> Self {
        let stft = StftProcessor::new(window_size, config.hop_size);
        let filterbank = MelFilterbank::new(
            config.mel_bands,
            stft.bins(),
            window_size,
            config.sample_rate,
            fmin,
            fmax,
        );
        Self { stft, filterbank }
    }

    fn run(&self, samples: &[f32]) -> Spectrogram {
        let frames = self.stft.magnitude_frames(samples);
        let mut spectrogram =
            Spectrogram::with_capacity(self.filterbank.bands(), frames.len());
        for spectrum in &frames {
            let mut bands = self.filterbank.apply(spectrum);
            log_compress(&mut bands);
            spectrogram.push_frame(&bands);
        }
        spectrogram
    }
}

impl SpectralExtractor {
    /// Create an extractor for the configured sample rate and band count
    pub fn new(config: &FeatureConfig) -> Self {
        let (pitch_fmin, pitch_fmax) = ChannelKind::Pitch.band_range(config.sample_rate);
        let (bass_fmin, bass_fmax) = ChannelKind::Bass.band_range(config.sample_rate);

        Self {
            sample_rate: config.sample_rate,
            short: ChannelStage::new(
                config,
                ChannelKind::Pitch.window_size(),
                pitch_fmin,
                pitch_fmax,
            ),
            long: ChannelStage::new(
                config,
                ChannelKind::Bass.window_size(),
                bass_fmin,
                bass_fmax,
            ),
        }
    }

    /// Extract one channel view of a waveform
    ///
    /// # Arguments
    /// * `waveform` - Mono PCM at the configured sample rate
    /// * `kind` - Channel view to produce
    ///
    /// # Returns
    /// * `Ok(Spectrogram)` - Log-mel spectrogram (or onset strength for tempo)
    /// * `Err(FormatError)` - Waveform sample rate mismatches the extractor
    pub fn extract(
        &self,
        waveform: &Waveform,
        kind: ChannelKind,
    ) -> Result<Spectrogram, FormatError> {
        self.validate(waveform)?;
        Ok(self.extract_unchecked(waveform, kind))
    }

    /// Extract several channel views at once
    ///
    /// The tempo view is derived from the pitch view, so requesting both
    /// computes the underlying STFT only once.
    pub fn extract_channels(
        &self,
        waveform: &Waveform,
        kinds: &[ChannelKind],
    ) -> Result<Vec<Spectrogram>, FormatError> {
        self.validate(waveform)?;

        let mut pitch: Option<Spectrogram> = None;
        let mut views = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let view = match kind {
                ChannelKind::Pitch => pitch
                    .get_or_insert_with(|| self.short.run(&waveform.samples))
                    .clone(),
                ChannelKind::Tempo => {
                    let base =
                        pitch.get_or_insert_with(|| self.short.run(&waveform.samples));
                    onset_strength(base)
                }
                ChannelKind::Bass => self.long.run(&waveform.samples),
            };
            views.push(view);
        }

        Ok(views)
    }

    fn extract_unchecked(&self, waveform: &Waveform, kind: ChannelKind) -> Spectrogram {
        match kind {
            ChannelKind::Pitch => self.short.run(&waveform.samples),
            ChannelKind::Tempo => onset_strength(&self.short.run(&waveform.samples)),
            ChannelKind::Bass => self.long.run(&waveform.samples),
        }
    }

    fn validate(&self, waveform: &Waveform) -> Result<(), FormatError> {
        if waveform.sample_rate != self.sample_rate {
            return Err(FormatError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: waveform.sample_rate,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{seeded_noise, sine_wave};

    fn extractor() -> SpectralExtractor {
        SpectralExtractor::new(&FeatureConfig::default())
    }

    fn waveform(samples: Vec<f32>) -> Waveform {
        Waveform::new(samples, 44_100)
    }

    #[test]
    fn test_pitch_spectrogram_shape() {
        let wave = waveform(sine_wave(44_100, 440.0, 2048 + 9 * 1024));
        let spec = extractor().extract(&wave, ChannelKind::Pitch).unwrap();
        assert_eq!(spec.bands(), 40);
        assert_eq!(spec.frames(), 10);
    }

    #[test]
    fn test_tempo_has_one_fewer_frame_than_pitch() {
        let wave = waveform(seeded_noise(3, 2048 + 9 * 1024));
        let ex = extractor();
        let pitch = ex.extract(&wave, ChannelKind::Pitch).unwrap();
        let tempo = ex.extract(&wave, ChannelKind::Tempo).unwrap();
        assert_eq!(tempo.frames(), pitch.frames() - 1);
        assert_eq!(tempo.bands(), pitch.bands());
    }

    #[test]
    fn test_bass_has_fewer_frames_from_longer_window() {
        let len = 4096 + 9 * 1024;
        let wave = waveform(sine_wave(44_100, 100.0, len));
        let ex = extractor();
        let pitch = ex.extract(&wave, ChannelKind::Pitch).unwrap();
        let bass = ex.extract(&wave, ChannelKind::Bass).unwrap();
        // Same hop, longer window: (len-4096)/1024+1 vs (len-2048)/1024+1
        assert_eq!(pitch.frames(), bass.frames() + 2);
    }

    #[test]
    fn test_bass_channel_ignores_high_frequencies() {
        let len = 4096 * 4;
        let ex = extractor();
        let low = ex
            .extract(&waveform(sine_wave(44_100, 80.0, len)), ChannelKind::Bass)
            .unwrap();
        let high = ex
            .extract(&waveform(sine_wave(44_100, 8000.0, len)), ChannelKind::Bass)
            .unwrap();

        let low_energy: f32 = low.values().iter().sum();
        let high_energy: f32 = high.values().iter().sum();
        assert!(
            low_energy > high_energy * 3.0,
            "bass channel should respond to 80 Hz far more than 8 kHz \
             (low={low_energy}, high={high_energy})"
        );
    }

    #[test]
    fn test_sample_rate_mismatch_is_rejected() {
        let wave = Waveform::new(sine_wave(48_000, 440.0, 8192), 48_000);
        let err = extractor().extract(&wave, ChannelKind::Pitch).unwrap_err();
        match err {
            FormatError::SampleRateMismatch { expected, actual } => {
                assert_eq!(expected, 44_100);
                assert_eq!(actual, 48_000);
            }
            other => panic!("Expected SampleRateMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_channels_matches_single_extraction() {
        let wave = waveform(seeded_noise(11, 2048 + 5 * 1024));
        let ex = extractor();
        let combined = ex
            .extract_channels(&wave, &[ChannelKind::Pitch, ChannelKind::Tempo])
            .unwrap();
        let pitch = ex.extract(&wave, ChannelKind::Pitch).unwrap();
        let tempo = ex.extract(&wave, ChannelKind::Tempo).unwrap();
        assert_eq!(combined[0], pitch);
        assert_eq!(combined[1], tempo);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let wave = waveform(seeded_noise(21, 2048 * 4));
        let ex = extractor();
        let a = ex.extract(&wave, ChannelKind::Pitch).unwrap();
        let b = ex.extract(&wave, ChannelKind::Pitch).unwrap();
        assert_eq!(a, b, "same waveform must always yield the same spectrogram");
    }
}
