// Channel kinds - independently extracted feature views of a recording
//
// Each channel feeds a dedicated branch of the network. The views differ
// in analysis window or derived representation:
// - Pitch: 2048-sample window, full-band mel spectrogram
// - Tempo: per-band onset strength derived from the pitch view
// - Bass:  4096-sample window, mel bands restricted to 0-500 Hz
//
// Tempo loses one frame to its temporal difference and bass loses two to
// its longer window; the channel composer reconciles the counts.

use serde::{Deserialize, Serialize};

use crate::corpus::Spectrogram;

/// Upper edge of the bass channel filterbank in Hz
pub const BASS_FMAX_HZ: f32 = 500.0;

/// One feature view of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Full-band mel spectrogram
    Pitch,
    /// Per-band onset strength (rectified temporal difference of pitch)
    Tempo,
    /// Low-frequency mel spectrogram with a longer analysis window
    Bass,
}

impl ChannelKind {
    /// Analysis window length in samples for the underlying STFT
    pub fn window_size(&self) -> usize {
        match self {
            ChannelKind::Pitch | ChannelKind::Tempo => 2048,
            ChannelKind::Bass => 4096,
        }
    }

    /// Filterbank frequency range in Hz for a given sample rate
    pub fn band_range(&self, sample_rate: u32) -> (f32, f32) {
        match self {
            ChannelKind::Pitch | ChannelKind::Tempo => (0.0, sample_rate as f32 / 2.0),
            ChannelKind::Bass => (0.0, BASS_FMAX_HZ),
        }
    }

    /// The channel sets supported by the network branches
    ///
    /// 2 channels = pitch + tempo; 3 adds bass.
    pub fn selection(channel_count: usize) -> Option<&'static [ChannelKind]> {
        match channel_count {
            2 => Some(&[ChannelKind::Pitch, ChannelKind::Tempo]),
            3 => Some(&[ChannelKind::Pitch, ChannelKind::Tempo, ChannelKind::Bass]),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChannelKind::Pitch => "pitch",
            ChannelKind::Tempo => "tempo",
            ChannelKind::Bass => "bass",
        };
        write!(f, "{}", name)
    }
}

/// Per-band onset strength: half-wave-rectified temporal first difference
///
/// For each band b and frame t > 0: `max(0, S[t][b] - S[t-1][b])`. The
/// output has one fewer frame than the input. An input with fewer than two
/// frames yields an empty spectrogram.
pub fn onset_strength(spectrogram: &Spectrogram) -> Spectrogram {
    let bands = spectrogram.bands();
    let frames = spectrogram.frames();
    let mut out = Spectrogram::with_capacity(bands, frames.saturating_sub(1));

    for t in 1..frames {
        let prev = spectrogram.frame(t - 1);
        let cur = spectrogram.frame(t);
        let diff: Vec<f32> = cur
            .iter()
            .zip(prev.iter())
            .map(|(&c, &p)| (c - p).max(0.0))
            .collect();
        out.push_frame(&diff);
    }

    out
}
