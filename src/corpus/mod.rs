// Corpus data model - spectrograms, labels and recording identity
//
// The feature pipeline works in terms of these types: a Spectrogram is a
// magnitude-only (bands x frames) grid, a RecordingId names one source
// recording across chunking and vote aggregation, and a LabelSet is the
// closed set of genre classes discovered from the dataset layout.

pub mod chunk;
pub mod compose;
pub mod normalize;

pub use chunk::{chunk_spectrogram, ChunkReport};
pub use compose::{compose_chunked, compose_sequence, MultiChannelExample};
pub use normalize::CorpusStats;

use serde::{Deserialize, Serialize};

/// Identifier of one source recording
///
/// Chunks carry this as a back-reference for vote aggregation; splits are
/// formed over these identifiers so all chunks of a recording stay in one
/// split.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordingId(pub String);

impl RecordingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Genre class index into a [`LabelSet`]
///
/// Assigned once per source recording by the dataset provider; immutable
/// ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenreLabel(pub usize);

impl GenreLabel {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The closed set of genre classes, ordered by class index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Build a label set from genre names, sorted for a stable class order
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class index for a genre name, if it belongs to the set
    pub fn label_of(&self, name: &str) -> Option<GenreLabel> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(GenreLabel)
    }

    /// Genre name for a class index
    pub fn name_of(&self, label: GenreLabel) -> Option<&str> {
        self.names.get(label.0).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A magnitude spectrogram: (bands x frames) grid, frame-major storage
///
/// Carries magnitudes only; phase is discarded at extraction and never
/// re-enters the pipeline. Chunks are spectrograms of fixed shape, so the
/// same type flows through chunking and composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    bands: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    /// Build from frame-major data; `data.len()` must be a multiple of `bands`
    pub fn from_frames(bands: usize, data: Vec<f32>) -> Self {
        debug_assert!(bands > 0);
        debug_assert_eq!(data.len() % bands, 0);
        Self { bands, data }
    }

    /// An empty spectrogram with capacity for `frames` frames
    pub fn with_capacity(bands: usize, frames: usize) -> Self {
        Self {
            bands,
            data: Vec::with_capacity(bands * frames),
        }
    }

    /// Append one time frame of `bands` values
    pub fn push_frame(&mut self, frame: &[f32]) {
        debug_assert_eq!(frame.len(), self.bands);
        self.data.extend_from_slice(frame);
    }

    /// Number of frequency bands
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Number of time frames
    pub fn frames(&self) -> usize {
        self.data.len() / self.bands
    }

    /// One time frame as a band-indexed slice
    pub fn frame(&self, t: usize) -> &[f32] {
        &self.data[t * self.bands..(t + 1) * self.bands]
    }

    /// All values, frame-major
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// All values, mutable (used by in-place normalization)
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Copy of the frames in `range`, as a new spectrogram
    pub fn slice_frames(&self, range: std::ops::Range<usize>) -> Spectrogram {
        let start = range.start * self.bands;
        let end = range.end * self.bands;
        Spectrogram {
            bands: self.bands,
            data: self.data[start..end].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_set_is_sorted_and_stable() {
        let labels = LabelSet::new(vec![
            "rock".to_string(),
            "blues".to_string(),
            "jazz".to_string(),
            "blues".to_string(),
        ]);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label_of("blues"), Some(GenreLabel(0)));
        assert_eq!(labels.label_of("jazz"), Some(GenreLabel(1)));
        assert_eq!(labels.label_of("rock"), Some(GenreLabel(2)));
        assert_eq!(labels.name_of(GenreLabel(2)), Some("rock"));
        assert_eq!(labels.label_of("polka"), None);
    }

    #[test]
    fn test_spectrogram_frame_access() {
        let mut spec = Spectrogram::with_capacity(2, 3);
        spec.push_frame(&[1.0, 2.0]);
        spec.push_frame(&[3.0, 4.0]);
        spec.push_frame(&[5.0, 6.0]);

        assert_eq!(spec.bands(), 2);
        assert_eq!(spec.frames(), 3);
        assert_eq!(spec.frame(1), &[3.0, 4.0]);

        let tail = spec.slice_frames(1..3);
        assert_eq!(tail.frames(), 2);
        assert_eq!(tail.frame(0), &[3.0, 4.0]);
        assert_eq!(tail.frame(1), &[5.0, 6.0]);
    }
}
