// Chunker - fixed-size tiling with label propagation
//
// Slices a normalized spectrogram into non-overlapping, sequentially
// placed tiles along the time axis. Trailing frames that do not fill a
// complete tile are discarded, never padded. Each tile inherits the
// parent recording's genre label verbatim; labels are never
// chunk-specific.

use crate::corpus::Spectrogram;

/// Outcome of chunking
///
/// A spectrogram shorter than one chunk produces zero chunks; its
/// recording is dropped from the chunked corpus. That is a recoverable
/// condition the caller must surface as a count, not a silent failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkReport {
    /// Chunks produced across all spectrograms seen
    pub chunks: usize,
    /// Spectrograms too short to produce any chunk
    pub skipped_inputs: usize,
    /// Trailing frames discarded by remainder-dropping
    pub dropped_frames: usize,
}

impl ChunkReport {
    pub fn merge(&mut self, other: ChunkReport) {
        self.chunks += other.chunks;
        self.skipped_inputs += other.skipped_inputs;
        self.dropped_frames += other.dropped_frames;
    }
}

/// Slice a spectrogram into `floor(T / frames_per_chunk)` tiles
///
/// # Arguments
/// * `spectrogram` - Normalized (bands x T) spectrogram
/// * `frames_per_chunk` - Tile width along the time axis
///
/// # Returns
/// The tiles in time order, plus a report covering this recording.
/// `T < frames_per_chunk` yields an empty vector and a skip count of 1.
pub fn chunk_spectrogram(
    spectrogram: &Spectrogram,
    frames_per_chunk: usize,
) -> (Vec<Spectrogram>, ChunkReport) {
    let frames = spectrogram.frames();
    let num_chunks = frames / frames_per_chunk;

    if num_chunks == 0 {
        let report = ChunkReport {
            chunks: 0,
            skipped_inputs: 1,
            dropped_frames: frames,
        };
        return (Vec::new(), report);
    }

    let chunks: Vec<Spectrogram> = (0..num_chunks)
        .map(|i| spectrogram.slice_frames(i * frames_per_chunk..(i + 1) * frames_per_chunk))
        .collect();

    let report = ChunkReport {
        chunks: num_chunks,
        skipped_inputs: 0,
        dropped_frames: frames - num_chunks * frames_per_chunk,
    };

    (chunks, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spectrogram with frame t filled with the value t
    fn ramp_spectrogram(bands: usize, frames: usize) -> Spectrogram {
        let mut spec = Spectrogram::with_capacity(bands, frames);
        for t in 0..frames {
            spec.push_frame(&vec![t as f32; bands]);
        }
        spec
    }

    #[test]
    fn test_chunk_count_is_floor_of_frames_over_width() {
        for (frames, expected) in [(0, 0), (79, 0), (80, 1), (159, 1), (160, 2), (800, 10)] {
            let spec = ramp_spectrogram(40, frames);
            let (chunks, _) = chunk_spectrogram(&spec, 80);
            assert_eq!(
                chunks.len(),
                expected,
                "floor({frames}/80) should be {expected}"
            );
        }
    }

    #[test]
    fn test_chunks_reproduce_input_frames_exactly() {
        let spec = ramp_spectrogram(40, 170);
        let (chunks, report) = chunk_spectrogram(&spec, 80);
        assert_eq!(chunks.len(), 2);
        assert_eq!(report.dropped_frames, 10);

        // Concatenating all chunk frames must reproduce the first 160
        // input frames exactly
        let mut t = 0;
        for chunk in &chunks {
            assert_eq!(chunk.bands(), 40);
            assert_eq!(chunk.frames(), 80);
            for k in 0..chunk.frames() {
                assert_eq!(
                    chunk.frame(k),
                    spec.frame(t),
                    "chunk frame {k} must equal input frame {t}"
                );
                t += 1;
            }
        }
        assert_eq!(t, 160);
    }

    #[test]
    fn test_short_recording_is_skipped_not_failed() {
        let spec = ramp_spectrogram(40, 70);
        let (chunks, report) = chunk_spectrogram(&spec, 80);
        assert!(chunks.is_empty());
        assert_eq!(report.skipped_inputs, 1);
        assert_eq!(report.dropped_frames, 70);
    }

    #[test]
    fn test_report_merge_accumulates() {
        let mut total = ChunkReport::default();
        let (_, a) = chunk_spectrogram(&ramp_spectrogram(4, 170), 80);
        let (_, b) = chunk_spectrogram(&ramp_spectrogram(4, 70), 80);
        total.merge(a);
        total.merge(b);
        assert_eq!(total.chunks, 2);
        assert_eq!(total.skipped_inputs, 1);
        assert_eq!(total.dropped_frames, 80);
    }
}
