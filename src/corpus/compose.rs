// Channel composer - aligned multi-channel examples
//
// Pairs up corresponding chunks (or whole spectrograms) across channel
// views so channel i's tensor k and channel j's tensor k describe the
// same time segment of the same waveform. Channel-specific processing
// truncates differently (tempo loses a frame, bass loses two), so counts
// are reconciled by truncating every channel to the minimum; a channel
// that produced nothing while another produced data is a mismatch error.

use crate::corpus::chunk::{chunk_spectrogram, ChunkReport};
use crate::corpus::{GenreLabel, RecordingId, Spectrogram};
use crate::error::PipelineError;

/// One training example: aligned per-channel tensors, one label, one
/// source recording
#[derive(Debug, Clone)]
pub struct MultiChannelExample {
    pub channels: Vec<Spectrogram>,
    pub label: GenreLabel,
    pub recording: RecordingId,
}

/// Compose chunked examples for the CNN pipeline
///
/// Chunks every channel view independently, then pairs chunks index-wise.
/// Diverging chunk counts are truncated to the minimum; if some channels
/// chunk to zero while others do not, the recording is misaligned beyond
/// repair and a `ChannelMismatchError` is raised.
///
/// # Arguments
/// * `views` - One normalized spectrogram per channel, same recording
/// * `label` - The recording's genre label, propagated to every example
/// * `recording` - Source recording id, kept as a back-reference for voting
/// * `frames_per_chunk` - Tile width along the time axis
///
/// # Returns
/// The aligned examples (possibly empty for a short recording) and the
/// chunk report for this recording.
pub fn compose_chunked(
    views: &[Spectrogram],
    label: GenreLabel,
    recording: &RecordingId,
    frames_per_chunk: usize,
) -> Result<(Vec<MultiChannelExample>, ChunkReport), PipelineError> {
    debug_assert!(!views.is_empty());

    let mut per_channel: Vec<Vec<Spectrogram>> = Vec::with_capacity(views.len());
    let mut report = ChunkReport::default();
    for view in views {
        let (chunks, view_report) = chunk_spectrogram(view, frames_per_chunk);
        per_channel.push(chunks);
        report.merge(view_report);
    }

    let counts: Vec<usize> = per_channel.iter().map(Vec::len).collect();
    let min_count = *counts.iter().min().unwrap_or(&0);
    let max_count = *counts.iter().max().unwrap_or(&0);

    if min_count == 0 {
        if max_count > 0 {
            // One channel chunked to nothing while another has data:
            // index-wise pairing is impossible
            return Err(PipelineError::ChannelMismatch {
                recording: recording.to_string(),
                counts,
            });
        }
        // Recording too short on every channel; skip, counted in the report
        return Ok((Vec::new(), report));
    }

    if min_count != max_count {
        log::debug!(
            "[Composer] Truncating {} to {} chunks per channel (counts {:?})",
            recording,
            min_count,
            counts
        );
    }

    let mut examples = Vec::with_capacity(min_count);
    for k in 0..min_count {
        let channels: Vec<Spectrogram> = per_channel
            .iter()
            .map(|chunks| chunks[k].clone())
            .collect();
        examples.push(MultiChannelExample {
            channels,
            label,
            recording: recording.clone(),
        });
    }

    Ok((examples, report))
}

/// Compose one whole-spectrogram example for the sequence pipeline
///
/// No chunking: each channel contributes its full spectrogram, truncated
/// along time to the minimum frame count so the channels stay aligned.
/// A channel with zero frames while another has data is a mismatch.
pub fn compose_sequence(
    views: &[Spectrogram],
    label: GenreLabel,
    recording: &RecordingId,
) -> Result<MultiChannelExample, PipelineError> {
    debug_assert!(!views.is_empty());

    let counts: Vec<usize> = views.iter().map(Spectrogram::frames).collect();
    let min_frames = *counts.iter().min().unwrap_or(&0);
    let max_frames = *counts.iter().max().unwrap_or(&0);

    if min_frames == 0 && max_frames > 0 {
        return Err(PipelineError::ChannelMismatch {
            recording: recording.to_string(),
            counts,
        });
    }

    let channels: Vec<Spectrogram> = views
        .iter()
        .map(|view| view.slice_frames(0..min_frames))
        .collect();

    Ok(MultiChannelExample {
        channels,
        label,
        recording: recording.clone(),
    })
}
