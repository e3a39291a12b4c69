// Vote aggregation - chunk predictions to song-level decisions
//
// Each chunk-level probability vector is reduced to one predicted class
// (argmax), votes are counted per class, and the class with the most
// votes becomes the song-level decision. Ties, both inside a single
// argmax and between vote counts, resolve to the lowest class index;
// the rule is deterministic and documented in DESIGN.md.

use std::collections::BTreeMap;

use crate::corpus::RecordingId;

/// Predicted class of one probability vector: argmax, lowest index wins ties
pub fn predicted_class(probabilities: &[f32]) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (class, &p) in probabilities.iter().enumerate() {
        if p > best_value {
            best = class;
            best_value = p;
        }
    }
    best
}

/// Majority vote over all chunk predictions of one recording
///
/// # Arguments
/// * `chunk_predictions` - One probability vector per chunk
///
/// # Returns
/// The class with the most chunk votes; on a tied count, the lowest
/// class index among the tied classes. `None` if there are no chunks.
pub fn aggregate_votes(chunk_predictions: &[Vec<f32>]) -> Option<usize> {
    if chunk_predictions.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for prediction in chunk_predictions {
        *counts.entry(predicted_class(prediction)).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending class order, so keeping a strict
    // maximum realizes the lowest-index tie-break
    let mut winner = None;
    let mut best_count = 0;
    for (class, count) in counts {
        if count > best_count {
            winner = Some(class);
            best_count = count;
        }
    }
    winner
}

/// Group chunk predictions by source recording, preserving class order
///
/// # Arguments
/// * `predictions` - (recording, probability vector) per chunk, any order
///
/// # Returns
/// Song-level decisions per recording
pub fn aggregate_by_recording(
    predictions: &[(RecordingId, Vec<f32>)],
) -> BTreeMap<RecordingId, usize> {
    let mut grouped: BTreeMap<RecordingId, Vec<Vec<f32>>> = BTreeMap::new();
    for (recording, probabilities) in predictions {
        grouped
            .entry(recording.clone())
            .or_default()
            .push(probabilities.clone());
    }

    grouped
        .into_iter()
        .filter_map(|(recording, chunks)| {
            aggregate_votes(&chunks).map(|class| (recording, class))
        })
        .collect()
}
