// Training harness - cross-validated fit/evaluate over persisted folds
//
// Each fold runs strictly in sequence: fit on the train split, report
// validation accuracy, then score the test split. The chunked pipeline
// turns chunk-level predictions into song-level decisions by majority
// vote before accuracy is computed; the sequence pipeline predicts once
// per recording. Folds accumulate into a mean ± std summary.

use std::collections::BTreeMap;

use crate::config::AppConfig;
use crate::corpus::{MultiChannelExample, RecordingId};
use crate::dataset::{ArtifactStore, SplitRole};
use crate::error::PipelineError;
use crate::eval::{accuracy, aggregate_by_recording, predicted_class, CrossValidationSummary};
use crate::model::{checkpoint, CentroidModel, NetworkConfig, PipelineKind, TrainableModel};

/// Run cross-validated training and evaluation
///
/// # Arguments
/// * `config` - Application configuration (artifact locations)
/// * `network` - Validated pipeline selector and channel count
///
/// # Returns
/// Per-fold test accuracies with their mean ± std summary
pub fn run_training(
    config: &AppConfig,
    network: &NetworkConfig,
) -> Result<CrossValidationSummary, PipelineError> {
    let store = ArtifactStore::new(&config.data.artifact_dir);
    let handle = store.open_dataset(network.pipeline)?;
    let channels = network.channels();
    let num_classes = handle.labels().len();

    tracing::info!(
        "[Train] {} pipeline, {} channels, {} classes, {} recordings, {} folds",
        network.pipeline,
        channels.len(),
        num_classes,
        handle.recording_count(),
        handle.fold_count()
    );

    let mut fold_accuracies = Vec::with_capacity(handle.fold_count());

    for fold in 0..handle.fold_count() {
        let train_set = handle.load_split(fold, SplitRole::Train, channels)?;
        let validation_set = handle.load_split(fold, SplitRole::Validation, channels)?;
        let test_set = handle.load_split(fold, SplitRole::Test, channels)?;

        let mut model = CentroidModel::new(num_classes);
        model.train(&train_set)?;

        let validation_accuracy = evaluate(&model, &validation_set, network.pipeline);
        let test_accuracy = evaluate(&model, &test_set, network.pipeline);

        let checkpoint_path = store
            .root()
            .join("checkpoints")
            .join(format!("{}_{}ch", network.pipeline, network.channel_count))
            .join(format!("fold_{:02}.json", fold));
        checkpoint::save_checkpoint(&checkpoint_path, &model)?;

        tracing::info!(
            "[Train] Fold {:02}: train={} validation_acc={:.4} test_acc={:.4}",
            fold,
            train_set.len(),
            validation_accuracy,
            test_accuracy
        );
        fold_accuracies.push(test_accuracy);
    }

    let summary = CrossValidationSummary::new(fold_accuracies);
    tracing::info!("[Train] Cross-validation accuracy: {}", summary);
    Ok(summary)
}

/// Recording-level accuracy of a model over one split
///
/// Chunked pipeline: chunk predictions are grouped by source recording
/// and collapsed by majority vote. Sequence pipeline: one prediction per
/// recording, no aggregation.
fn evaluate(model: &impl TrainableModel, examples: &[MultiChannelExample], pipeline: PipelineKind) -> f64 {
    if examples.is_empty() {
        return 0.0;
    }

    match pipeline {
        PipelineKind::Cnn => {
            let predictions: Vec<(RecordingId, Vec<f32>)> = examples
                .iter()
                .map(|example| (example.recording.clone(), model.predict(example)))
                .collect();
            let decisions = aggregate_by_recording(&predictions);

            let truth: BTreeMap<&RecordingId, usize> = examples
                .iter()
                .map(|example| (&example.recording, example.label.index()))
                .collect();

            let outcomes: Vec<(usize, usize)> = decisions
                .iter()
                .map(|(recording, &predicted)| (predicted, truth[recording]))
                .collect();
            accuracy(&outcomes)
        }
        PipelineKind::Crnn => {
            let outcomes: Vec<(usize, usize)> = examples
                .iter()
                .map(|example| {
                    (
                        predicted_class(&model.predict(example)),
                        example.label.index(),
                    )
                })
                .collect();
            accuracy(&outcomes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{GenreLabel, Spectrogram};

    /// Model that always predicts the class encoded in its bias vector
    struct FixedModel {
        probabilities: Vec<f32>,
    }

    impl TrainableModel for FixedModel {
        fn train(&mut self, _examples: &[MultiChannelExample]) -> Result<(), PipelineError> {
            Ok(())
        }
        fn predict(&self, _example: &MultiChannelExample) -> Vec<f32> {
            self.probabilities.clone()
        }
    }

    fn chunk_example(recording: &str, label: usize) -> MultiChannelExample {
        MultiChannelExample {
            channels: vec![Spectrogram::from_frames(2, vec![0.0; 8])],
            label: GenreLabel(label),
            recording: RecordingId(recording.to_string()),
        }
    }

    #[test]
    fn test_chunked_evaluation_is_per_recording() {
        // Three chunks of one recording, one chunk of another: two
        // song-level decisions, not four chunk-level ones
        let examples = vec![
            chunk_example("a", 0),
            chunk_example("a", 0),
            chunk_example("a", 0),
            chunk_example("b", 1),
        ];
        let model = FixedModel {
            probabilities: vec![0.9, 0.1],
        };

        // Model always votes class 0: recording a correct, b wrong
        let acc = evaluate(&model, &examples, PipelineKind::Cnn);
        assert!((acc - 0.5).abs() < 1e-12, "expected 1/2 recordings correct, got {acc}");
    }

    #[test]
    fn test_sequence_evaluation_is_direct() {
        let examples = vec![chunk_example("a", 0), chunk_example("b", 1)];
        let model = FixedModel {
            probabilities: vec![0.2, 0.8],
        };
        let acc = evaluate(&model, &examples, PipelineKind::Crnn);
        assert!((acc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_split_scores_zero() {
        let model = FixedModel {
            probabilities: vec![1.0],
        };
        assert_eq!(evaluate(&model, &[], PipelineKind::Cnn), 0.0);
    }
}
