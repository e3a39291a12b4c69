// Model boundary - the trainable-model collaborator contract
//
// The harness does not prescribe network internals. It hands a model a
// batch of aligned multi-channel examples and expects class-probability
// vectors back. Anything satisfying TrainableModel plugs into the
// cross-validation harness: the chunked pipeline feeds fixed-size tiles,
// the sequence pipeline feeds whole variable-length spectrograms.

pub mod centroid;
pub mod checkpoint;

pub use centroid::CentroidModel;

use serde::{Deserialize, Serialize};

use crate::corpus::MultiChannelExample;
use crate::error::PipelineError;
use crate::features::ChannelKind;

/// Architecture family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Multi-channel convolutional network over fixed-size chunks, with
    /// song-level majority voting
    Cnn,
    /// Convolutional front-end plus recurrent sequence model over whole
    /// recordings
    Crnn,
}

impl PipelineKind {
    /// Directory name for persisted artifacts of this pipeline
    pub fn dir_name(&self) -> &'static str {
        match self {
            PipelineKind::Cnn => "cnn",
            PipelineKind::Crnn => "crnn",
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Network configuration at the collaborator boundary
///
/// Channel count selects the parallel input branches (2 = pitch+tempo,
/// 3 adds bass); topology hyperparameters beyond that belong to the
/// concrete model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub pipeline: PipelineKind,
    pub channel_count: usize,
}

impl NetworkConfig {
    /// Validate and build a configuration
    ///
    /// # Returns
    /// * `Err(PipelineError::Configuration)` - Channel count outside {2, 3}
    pub fn new(pipeline: PipelineKind, channel_count: usize) -> Result<Self, PipelineError> {
        if ChannelKind::selection(channel_count).is_none() {
            return Err(PipelineError::Configuration {
                reason: format!("channel count must be 2 or 3, got {}", channel_count),
            });
        }
        Ok(Self {
            pipeline,
            channel_count,
        })
    }

    /// The channel views this configuration trains on
    pub fn channels(&self) -> &'static [ChannelKind] {
        // Validated at construction
        ChannelKind::selection(self.channel_count).expect("validated channel count")
    }
}

/// A model the cross-validation harness can train and query
///
/// Implementations must accept a variable number of input channels and,
/// for the sequence pipeline, variable-length time input per example.
pub trait TrainableModel {
    /// Fit the model to a training split
    fn train(&mut self, examples: &[MultiChannelExample]) -> Result<(), PipelineError>;

    /// Class-probability vector for one example, `num_classes` long,
    /// summing to 1
    fn predict(&self, example: &MultiChannelExample) -> Vec<f32>;
}
