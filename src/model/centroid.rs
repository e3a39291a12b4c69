// CentroidModel - reference implementation of the model boundary
//
// A nearest-centroid scorer: each example is pooled over time into one
// feature vector per channel, each class keeps the mean vector of its
// training examples, and prediction scores classes by inverse distance,
// normalized into a probability vector. Time pooling makes it equally
// applicable to fixed-size chunks and variable-length sequences, which
// is exactly the flexibility the harness requires of real networks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::corpus::MultiChannelExample;
use crate::error::PipelineError;
use crate::model::TrainableModel;

/// Nearest-centroid classifier over time-pooled channel features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidModel {
    num_classes: usize,
    /// Per-class mean feature vector; empty until trained
    centroids: Vec<Vec<f32>>,
}

impl CentroidModel {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            centroids: Vec::new(),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    /// Pool an example into one flat feature vector: per channel, the
    /// per-band mean over time, concatenated across channels
    fn pool(example: &MultiChannelExample) -> Vec<f32> {
        let mut features = Vec::new();
        for channel in &example.channels {
            let bands = channel.bands();
            let frames = channel.frames();
            if frames == 0 {
                features.extend(std::iter::repeat(0.0).take(bands));
                continue;
            }
            for band in 0..bands {
                let sum: f32 = (0..frames).map(|t| channel.frame(t)[band]).sum();
                features.push(sum / frames as f32);
            }
        }
        features
    }

    fn distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }
}

impl TrainableModel for CentroidModel {
    fn train(&mut self, examples: &[MultiChannelExample]) -> Result<(), PipelineError> {
        if examples.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        let dim = Self::pool(&examples[0]).len();
        let mut sums: BTreeMap<usize, (Vec<f64>, usize)> = BTreeMap::new();

        for example in examples {
            let features = Self::pool(example);
            let entry = sums
                .entry(example.label.index())
                .or_insert_with(|| (vec![0.0; dim], 0));
            for (acc, &value) in entry.0.iter_mut().zip(features.iter()) {
                *acc += value as f64;
            }
            entry.1 += 1;
        }

        let mut centroids = vec![vec![0.0f32; dim]; self.num_classes];
        for (class, (sum, count)) in sums {
            if class >= self.num_classes {
                return Err(PipelineError::Configuration {
                    reason: format!(
                        "label index {} exceeds configured class count {}",
                        class, self.num_classes
                    ),
                });
            }
            centroids[class] = sum
                .iter()
                .map(|&total| (total / count as f64) as f32)
                .collect();
        }

        self.centroids = centroids;
        Ok(())
    }

    fn predict(&self, example: &MultiChannelExample) -> Vec<f32> {
        debug_assert!(self.is_trained(), "predict called before train");
        let features = Self::pool(example);

        // Inverse-distance scores, normalized so the vector sums to 1
        let scores: Vec<f32> = self
            .centroids
            .iter()
            .map(|centroid| 1.0 / (1.0 + Self::distance(&features, centroid)))
            .collect();
        let total: f32 = scores.iter().sum();
        if total > 0.0 {
            scores.iter().map(|s| s / total).collect()
        } else {
            vec![1.0 / self.num_classes as f32; self.num_classes]
        }
    }
}
