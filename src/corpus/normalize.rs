// Corpus normalization - global mean/variance statistics
//
// Statistics are computed over every value of every spectrogram across
// the full corpus (all channels pooled, one scalar mean and one scalar
// variance), then every spectrogram is rewritten in place. The two
// passes are strict: accumulation must see the complete corpus before
// any value is rescaled, otherwise later spectrograms would be biased.
//
// The statistics are computed before any train/test split is formed.
// Test-set values therefore influence the normalization of training
// data; this leakage is inherited from the original pipeline design and
// reproduced deliberately (see DESIGN.md).

use crate::corpus::Spectrogram;
use crate::error::PipelineError;

/// Immutable corpus-wide normalization statistics
///
/// Computed exactly once and passed by reference into every
/// normalization call; never a process-wide singleton.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CorpusStats {
    pub mean: f64,
    pub variance: f64,
    pub count: u64,
}

impl CorpusStats {
    /// Accumulate statistics over a complete corpus of spectrograms
    ///
    /// # Arguments
    /// * `spectrograms` - Every spectrogram of the corpus, all channels
    ///
    /// # Returns
    /// * `Ok(CorpusStats)` - Population mean and variance
    /// * `Err(PipelineError::EmptyCorpus)` - No values to accumulate over
    pub fn accumulate<'a, I>(spectrograms: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = &'a Spectrogram>,
    {
        let mut count: u64 = 0;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;

        for spectrogram in spectrograms {
            for &value in spectrogram.values() {
                let v = value as f64;
                sum += v;
                sum_sq += v * v;
                count += 1;
            }
        }

        if count == 0 {
            return Err(PipelineError::EmptyCorpus);
        }

        let mean = sum / count as f64;
        // Population variance; clamp tiny negative residue from rounding
        let variance = (sum_sq / count as f64 - mean * mean).max(0.0);

        Ok(Self {
            mean,
            variance,
            count,
        })
    }

    /// Rescale one spectrogram in place as `(x - mean) / sqrt(variance)`
    ///
    /// A degenerate corpus (zero variance) divides by 1.0 instead, so all
    /// values center to zero rather than blowing up.
    pub fn apply(&self, spectrogram: &mut Spectrogram) {
        let std_dev = if self.variance > f64::EPSILON {
            self.variance.sqrt()
        } else {
            1.0
        };
        let mean = self.mean as f32;
        let inv = (1.0 / std_dev) as f32;
        for value in spectrogram.values_mut() {
            *value = (*value - mean) * inv;
        }
    }

    /// Rescale every spectrogram of a corpus in place
    pub fn apply_all(&self, spectrograms: &mut [Spectrogram]) {
        for spectrogram in spectrograms.iter_mut() {
            self.apply(spectrogram);
        }
    }
}
