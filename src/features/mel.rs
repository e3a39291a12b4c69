// Mel filterbank - perceptual frequency warping
//
// Warps linear FFT bins into mel-scale bands with triangular filters and
// applies log-domain dynamic-range compression. The filterbank matrix is
// precomputed once per (window size, band range) configuration.

/// Triangular mel filterbank over the positive-frequency FFT bins
pub struct MelFilterbank {
    /// Filter weights, row-major: `weights[band * bins + bin]`
    weights: Vec<f32>,
    bands: usize,
    bins: usize,
}

impl MelFilterbank {
    /// Build a filterbank
    ///
    /// # Arguments
    /// * `bands` - Number of mel bands
    /// * `bins` - Positive-frequency FFT bins (window_size / 2 + 1)
    /// * `window_size` - FFT window length in samples
    /// * `sample_rate` - Sample rate in Hz
    /// * `fmin` - Lower edge of the filterbank in Hz
    /// * `fmax` - Upper edge of the filterbank in Hz
    pub fn new(
        bands: usize,
        bins: usize,
        window_size: usize,
        sample_rate: u32,
        fmin: f32,
        fmax: f32,
    ) -> Self {
        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);

        // bands + 2 edge frequencies, evenly spaced on the mel scale
        let edges: Vec<f32> = (0..bands + 2)
            .map(|i| {
                let mel = mel_min + (mel_max - mel_min) * i as f32 / (bands + 1) as f32;
                mel_to_hz(mel)
            })
            .collect();

        let bin_width = sample_rate as f32 / window_size as f32;
        let mut weights = vec![0.0f32; bands * bins];

        for band in 0..bands {
            let left = edges[band];
            let center = edges[band + 1];
            let right = edges[band + 2];

            for bin in 0..bins {
                let freq = bin as f32 * bin_width;
                let weight = if freq <= left || freq >= right {
                    0.0
                } else if freq <= center {
                    (freq - left) / (center - left)
                } else {
                    (right - freq) / (right - center)
                };
                weights[band * bins + bin] = weight;
            }
        }

        Self {
            weights,
            bands,
            bins,
        }
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Warp one magnitude spectrum into mel bands
    ///
    /// # Arguments
    /// * `spectrum` - Magnitude spectrum of `bins` values
    ///
    /// # Returns
    /// One energy value per mel band
    pub fn apply(&self, spectrum: &[f32]) -> Vec<f32> {
        debug_assert_eq!(spectrum.len(), self.bins);
        (0..self.bands)
            .map(|band| {
                let row = &self.weights[band * self.bins..(band + 1) * self.bins];
                row.iter().zip(spectrum.iter()).map(|(&w, &m)| w * m).sum()
            })
            .collect()
    }
}

/// Compressive log-domain rescaling: ln(1 + x)
///
/// Keeps magnitudes non-negative while compressing dynamic range, and is
/// well defined at silence (x = 0).
pub fn log_compress(band_energies: &mut [f32]) {
    for value in band_energies.iter_mut() {
        *value = (1.0 + *value).ln();
    }
}

/// Hz -> mel (HTK formula)
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel -> Hz (HTK formula)
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [0.0, 100.0, 440.0, 1000.0, 8000.0, 22050.0] {
            let roundtrip = mel_to_hz(hz_to_mel(hz));
            assert!(
                (roundtrip - hz).abs() < 0.5,
                "mel roundtrip of {hz} Hz drifted to {roundtrip} Hz"
            );
        }
    }

    #[test]
    fn test_filterbank_band_count() {
        let bank = MelFilterbank::new(40, 1025, 2048, 44_100, 0.0, 22_050.0);
        assert_eq!(bank.bands(), 40);
        let out = bank.apply(&vec![1.0; 1025]);
        assert_eq!(out.len(), 40);
    }

    #[test]
    fn test_filters_respond_to_their_band() {
        let bins = 1025;
        let bank = MelFilterbank::new(40, bins, 2048, 44_100, 0.0, 22_050.0);

        // A spike at a low bin should excite low bands far more than high ones
        let mut spectrum = vec![0.0f32; bins];
        spectrum[10] = 1.0; // ~215 Hz
        let out = bank.apply(&spectrum);

        let low_energy: f32 = out[..10].iter().sum();
        let high_energy: f32 = out[30..].iter().sum();
        assert!(
            low_energy > high_energy,
            "low-frequency spike should land in low mel bands (low={low_energy}, high={high_energy})"
        );
    }

    #[test]
    fn test_restricted_band_range_ignores_high_bins() {
        let bins = 2049;
        // Bass configuration: 0-500 Hz over a 4096 window
        let bank = MelFilterbank::new(40, bins, 4096, 44_100, 0.0, 500.0);

        let mut spectrum = vec![0.0f32; bins];
        // 5 kHz spike: bin 5000/44100*4096 ~ 464, far above the 500 Hz edge
        spectrum[464] = 1.0;
        let out = bank.apply(&spectrum);
        let total: f32 = out.iter().sum();
        assert!(
            total < 1e-6,
            "energy above fmax should not reach a restricted filterbank, got {total}"
        );
    }

    #[test]
    fn test_log_compress_is_monotone_and_non_negative() {
        let mut values = vec![0.0, 0.5, 1.0, 10.0, 1000.0];
        log_compress(&mut values);
        assert_eq!(values[0], 0.0, "silence must stay zero");
        for pair in values.windows(2) {
            assert!(pair[0] < pair[1], "log compression must preserve order");
        }
        assert!(values.iter().all(|&v| v >= 0.0));
    }
}
