// Synthetic waveform generators - deterministic PCM fixtures
//
// The pipeline tests need recordings with known spectral content and
// exact lengths without shipping audio assets. These generators produce
// reproducible waveforms: pure tones, seeded noise, and harmonic tones
// whose brightness differs enough for a classifier to separate them.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Generate a pure sine wave
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz
/// * `frequency` - Tone frequency in Hz
/// * `len` - Number of samples
pub fn sine_wave(sample_rate: u32, frequency: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate white noise from a seeded generator
///
/// The same seed always yields the same waveform, so noise fixtures are
/// as reproducible as tone fixtures.
pub fn seeded_noise(seed: u64, len: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Generate a tone with decaying harmonic partials
///
/// Sums `partials` harmonics of the fundamental with 1/k amplitude
/// falloff. Different fundamentals give spectrally distinct fixtures
/// that stand in for different genres in tests.
pub fn harmonic_tone(sample_rate: u32, fundamental: f32, partials: usize, len: usize) -> Vec<f32> {
    let norm: f32 = (1..=partials).map(|k| 1.0 / k as f32).sum();
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let mut sample = 0.0;
            for k in 1..=partials {
                let amp = 1.0 / k as f32;
                sample += amp * (2.0 * std::f32::consts::PI * fundamental * k as f32 * t).sin();
            }
            sample / norm
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_wave_length_and_range() {
        let signal = sine_wave(44_100, 440.0, 4096);
        assert_eq!(signal.len(), 4096);
        assert!(signal.iter().all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let a = seeded_noise(7, 1024);
        let b = seeded_noise(7, 1024);
        assert_eq!(a, b, "same seed must produce identical noise");

        let c = seeded_noise(8, 1024);
        assert_ne!(a, c, "different seeds should produce different noise");
    }

    #[test]
    fn test_harmonic_tone_is_bounded() {
        let signal = harmonic_tone(44_100, 220.0, 5, 4096);
        assert_eq!(signal.len(), 4096);
        for &s in &signal {
            assert!(s.abs() <= 1.0 + 1e-4, "normalized tone exceeded unit range: {s}");
        }
    }
}
