// STFT module - short-time Fourier transform magnitude frames
//
// This module handles windowed FFT computation over a waveform. A
// Blackman-Harris analysis window keeps spectral leakage low; the complex
// phase is dropped immediately and only magnitudes leave this module.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Short-time Fourier transform processor
///
/// Precomputes the analysis window and FFT plan for one window size.
/// Frames are placed sequentially at `hop_size` intervals; a trailing
/// segment shorter than the window produces no frame.
pub struct StftProcessor {
    fft: Arc<dyn Fft<f32>>,
    window_size: usize,
    hop_size: usize,
    /// Blackman-Harris window (pre-computed)
    window: Vec<f32>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `window_size` - Analysis window length in samples
    /// * `hop_size` - Advance between successive frames in samples
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        let window = blackman_harris(window_size);
        let fft = FftPlanner::new().plan_fft_forward(window_size);

        Self {
            fft,
            window_size,
            hop_size,
            window,
        }
    }

    /// Number of positive-frequency bins per frame (window_size / 2 + 1)
    pub fn bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    /// Number of frames produced for a waveform of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        if len < self.window_size {
            0
        } else {
            (len - self.window_size) / self.hop_size + 1
        }
    }

    /// Compute magnitude frames for a waveform
    ///
    /// Each frame is windowed, transformed, and reduced to the magnitudes
    /// of its positive-frequency bins (exploiting real-input symmetry).
    ///
    /// # Arguments
    /// * `samples` - Mono waveform
    ///
    /// # Returns
    /// One magnitude vector of `bins()` values per frame; empty if the
    /// waveform is shorter than the analysis window
    pub fn magnitude_frames(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let frames = self.num_frames(samples.len());
        let mut output = Vec::with_capacity(frames);
        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.window_size];

        for frame_index in 0..frames {
            let start = frame_index * self.hop_size;
            let segment = &samples[start..start + self.window_size];

            for (i, (&sample, &w)) in segment.iter().zip(self.window.iter()).enumerate() {
                buffer[i] = Complex::new(sample * w, 0.0);
            }

            self.fft.process(&mut buffer);

            output.push(buffer[..self.bins()].iter().map(|c| c.norm()).collect());
        }

        output
    }
}

/// Four-term Blackman-Harris window
fn blackman_harris(size: usize) -> Vec<f32> {
    const A0: f32 = 0.35875;
    const A1: f32 = 0.48829;
    const A2: f32 = 0.14128;
    const A3: f32 = 0.01168;

    (0..size)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0);
            A0 - A1 * x.cos() + A2 * (2.0 * x).cos() - A3 * (3.0 * x).cos()
        })
        .collect()
}
