// WAV decoding - PCM ingest via hound
//
// Decodes WAV files into mono f32 waveforms. Integer sample formats are
// rescaled to [-1, 1]. Multi-channel files are rejected: the feature
// pipeline expects mono PCM, and a mismatching layout is a per-recording
// format error, not something to paper over with a silent downmix.
// Sample-rate validation happens later at the feature extractor, which
// knows the rate it was configured for.

use std::path::Path;

use crate::audio::Waveform;
use crate::error::FormatError;

/// Decode a WAV file into a mono waveform
///
/// # Arguments
/// * `path` - Path to the WAV file
///
/// # Returns
/// * `Ok(Waveform)` - Decoded mono samples at the file's native rate
/// * `Err(FormatError)` - File is missing, undecodable, empty or not mono
pub fn load_wav(path: &Path) -> Result<Waveform, FormatError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| FormatError::Malformed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(FormatError::ChannelLayoutMismatch {
            channels: spec.channels,
        });
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| {
                sample.map_err(|err| FormatError::Malformed {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| {
                    sample.map(|v| v as f32 / i16::MAX as f32).map_err(|err| {
                        FormatError::Malformed {
                            path: path.to_path_buf(),
                            reason: err.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?,
            24 | 32 => reader
                .samples::<i32>()
                .map(|sample| {
                    sample.map(|v| v as f32 / i32::MAX as f32).map_err(|err| {
                        FormatError::Malformed {
                            path: path.to_path_buf(),
                            reason: err.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?,
            bits => {
                return Err(FormatError::Malformed {
                    path: path.to_path_buf(),
                    reason: format!("unsupported bits_per_sample={}", bits),
                })
            }
        },
    };

    if samples.is_empty() {
        return Err(FormatError::EmptyWaveform {
            path: path.to_path_buf(),
        });
    }

    Ok(Waveform::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, frames: &[Vec<f32>]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &sample in frame {
                match spec.sample_format {
                    hound::SampleFormat::Float => writer.write_sample(sample).unwrap(),
                    hound::SampleFormat::Int => writer
                        .write_sample((sample * i16::MAX as f32) as i16)
                        .unwrap(),
                }
            }
        }
        writer.finalize().unwrap();
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("genre_trainer_wav_{}_{}.wav", name, std::process::id()))
    }

    #[test]
    fn test_load_mono_float_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let frames: Vec<Vec<f32>> = (0..64).map(|i| vec![i as f32 / 64.0]).collect();
        let path = temp_path("mono_float");
        write_wav(&path, spec, &frames);

        let waveform = load_wav(&path).expect("mono float WAV should decode");
        let _ = std::fs::remove_file(&path);

        assert_eq!(waveform.samples.len(), 64);
        assert_eq!(waveform.sample_rate, 44_100);
        assert!((waveform.samples[32] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_load_mono_int16_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let frames: Vec<Vec<f32>> = (0..32).map(|_| vec![0.5]).collect();
        let path = temp_path("mono_int16");
        write_wav(&path, spec, &frames);

        let waveform = load_wav(&path).expect("mono int16 WAV should decode");
        let _ = std::fs::remove_file(&path);

        assert_eq!(waveform.sample_rate, 22_050);
        for &sample in &waveform.samples {
            assert!(
                (sample - 0.5).abs() < 1e-3,
                "int16 rescale should recover 0.5, got {sample}"
            );
        }
    }

    #[test]
    fn test_stereo_wav_is_rejected() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let frames: Vec<Vec<f32>> = (0..32).map(|_| vec![1.0, 0.0]).collect();
        let path = temp_path("stereo");
        write_wav(&path, spec, &frames);

        let err = load_wav(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);

        match err {
            FormatError::ChannelLayoutMismatch { channels } => assert_eq!(channels, 2),
            other => panic!("Expected ChannelLayoutMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_malformed() {
        let err = load_wav(Path::new("/nonexistent/file.wav")).unwrap_err();
        match err {
            FormatError::Malformed { .. } => {}
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }
}
