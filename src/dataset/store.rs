// Artifact store - persisted features behind a typed dataset handle
//
// Preprocessing writes normalized feature arrays once per pipeline and
// channel (one NPY file per recording), a JSON manifest describing the
// corpus, and the fold plan. Training never touches ad hoc paths: it
// opens a DatasetHandle and asks for a (fold, role) split, which the
// handle resolves against the plan.
//
// Layout under the store root:
//   <pipeline>/manifest.json
//   <pipeline>/<channel>/<recording>.npy     shape (examples, bands, frames)
//   folds.json

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::{GenreLabel, LabelSet, MultiChannelExample, RecordingId, Spectrogram};
use crate::dataset::npy::{read_npy, write_npy, NpyArray};
use crate::dataset::split::{CrossValidationPlan, SplitRole};
use crate::error::PipelineError;
use crate::features::ChannelKind;
use crate::model::PipelineKind;

/// Corpus description persisted alongside the feature arrays
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    channels: Vec<ChannelKind>,
    labels: LabelSet,
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    recording: RecordingId,
    label: GenreLabel,
    /// Aligned examples per channel (chunks for the CNN pipeline, 1 for
    /// the sequence pipeline)
    examples: usize,
}

/// Path-keyed store for preprocessing outputs
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pipeline_dir(&self, pipeline: PipelineKind) -> PathBuf {
        self.root.join(pipeline.dir_name())
    }

    fn plan_path(&self) -> PathBuf {
        self.root.join("folds.json")
    }

    /// Persist the composed examples of one pipeline
    ///
    /// Examples are grouped by recording; each channel of each recording
    /// becomes one NPY array of shape (examples, bands, frames).
    pub fn save_dataset(
        &self,
        pipeline: PipelineKind,
        channels: &[ChannelKind],
        labels: &LabelSet,
        examples: &[MultiChannelExample],
    ) -> Result<(), PipelineError> {
        let dir = self.pipeline_dir(pipeline);
        fs::create_dir_all(&dir).map_err(|source| PipelineError::Artifact {
            context: format!("creating {}", dir.display()),
            source,
        })?;

        let mut by_recording: BTreeMap<&RecordingId, Vec<&MultiChannelExample>> = BTreeMap::new();
        for example in examples {
            by_recording.entry(&example.recording).or_default().push(example);
        }

        let mut entries = Vec::with_capacity(by_recording.len());
        for (recording, group) in &by_recording {
            for (c, &channel) in channels.iter().enumerate() {
                let bands = group[0].channels[c].bands();
                let frames = group[0].channels[c].frames();
                let mut data = Vec::with_capacity(group.len() * bands * frames);
                for example in group {
                    data.extend_from_slice(example.channels[c].values());
                }
                let array = NpyArray::new(vec![group.len(), bands, frames], data);

                let channel_dir = dir.join(channel.to_string());
                fs::create_dir_all(&channel_dir).map_err(|source| PipelineError::Artifact {
                    context: format!("creating {}", channel_dir.display()),
                    source,
                })?;
                write_npy(&channel_dir.join(file_name(recording)), &array)?;
            }
            entries.push(ManifestEntry {
                recording: (*recording).clone(),
                label: group[0].label,
                examples: group.len(),
            });
        }

        let manifest = Manifest {
            channels: channels.to_vec(),
            labels: labels.clone(),
            entries,
        };
        write_json(&dir.join("manifest.json"), &manifest)?;

        log::info!(
            "[Store] Saved {} dataset: {} recordings, {} examples under {}",
            pipeline,
            by_recording.len(),
            examples.len(),
            dir.display()
        );
        Ok(())
    }

    /// Persist the cross-validation plan
    pub fn save_fold_plan(&self, plan: &CrossValidationPlan) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.root).map_err(|source| PipelineError::Artifact {
            context: format!("creating {}", self.root.display()),
            source,
        })?;
        write_json(&self.plan_path(), plan)
    }

    /// Open a typed handle over a previously saved dataset
    pub fn open_dataset(&self, pipeline: PipelineKind) -> Result<DatasetHandle, PipelineError> {
        let dir = self.pipeline_dir(pipeline);
        let manifest: Manifest = read_json(&dir.join("manifest.json"))?;
        let plan: CrossValidationPlan = read_json(&self.plan_path())?;
        Ok(DatasetHandle {
            dir,
            manifest,
            plan,
        })
    }
}

/// Typed view over one pipeline's persisted dataset
///
/// Resolves (fold, role) membership against the stored plan and
/// reassembles aligned multi-channel examples from the per-channel
/// arrays.
pub struct DatasetHandle {
    dir: PathBuf,
    manifest: Manifest,
    plan: CrossValidationPlan,
}

impl DatasetHandle {
    pub fn labels(&self) -> &LabelSet {
        &self.manifest.labels
    }

    pub fn channels(&self) -> &[ChannelKind] {
        &self.manifest.channels
    }

    pub fn fold_count(&self) -> usize {
        self.plan.fold_count()
    }

    pub fn recording_count(&self) -> usize {
        self.manifest.entries.len()
    }

    /// Load every example of one split of one fold
    ///
    /// Only the channels requested are materialized, so a 3-channel
    /// store serves 2-channel training runs without rewriting features.
    pub fn load_split(
        &self,
        fold: usize,
        role: SplitRole,
        channels: &[ChannelKind],
    ) -> Result<Vec<MultiChannelExample>, PipelineError> {
        let assignment = self.plan.fold(fold).ok_or_else(|| {
            PipelineError::Configuration {
                reason: format!(
                    "fold {} out of range (plan has {})",
                    fold,
                    self.plan.fold_count()
                ),
            }
        })?;

        for channel in channels {
            if !self.manifest.channels.contains(channel) {
                return Err(PipelineError::Configuration {
                    reason: format!("channel {} was not preprocessed into this store", channel),
                });
            }
        }

        let mut examples = Vec::new();
        for entry in &self.manifest.entries {
            if assignment.role_of(&entry.recording) != Some(role) {
                continue;
            }

            // One array per channel, all aligned to entry.examples
            let mut per_channel: Vec<Vec<Spectrogram>> = Vec::with_capacity(channels.len());
            for channel in channels {
                let path = self
                    .dir
                    .join(channel.to_string())
                    .join(file_name(&entry.recording));
                let array = read_npy(&path)?;
                per_channel.push(split_examples(&array, &entry.recording)?);
            }

            for k in 0..entry.examples {
                let channel_tensors: Vec<Spectrogram> = per_channel
                    .iter()
                    .map(|tensors| tensors[k].clone())
                    .collect();
                examples.push(MultiChannelExample {
                    channels: channel_tensors,
                    label: entry.label,
                    recording: entry.recording.clone(),
                });
            }
        }

        Ok(examples)
    }
}

/// Split a stored (examples, bands, frames) array back into spectrograms
fn split_examples(
    array: &NpyArray,
    recording: &RecordingId,
) -> Result<Vec<Spectrogram>, PipelineError> {
    if array.shape.len() != 3 {
        return Err(PipelineError::Configuration {
            reason: format!(
                "stored array for {} has shape {:?}, expected 3 dimensions",
                recording, array.shape
            ),
        });
    }
    let (count, bands, frames) = (array.shape[0], array.shape[1], array.shape[2]);
    let stride = bands * frames;
    Ok((0..count)
        .map(|k| {
            Spectrogram::from_frames(bands, array.data[k * stride..(k + 1) * stride].to_vec())
        })
        .collect())
}

/// Filesystem-safe file name for a recording's feature array
fn file_name(recording: &RecordingId) -> String {
    let safe: String = recording
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.npy", safe)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| {
        PipelineError::Serialization {
            context: format!("serializing {}", path.display()),
            source,
        }
    })?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(|source| PipelineError::Artifact {
        context: format!("writing {}", tmp_path.display()),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| PipelineError::Artifact {
        context: format!("renaming {} into place", path.display()),
        source,
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PipelineError> {
    let json = fs::read_to_string(path).map_err(|source| PipelineError::Artifact {
        context: format!("reading {}", path.display()),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| PipelineError::Serialization {
        context: format!("deserializing {}", path.display()),
        source,
    })
}
