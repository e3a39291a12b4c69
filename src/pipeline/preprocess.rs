// Preprocessing pipeline - raw recordings to persisted training tensors
//
// Stages, in order:
// 1. Scan the dataset directory (one subdirectory per genre).
// 2. Extract all channel views per recording, in parallel. A recording
//    that fails to load or extract is logged and excluded; one bad file
//    never aborts the batch.
// 3. Barrier: accumulate corpus statistics over every spectrogram of
//    every surviving recording, then normalize all of them in place.
//    Nothing is normalized until the whole corpus has been seen.
// 4. Build the stratified fold plan over recording identifiers.
// 5. Compose chunked examples (CNN corpus) and whole-spectrogram
//    examples (sequence corpus) and persist both with the plan.

use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::audio::load_wav;
use crate::config::AppConfig;
use crate::corpus::{
    compose_chunked, compose_sequence, ChunkReport, CorpusStats, GenreLabel, LabelSet,
    RecordingId, Spectrogram,
};
use crate::dataset::{ArtifactStore, CrossValidationPlan};
use crate::error::PipelineError;
use crate::features::{ChannelKind, SpectralExtractor};
use crate::model::PipelineKind;

/// Every channel view is extracted once; training selects a subset later
const ALL_CHANNELS: [ChannelKind; 3] = [ChannelKind::Pitch, ChannelKind::Tempo, ChannelKind::Bass];

/// Counts reported at the end of a preprocessing run
#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    /// Recordings discovered in the dataset directory
    pub discovered: usize,
    /// Recordings dropped by per-recording failures (bad file, bad format)
    pub failed: usize,
    /// Chunking outcome across the CNN corpus
    pub chunk_report: ChunkReport,
    /// Recordings excluded from the CNN corpus for being too short
    pub too_short_for_chunks: usize,
    /// Corpus-wide normalization statistics
    pub stats: CorpusStats,
    /// Composed examples per pipeline
    pub chunked_examples: usize,
    pub sequence_examples: usize,
}

struct ExtractedRecording {
    id: RecordingId,
    label: GenreLabel,
    views: Vec<Spectrogram>,
}

/// Run the full preprocessing pipeline
pub fn run_preprocessing(config: &AppConfig) -> Result<PreprocessSummary, PipelineError> {
    config.validate()?;

    let (labels, recordings) = scan_dataset(config)?;
    let discovered = recordings.len();
    tracing::info!(
        "[Preprocess] Discovered {} recordings across {} genres in {}",
        discovered,
        labels.len(),
        config.data.dataset_dir.display()
    );

    let extractor = SpectralExtractor::new(&config.features);

    // Stage 2: per-recording extraction, embarrassingly parallel. No
    // shared mutable state; results gather at the statistics barrier.
    let results: Vec<Result<ExtractedRecording, (RecordingId, PipelineError)>> = recordings
        .par_iter()
        .map(|(id, label, path)| {
            let waveform = load_wav(path).map_err(|e| (id.clone(), PipelineError::from(e)))?;
            let views = extractor
                .extract_channels(&waveform, &ALL_CHANNELS)
                .map_err(|e| (id.clone(), PipelineError::from(e)))?;
            Ok(ExtractedRecording {
                id: id.clone(),
                label: *label,
                views,
            })
        })
        .collect();

    let mut extracted = Vec::with_capacity(results.len());
    let mut failed = 0;
    for result in results {
        match result {
            Ok(recording) => extracted.push(recording),
            Err((id, err)) => {
                tracing::warn!("[Preprocess] Skipping {}: {}", id, err);
                failed += 1;
            }
        }
    }

    if extracted.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }

    // Stage 3: gather-then-scatter barrier. Accumulation sees the full
    // corpus (all recordings, all channels) before any value is rescaled.
    let stats = CorpusStats::accumulate(extracted.iter().flat_map(|r| r.views.iter()))?;
    tracing::info!(
        "[Preprocess] Corpus statistics over {} values: mean={:.6}, variance={:.6}",
        stats.count,
        stats.mean,
        stats.variance
    );
    for recording in extracted.iter_mut() {
        stats.apply_all(&mut recording.views);
    }

    // Stage 4: fold plan over recording identifiers, never chunks
    let labeled: Vec<(RecordingId, GenreLabel)> = extracted
        .iter()
        .map(|r| (r.id.clone(), r.label))
        .collect();
    let plan = CrossValidationPlan::stratified(&labeled, config.split.folds, config.split.seed)?;

    // Stage 5: composition and persistence
    let mut chunked = Vec::new();
    let mut sequence = Vec::new();
    let mut chunk_report = ChunkReport::default();
    let mut too_short = 0;

    for recording in &extracted {
        match compose_chunked(
            &recording.views,
            recording.label,
            &recording.id,
            config.chunking.frames_per_chunk,
        ) {
            Ok((examples, report)) => {
                if examples.is_empty() {
                    tracing::warn!(
                        "[Preprocess] {} is too short for chunking and leaves the CNN corpus",
                        recording.id
                    );
                    too_short += 1;
                }
                chunk_report.merge(report);
                chunked.extend(examples);
            }
            Err(err) => {
                tracing::warn!("[Preprocess] Chunk composition failed for {}: {}", recording.id, err);
                too_short += 1;
            }
        }

        match compose_sequence(&recording.views, recording.label, &recording.id) {
            Ok(example) => sequence.push(example),
            Err(err) => {
                tracing::warn!(
                    "[Preprocess] Sequence composition failed for {}: {}",
                    recording.id,
                    err
                );
            }
        }
    }

    let store = ArtifactStore::new(&config.data.artifact_dir);
    store.save_fold_plan(&plan)?;
    store.save_dataset(PipelineKind::Cnn, &ALL_CHANNELS, &labels, &chunked)?;
    store.save_dataset(PipelineKind::Crnn, &ALL_CHANNELS, &labels, &sequence)?;

    let summary = PreprocessSummary {
        discovered,
        failed,
        chunk_report,
        too_short_for_chunks: too_short,
        stats,
        chunked_examples: chunked.len(),
        sequence_examples: sequence.len(),
    };

    tracing::info!(
        "[Preprocess] Done: {}/{} recordings extracted, {} chunked examples \
         ({} recordings too short), {} sequence examples",
        discovered - failed,
        discovered,
        summary.chunked_examples,
        summary.too_short_for_chunks,
        summary.sequence_examples
    );

    Ok(summary)
}

/// Discover genres and recordings from the dataset directory layout
///
/// Each subdirectory of the dataset root names a genre; each `.wav`
/// inside belongs to that genre. The recording identifier is the file
/// stem, which in GTZAN-style datasets already embeds the genre.
fn scan_dataset(
    config: &AppConfig,
) -> Result<(LabelSet, Vec<(RecordingId, GenreLabel, PathBuf)>), PipelineError> {
    let root = &config.data.dataset_dir;
    let entries = fs::read_dir(root).map_err(|source| PipelineError::Artifact {
        context: format!("reading dataset directory {}", root.display()),
        source,
    })?;

    let mut genre_dirs: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::Artifact {
            context: format!("reading dataset directory {}", root.display()),
            source,
        })?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                genre_dirs.push((name.to_string(), entry.path()));
            }
        }
    }

    if genre_dirs.is_empty() {
        return Err(PipelineError::Configuration {
            reason: format!("no genre subdirectories under {}", root.display()),
        });
    }

    let labels = LabelSet::new(genre_dirs.iter().map(|(name, _)| name.clone()).collect());

    let mut recordings = Vec::new();
    for (genre, dir) in &genre_dirs {
        let label = labels
            .label_of(genre)
            .expect("genre name came from the label set");
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|source| PipelineError::Artifact {
                context: format!("reading genre directory {}", dir.display()),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("wav"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        for path in files {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unnamed")
                .to_string();
            recordings.push((RecordingId(stem), label, path));
        }
    }

    if recordings.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }

    Ok((labels, recordings))
}
