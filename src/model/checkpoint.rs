// Checkpoint persistence - atomic model snapshots
//
// Training is long-running and cancellable; a checkpoint interrupted
// mid-write must never leave a torn file behind. All writes go to a
// temporary sibling and are renamed into place, relying on the
// filesystem's atomic rename.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PipelineError;

/// Persist a serializable model snapshot atomically
///
/// # Arguments
/// * `path` - Final checkpoint location
/// * `model` - Snapshot to serialize as JSON
pub fn save_checkpoint<M: Serialize>(path: &Path, model: &M) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Artifact {
            context: format!("creating checkpoint directory {}", parent.display()),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(model).map_err(|source| {
        PipelineError::Serialization {
            context: format!("serializing checkpoint {}", path.display()),
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

/// Load a model snapshot saved by [`save_checkpoint`]
pub fn load_checkpoint<M: DeserializeOwned>(path: &Path) -> Result<M, PipelineError> {
    let json = fs::read_to_string(path).map_err(|source| PipelineError::Artifact {
        context: format!("reading {}", path.display()),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| PipelineError::Serialization {
        context: format!("deserializing checkpoint {}", path.display()),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CentroidModel;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "genre_trainer_ckpt_{}_{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let model = CentroidModel::new(5);
        let path = temp_path("roundtrip");

        save_checkpoint(&path, &model).unwrap();
        let loaded: CentroidModel = load_checkpoint(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.num_classes(), 5);
    }

    #[test]
    fn test_no_tmp_file_survives() {
        let model = CentroidModel::new(3);
        let path = temp_path("atomic");
        save_checkpoint(&path, &model).unwrap();
        assert!(
            !path.with_extension("json.tmp").exists(),
            "tmp file must be renamed away"
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_checkpoint_is_artifact_error() {
        let result: Result<CentroidModel, _> =
            load_checkpoint(Path::new("/nonexistent/checkpoint.json"));
        match result.unwrap_err() {
            PipelineError::Artifact { .. } => {}
            other => panic!("Expected Artifact error, got {:?}", other),
        }
    }
}
