// Pipeline orchestration - preprocessing and cross-validated training
//
// Preprocessing fans out per-recording feature extraction across worker
// threads, gathers at the corpus-statistics barrier, then normalizes,
// chunks, composes and persists. Training consumes the persisted
// artifacts fold by fold, strictly sequential inside each fold.

pub mod preprocess;
pub mod train;

pub use preprocess::{run_preprocessing, PreprocessSummary};
pub use train::run_training;
