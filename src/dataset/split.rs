// Dataset splitter - stratified k-fold cross-validation plans
//
// Partitions recording identifiers into folds such that each fold
// assigns every recording to exactly one of train/validation/test, in
// 80/10/10 proportions for the default 10 folds. Stratification works
// per genre: each class is shuffled once with the seeded generator and
// dealt round-robin into groups, so every split keeps roughly the global
// class distribution. Fold f tests on group f and validates on group
// (f+1) mod folds, rotating the held-out data across folds.

use std::collections::BTreeMap;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::corpus::{GenreLabel, RecordingId};
use crate::error::PipelineError;

/// Role of a recording within one fold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRole {
    Train,
    Validation,
    Test,
}

/// One fold: every recording mapped to exactly one role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldAssignment {
    assignments: BTreeMap<RecordingId, SplitRole>,
}

impl FoldAssignment {
    pub fn role_of(&self, recording: &RecordingId) -> Option<SplitRole> {
        self.assignments.get(recording).copied()
    }

    /// Recordings holding `role` in this fold, in identifier order
    pub fn recordings_with_role(&self, role: SplitRole) -> Vec<&RecordingId> {
        self.assignments
            .iter()
            .filter(|(_, &r)| r == role)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// A complete cross-validation plan, immutable once computed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationPlan {
    folds: Vec<FoldAssignment>,
    seed: u64,
}

impl CrossValidationPlan {
    /// Build a stratified plan over labeled recording identifiers
    ///
    /// # Arguments
    /// * `recordings` - Every (recording id, label) pair of the corpus
    /// * `folds` - Number of folds (10 gives 80/10/10 splits)
    /// * `seed` - Shuffle seed; the same seed always yields the same plan
    ///
    /// # Returns
    /// * `Ok(CrossValidationPlan)` - One assignment per fold
    /// * `Err(PipelineError::Configuration)` - Fewer than 3 folds or an
    ///   empty corpus
    pub fn stratified(
        recordings: &[(RecordingId, GenreLabel)],
        folds: usize,
        seed: u64,
    ) -> Result<Self, PipelineError> {
        if folds < 3 {
            return Err(PipelineError::Configuration {
                reason: format!("at least 3 folds required, got {}", folds),
            });
        }
        if recordings.is_empty() {
            return Err(PipelineError::Configuration {
                reason: "cannot split an empty recording set".to_string(),
            });
        }

        // Group by class in deterministic order, then shuffle each class
        // with the shared seeded generator
        let mut by_class: BTreeMap<GenreLabel, Vec<RecordingId>> = BTreeMap::new();
        for (id, label) in recordings {
            by_class.entry(*label).or_default().push(id.clone());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut groups: Vec<Vec<RecordingId>> = vec![Vec::new(); folds];

        for (label, mut ids) in by_class {
            ids.sort();
            ids.shuffle(&mut rng);
            if ids.len() < folds {
                log::warn!(
                    "[Splitter] Class {:?} has {} recordings for {} folds; some groups get none",
                    label,
                    ids.len(),
                    folds
                );
            }
            for (i, id) in ids.into_iter().enumerate() {
                groups[i % folds].push(id);
            }
        }

        let fold_assignments = (0..folds)
            .map(|fold| {
                let test_group = fold;
                let validation_group = (fold + 1) % folds;
                let mut assignments = BTreeMap::new();
                for (group, ids) in groups.iter().enumerate() {
                    let role = if group == test_group {
                        SplitRole::Test
                    } else if group == validation_group {
                        SplitRole::Validation
                    } else {
                        SplitRole::Train
                    };
                    for id in ids {
                        assignments.insert(id.clone(), role);
                    }
                }
                FoldAssignment { assignments }
            })
            .collect();

        Ok(Self {
            folds: fold_assignments,
            seed,
        })
    }

    pub fn folds(&self) -> &[FoldAssignment] {
        &self.folds
    }

    pub fn fold(&self, index: usize) -> Option<&FoldAssignment> {
        self.folds.get(index)
    }

    pub fn fold_count(&self) -> usize {
        self.folds.len()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(classes: usize, per_class: usize) -> Vec<(RecordingId, GenreLabel)> {
        let mut recordings = Vec::new();
        for class in 0..classes {
            for i in 0..per_class {
                recordings.push((
                    RecordingId(format!("genre{class}.{i:05}")),
                    GenreLabel(class),
                ));
            }
        }
        recordings
    }

    #[test]
    fn test_every_fold_partitions_the_full_id_set() {
        let recordings = corpus(4, 20);
        let plan = CrossValidationPlan::stratified(&recordings, 10, 42).unwrap();
        assert_eq!(plan.fold_count(), 10);

        for fold in plan.folds() {
            assert_eq!(
                fold.len(),
                recordings.len(),
                "every recording must be assigned exactly one role"
            );
            let train = fold.recordings_with_role(SplitRole::Train).len();
            let validation = fold.recordings_with_role(SplitRole::Validation).len();
            let test = fold.recordings_with_role(SplitRole::Test).len();
            assert_eq!(train + validation + test, recordings.len());
        }
    }

    #[test]
    fn test_split_proportions_are_80_10_10() {
        let recordings = corpus(5, 20); // 100 recordings
        let plan = CrossValidationPlan::stratified(&recordings, 10, 7).unwrap();
        for fold in plan.folds() {
            assert_eq!(fold.recordings_with_role(SplitRole::Test).len(), 10);
            assert_eq!(fold.recordings_with_role(SplitRole::Validation).len(), 10);
            assert_eq!(fold.recordings_with_role(SplitRole::Train).len(), 80);
        }
    }

    #[test]
    fn test_stratification_preserves_class_balance() {
        let recordings = corpus(4, 30);
        let plan = CrossValidationPlan::stratified(&recordings, 10, 3).unwrap();
        let fold = plan.fold(0).unwrap();

        // Each class contributes 3 of its 30 recordings to a 10-fold test group
        for class in 0..4 {
            let test_of_class = fold
                .recordings_with_role(SplitRole::Test)
                .iter()
                .filter(|id| id.as_str().starts_with(&format!("genre{class}.")))
                .count();
            assert_eq!(
                test_of_class, 3,
                "class {class} should have 3 test recordings per fold"
            );
        }
    }

    #[test]
    fn test_same_seed_reproduces_the_plan() {
        let recordings = corpus(3, 15);
        let a = CrossValidationPlan::stratified(&recordings, 10, 42).unwrap();
        let b = CrossValidationPlan::stratified(&recordings, 10, 42).unwrap();
        for (fold_a, fold_b) in a.folds().iter().zip(b.folds()) {
            for (id, _) in corpus(3, 15) {
                assert_eq!(
                    fold_a.role_of(&id),
                    fold_b.role_of(&id),
                    "seed-fixed plans must agree on {id}"
                );
            }
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let recordings = corpus(3, 30);
        let a = CrossValidationPlan::stratified(&recordings, 10, 1).unwrap();
        let b = CrossValidationPlan::stratified(&recordings, 10, 2).unwrap();
        let differs = recordings.iter().any(|(id, _)| {
            a.fold(0).unwrap().role_of(id) != b.fold(0).unwrap().role_of(id)
        });
        assert!(differs, "different seeds should shuffle differently");
    }

    #[test]
    fn test_test_groups_rotate_across_folds() {
        let recordings = corpus(2, 20);
        let plan = CrossValidationPlan::stratified(&recordings, 10, 9).unwrap();

        // A recording is tested in exactly one fold under rotation
        for (id, _) in &recordings {
            let tested = plan
                .folds()
                .iter()
                .filter(|fold| fold.role_of(id) == Some(SplitRole::Test))
                .count();
            assert_eq!(tested, 1, "{id} should be held out for test exactly once");
        }
    }

    #[test]
    fn test_degenerate_fold_count_is_rejected() {
        let recordings = corpus(2, 10);
        let err = CrossValidationPlan::stratified(&recordings, 2, 0).unwrap_err();
        match err {
            PipelineError::Configuration { .. } => {}
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_serde_roundtrip() {
        let recordings = corpus(2, 10);
        let plan = CrossValidationPlan::stratified(&recordings, 5, 42).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: CrossValidationPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.fold_count(), 5);
        assert_eq!(parsed.seed(), 42);
        for (id, _) in &recordings {
            assert_eq!(
                parsed.fold(0).unwrap().role_of(id),
                plan.fold(0).unwrap().role_of(id)
            );
        }
    }
}
