// Evaluation - accuracy accounting across cross-validation folds

pub mod voting;

pub use voting::{aggregate_by_recording, aggregate_votes, predicted_class};

/// Accuracy results across all folds of a cross-validation run
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationSummary {
    pub fold_accuracies: Vec<f64>,
}

impl CrossValidationSummary {
    pub fn new(fold_accuracies: Vec<f64>) -> Self {
        Self { fold_accuracies }
    }

    /// Mean accuracy across folds
    pub fn mean(&self) -> f64 {
        if self.fold_accuracies.is_empty() {
            return 0.0;
        }
        self.fold_accuracies.iter().sum::<f64>() / self.fold_accuracies.len() as f64
    }

    /// Population standard deviation of the per-fold accuracies
    pub fn std_dev(&self) -> f64 {
        if self.fold_accuracies.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .fold_accuracies
            .iter()
            .map(|&a| (a - mean) * (a - mean))
            .sum::<f64>()
            / self.fold_accuracies.len() as f64;
        variance.sqrt()
    }
}

impl std::fmt::Display for CrossValidationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.4} ± {:.4} over {} folds",
            self.mean(),
            self.std_dev(),
            self.fold_accuracies.len()
        )
    }
}

/// Fraction of decisions matching ground truth
///
/// # Arguments
/// * `outcomes` - (predicted class, true class) per evaluated recording
pub fn accuracy(outcomes: &[(usize, usize)]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    let correct = outcomes
        .iter()
        .filter(|(predicted, truth)| predicted == truth)
        .count();
    correct as f64 / outcomes.len() as f64
}
