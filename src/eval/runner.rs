use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::info;

use super::dataset::{collect_class_names, Sample};
use crate::vision::classifier::Classifier;
use crate::vision::preprocess::ImageInput;

/// Accuracy and confusion statistics.
///
/// Predictions are recorded with `Prediction::evaluation_label`, i.e. the
/// confidence gate is bypassed and gated frames count as their arg-max class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalReport {
    pub classes: Vec<String>,
    pub total: u64,
    pub correct: u64,
    pub per_task_total: HashMap<String, u64>,
    pub per_task_correct: HashMap<String, u64>,
    pub confusion: HashMap<String, BTreeMap<String, u64>>,
}

impl EvalReport {
    pub fn new(classes: Vec<String>) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }

    pub fn record(&mut self, truth: &str, predicted: &str) {
        self.total += 1;
        *self.per_task_total.entry(truth.to_string()).or_insert(0) += 1;
        *self
            .confusion
            .entry(truth.to_string())
            .or_default()
            .entry(predicted.to_string())
            .or_insert(0) += 1;
        if truth == predicted {
            self.correct += 1;
            *self.per_task_correct.entry(truth.to_string()).or_insert(0) += 1;
        }
    }

    /// Percentage in [0, 100]; 0 for an empty run.
    pub fn overall_accuracy(&self) -> f64 {
        percent(self.correct, self.total)
    }

    pub fn task_accuracy(&self, class: &str) -> f64 {
        let total = self.per_task_total.get(class).copied().unwrap_or(0);
        let correct = self.per_task_correct.get(class).copied().unwrap_or(0);
        percent(correct, total)
    }

    pub fn confusion_count(&self, truth: &str, predicted: &str) -> u64 {
        self.confusion
            .get(truth)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    /// `true\pred,<classes>` header, then one row per true class.
    pub fn confusion_csv(&self) -> String {
        let mut lines = vec![format!("true\\pred,{}", self.classes.join(","))];
        for truth in &self.classes {
            let mut row = vec![truth.clone()];
            row.extend(self.classes.iter().map(|pred| self.confusion_count(truth, pred).to_string()));
            lines.push(row.join(","));
        }
        lines.join("\n")
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Overall accuracy: {:.2}% ({}/{})",
            self.overall_accuracy(),
            self.correct,
            self.total
        )?;
        writeln!(f, "Per-task accuracy:")?;
        for class in &self.classes {
            writeln!(
                f,
                "  {:12} {:6.2}% ({}/{})",
                class,
                self.task_accuracy(class),
                self.per_task_correct.get(class).copied().unwrap_or(0),
                self.per_task_total.get(class).copied().unwrap_or(0)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Confusion matrix (CSV format):")?;
        write!(f, "{}", self.confusion_csv())
    }
}

fn percent(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64 * 100.0
    }
}

/// Runs every sample through `predict` in evaluation mode.
pub fn run_eval(classifier: &Classifier, samples: &[Sample], images_root: impl AsRef<Path>) -> Result<EvalReport> {
    let images_root = images_root.as_ref();
    let mut report = EvalReport::new(collect_class_names(samples));

    for sample in samples {
        let path = images_root.join(&sample.image);
        let image = image::open(&path).with_context(|| format!("opening {}", path.display()))?;
        let prediction = classifier
            .predict(&ImageInput::Decoded(image))
            .with_context(|| format!("classifying {}", path.display()))?;
        report.record(&sample.label, prediction.evaluation_label().as_str());
    }

    info!(
        total = report.total,
        correct = report.correct,
        accuracy = report.overall_accuracy(),
        "evaluation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accuracy_and_confusion() {
        let mut report = EvalReport::new(vec!["cooking".into(), "laundry".into()]);
        report.record("cooking", "cooking");
        report.record("cooking", "laundry");
        report.record("laundry", "laundry");
        report.record("laundry", "laundry");

        assert_eq!(report.overall_accuracy(), 75.0);
        assert_eq!(report.task_accuracy("cooking"), 50.0);
        assert_eq!(report.task_accuracy("laundry"), 100.0);
        assert_eq!(
            report.confusion_csv(),
            "true\\pred,cooking,laundry\ncooking,1,1\nlaundry,0,2"
        );
    }

    #[test]
    fn test_empty_report_is_zero() {
        let report = EvalReport::new(vec!["cooking".into()]);
        assert_eq!(report.overall_accuracy(), 0.0);
        assert!(report.to_string().starts_with("Overall accuracy: 0.00% (0/0)"));
    }
}
