use std::fmt::{self, Display};

use crate::{MlErr, Result};

/// Name column width of the report, the length of `weighted avg`.
const NAME_WIDTH: usize = 12;

/// Returns the fraction of predictions that exactly match their label.
///
/// # Errors
/// Returns `MlErr::SizeMismatch` if the sequences have different lengths, or
/// `MlErr::EmptyDataset` if they are empty.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(hits as f64 / y_true.len() as f64)
}

fn check_lengths(y_true: &[usize], y_pred: &[usize]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(MlErr::SizeMismatch {
            a: "predictions",
            b: "labels",
            got: y_pred.len(),
            expected: y_true.len(),
        });
    }
    if y_true.is_empty() {
        return Err(MlErr::EmptyDataset);
    }

    Ok(())
}

/// Precision, recall and F1 score of a single class (or an average of them).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per class precision, recall and F1 summary of a set of predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    classes: Vec<(usize, ClassMetrics)>,
    accuracy: f64,
    macro_avg: ClassMetrics,
    weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Builds the report over every label present in either `y_true` or `y_pred`.
    ///
    /// Ratios with a zero denominator are reported as `0.0`.
    ///
    /// # Errors
    /// Same as `accuracy`.
    pub fn new(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        check_lengths(y_true, y_pred)?;

        let mut labels: Vec<usize> = y_true.iter().chain(y_pred).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let classes: Vec<(usize, ClassMetrics)> = labels
            .iter()
            .map(|&label| {
                let pairs = || y_true.iter().zip(y_pred);
                let tp = pairs().filter(|&(t, p)| *t == label && *p == label).count();
                let predicted = y_pred.iter().filter(|&&p| p == label).count();
                let support = y_true.iter().filter(|&&t| t == label).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                let metrics = ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                };
                (label, metrics)
            })
            .collect();

        let total = y_true.len();
        let n = classes.len() as f64;
        let macro_avg = ClassMetrics {
            precision: classes.iter().map(|(_, m)| m.precision).sum::<f64>() / n,
            recall: classes.iter().map(|(_, m)| m.recall).sum::<f64>() / n,
            f1: classes.iter().map(|(_, m)| m.f1).sum::<f64>() / n,
            support: total,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|(_, m)| f(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Ok(Self {
            accuracy: accuracy(y_true, y_pred)?,
            classes,
            macro_avg,
            weighted_avg,
        })
    }

    /// Returns the metrics of `label`, if it appeared in the labels or predictions.
    pub fn class(&self, label: usize) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, m)| m)
    }

    pub fn classes(&self) -> impl Iterator<Item = (usize, &ClassMetrics)> {
        self.classes.iter().map(|(l, m)| (*l, m))
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn macro_avg(&self) -> &ClassMetrics {
        &self.macro_avg
    }

    pub fn weighted_avg(&self) -> &ClassMetrics {
        &self.weighted_avg
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{name:>NAME_WIDTH$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
        m.precision, m.recall, m.f1, m.support
    )
}

impl Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>NAME_WIDTH$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for (label, metrics) in &self.classes {
            write_row(f, &label.to_string(), metrics)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>NAME_WIDTH$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}
