use std::fmt;

use machine_learning::metrics::ClassificationReport;
use tabled::{
    builder::Builder as TableBuilder,
    settings::{Alignment, Style as TableStyle, object::Segment},
};

use crate::grid::HyperParams;

/// Decimal digits kept for the accuracies of every row.
const DIGITS: i32 = 5;

const HEADERS: [&str; 4] = [
    "Hyperparameters",
    "Train Accuracy",
    "Validation Accuracy",
    "Test Accuracy",
];

/// The accuracies obtained with a single combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRow {
    pub params: HyperParams,
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl SweepRow {
    /// Creates a new row, rounding every accuracy to five decimal digits.
    pub fn new(params: HyperParams, train: f64, validation: f64, test: f64) -> Self {
        Self {
            params,
            train: round(train),
            validation: round(validation),
            test: round(test),
        }
    }

    fn cells(&self) -> [String; 4] {
        let digits = DIGITS as usize;
        [
            self.params.to_string(),
            format!("{:.digits$}", self.train),
            format!("{:.digits$}", self.validation),
            format!("{:.digits$}", self.test),
        ]
    }
}

fn round(value: f64) -> f64 {
    let scale = 10f64.powi(DIGITS);
    (value * scale).round() / scale
}

/// Every row of a sweep, in the order the combinations were evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    rows: Vec<SweepRow>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: SweepRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[SweepRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ResultsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = TableBuilder::default();
        builder.push_record(HEADERS);
        for row in &self.rows {
            builder.push_record(row.cells());
        }

        let mut table = builder.build();
        table.with(TableStyle::ascii());
        table.modify(Segment::all(), Alignment::center());
        write!(f, "{table}")
    }
}

/// The best candidate seen by a `Selection`.
#[derive(Debug, Clone, PartialEq)]
pub struct Best<T> {
    pub params: HyperParams,
    pub validation: f64,
    pub candidate: T,
}

/// Keeps the combination with the strictly greatest validation accuracy.
///
/// Ties keep the earlier combination.
#[derive(Debug, Clone)]
pub struct Selection<T> {
    best: Option<Best<T>>,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self { best: None }
    }
}

impl<T> Selection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a new candidate.
    ///
    /// # Returns
    /// Whether it replaced the current best.
    pub fn observe(&mut self, params: HyperParams, validation: f64, candidate: T) -> bool {
        let better = match &self.best {
            Some(best) => validation > best.validation,
            None => true,
        };

        if better {
            self.best = Some(Best {
                params,
                validation,
                candidate,
            });
        }

        better
    }

    pub fn best(&self) -> Option<&Best<T>> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<Best<T>> {
        self.best
    }
}

/// The final evaluation of the selected combination.
#[derive(Debug, Clone, PartialEq)]
pub struct BestRun {
    pub params: HyperParams,
    pub train: f64,
    pub validation: f64,
    pub test: f64,
    pub report: ClassificationReport,
}

impl fmt::Display for BestRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Best hyperparameters were:")?;
        writeln!(f, "{}", self.params)?;
        writeln!(f, "-----------------------------")?;
        writeln!(f, "Training accuracy with the best hyperparameters {}", self.train)?;
        writeln!(f, "Validation accuracy with the best hyperparameters {}", self.validation)?;
        writeln!(f, "Test accuracy with the best hyperparameters {}", self.test)?;
        writeln!(f)?;
        writeln!(f, "Classification report for the test partition, SVC({}):", self.params)?;
        write!(f, "{}", self.report)
    }
}
