mod kernel;
mod solver;

use std::collections::BTreeMap;

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

pub use kernel::Kernel;
use solver::Smo;

use crate::{Classifier, Dataset, MlErr, Result};

/// The hyperparameters of a `Svc`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvcParams {
    gamma: f64,
    c: f64,
    tol: f64,
    max_iter: Option<usize>,
}

impl SvcParams {
    /// Returns a new `SvcParams` for an RBF kernel.
    ///
    /// # Arguments
    /// * `gamma` - The kernel width.
    /// * `c` - The regularization strength, the upper bound of every dual multiplier.
    pub fn new(gamma: f64, c: f64) -> Self {
        Self {
            gamma,
            c,
            tol: 1e-3,
            max_iter: None,
        }
    }

    /// Sets the stopping tolerance of the solver.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Caps the solver iterations of every binary machine.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("gamma", self.gamma), ("C", self.c), ("tol", self.tol)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MlErr::InvalidParam { name, value });
            }
        }

        Ok(())
    }
}

/// One binary machine of the one-vs-one ensemble, separating `positive` from `negative`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BinaryMachine {
    positive: usize,
    negative: usize,
    /// `(support vector index, y * alpha)` pairs.
    coef: Vec<(usize, f64)>,
    rho: f64,
}

impl BinaryMachine {
    /// `f(x) = sum(y_i * alpha_i * k(x_i, x)) - rho`, given the kernel between `x` and every
    /// support vector.
    fn decision(&self, k: &Array1<f64>) -> f64 {
        self.coef.iter().map(|&(sv, coef)| coef * k[sv]).sum::<f64>() - self.rho
    }
}

/// A multiclass C-support vector classifier built from one-vs-one binary machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSvc")]
pub struct Svc {
    kernel: Kernel,
    c: f64,
    classes: Vec<usize>,
    support_vectors: Array2<f64>,
    machines: Vec<BinaryMachine>,
}

#[derive(Deserialize)]
struct RawSvc {
    kernel: Kernel,
    c: f64,
    classes: Vec<usize>,
    support_vectors: Array2<f64>,
    machines: Vec<BinaryMachine>,
}

impl TryFrom<RawSvc> for Svc {
    type Error = MlErr;

    /// Checks that a deserialized model can vote without indexing out of bounds.
    fn try_from(raw: RawSvc) -> Result<Self> {
        let invalid = |msg: String| Err(MlErr::InvalidModel(msg));
        let k = raw.classes.len();

        if k < 2 {
            return invalid(format!("expected at least 2 classes, got {k}"));
        }
        if raw.classes.windows(2).any(|w| w[0] >= w[1]) {
            return invalid(format!("classes must be strictly ascending, got {:?}", raw.classes));
        }
        if raw.machines.len() != k * (k - 1) / 2 {
            return invalid(format!(
                "{k} classes need {} binary machines, got {}",
                k * (k - 1) / 2,
                raw.machines.len()
            ));
        }

        let n_sv = raw.support_vectors.nrows();
        for machine in &raw.machines {
            let (p, n) = (machine.positive, machine.negative);
            if p >= k || n >= k || p == n {
                return invalid(format!(
                    "machine {p} vs {n} doesn't name two of the {k} classes"
                ));
            }
            if let Some(&(sv, _)) = machine.coef.iter().find(|(sv, _)| *sv >= n_sv) {
                return invalid(format!("support vector {sv} out of range, the model has {n_sv}"));
            }
        }

        Ok(Self {
            kernel: raw.kernel,
            c: raw.c,
            classes: raw.classes,
            support_vectors: raw.support_vectors,
            machines: raw.machines,
        })
    }
}

impl Svc {
    /// Fits a new classifier on `dataset`.
    ///
    /// Classes are sorted ascending and a binary machine is trained for every pair `(i, j)` with
    /// `i < j`, labelling class `i` as positive.
    ///
    /// # Errors
    /// Returns `MlErr::InvalidParam` for non positive hyperparameters, `MlErr::EmptyDataset` if
    /// there are no samples and `MlErr::SingleClass` if there's only one label.
    pub fn fit(params: SvcParams, dataset: &Dataset) -> Result<Self> {
        params.validate()?;
        if dataset.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        let classes = sorted_classes(dataset.y());
        if classes.len() < 2 {
            return Err(MlErr::SingleClass { class: classes[0] });
        }

        let kernel = Kernel::Rbf {
            gamma: params.gamma,
        };
        let x = dataset.x();
        let gram = kernel.matrix(x, x);
        let max_iter = params
            .max_iter
            .unwrap_or_else(|| 10_000_000usize.max(100 * dataset.len()));

        let by_class: Vec<Vec<usize>> = classes
            .iter()
            .map(|&class| {
                let y = dataset.y();
                (0..y.len()).filter(|&i| y[i] == class).collect()
            })
            .collect();

        // Maps sample indices to their position in the support vector matrix.
        let mut sv_index: BTreeMap<usize, usize> = BTreeMap::new();
        let mut machines = Vec::with_capacity(classes.len() * (classes.len() - 1) / 2);

        for p in 0..classes.len() {
            for n in p + 1..classes.len() {
                let members: Vec<usize> = by_class[p].iter().chain(&by_class[n]).copied().collect();
                let y: Vec<f64> = (0..members.len())
                    .map(|i| if i < by_class[p].len() { 1.0 } else { -1.0 })
                    .collect();

                let k = gram.select(Axis(0), &members).select(Axis(1), &members);
                let solution = Smo::new(k.view(), &y, params.c, params.tol).solve(max_iter);

                let mut coef = Vec::new();
                for (pos, &alpha) in solution.alpha.iter().enumerate() {
                    if alpha > 0.0 {
                        let next = sv_index.len();
                        let sv = *sv_index.entry(members[pos]).or_insert(next);
                        coef.push((sv, y[pos] * alpha));
                    }
                }

                debug!(
                    "machine {} vs {}: {} support vectors after {} iterations",
                    classes[p],
                    classes[n],
                    coef.len(),
                    solution.iterations
                );

                machines.push(BinaryMachine {
                    positive: p,
                    negative: n,
                    coef,
                    rho: solution.rho,
                });
            }
        }

        let mut order = vec![0; sv_index.len()];
        for (&sample, &sv) in &sv_index {
            order[sv] = sample;
        }
        let support_vectors = x.select(Axis(0), &order);

        info!(
            "fitted svc with gamma={} C={}: {} classes, {} support vectors",
            params.gamma,
            params.c,
            classes.len(),
            support_vectors.nrows()
        );

        Ok(Self {
            kernel,
            c: params.c,
            classes,
            support_vectors,
            machines,
        })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.nrows()
    }

    fn vote(&self, sample: ArrayView1<f64>) -> usize {
        let k = self
            .support_vectors
            .rows()
            .into_iter()
            .map(|sv| self.kernel.compute(sv, sample))
            .collect::<Array1<f64>>();

        let mut votes = vec![0usize; self.classes.len()];
        for machine in &self.machines {
            if machine.decision(&k) > 0.0 {
                votes[machine.positive] += 1;
            } else {
                votes[machine.negative] += 1;
            }
        }

        // Ties go to the smallest class.
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }

        self.classes[best]
    }
}

impl Classifier for Svc {
    fn n_features(&self) -> usize {
        Svc::n_features(self)
    }

    fn predict(&self, sample: ArrayView1<f64>) -> Result<usize> {
        if sample.len() != self.n_features() {
            return Err(MlErr::SizeMismatch {
                a: "sample",
                b: "model features",
                got: sample.len(),
                expected: self.n_features(),
            });
        }

        Ok(self.vote(sample))
    }
}

fn sorted_classes(y: &[usize]) -> Vec<usize> {
    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}
