use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// The kernel functions a `Svc` can use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Kernel {
    /// `k(a, b) = exp(-gamma * ||a - b||^2)`
    Rbf { gamma: f64 },
}

impl Kernel {
    /// Evaluates the kernel on a single pair of samples.
    pub fn compute(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match *self {
            Kernel::Rbf { gamma } => {
                let sq_dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * sq_dist).exp()
            }
        }
    }

    /// Computes the kernel between every row of `a` and every row of `b`.
    ///
    /// # Returns
    /// A matrix of shape `(a.nrows(), b.nrows())`.
    pub fn matrix(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
        match *self {
            Kernel::Rbf { gamma } => {
                let a_sq = squared_norms(a);
                let b_sq = squared_norms(b);

                let mut k = a.dot(&b.t());
                for ((i, j), v) in k.indexed_iter_mut() {
                    let sq_dist = (a_sq[i] + b_sq[j] - 2.0 * *v).max(0.0);
                    *v = (-gamma * sq_dist).exp();
                }

                k
            }
        }
    }
}

fn squared_norms(x: ArrayView2<f64>) -> Array1<f64> {
    x.map_axis(Axis(1), |row| row.dot(&row))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn rbf_of_identical_samples_is_one() {
        let k = Kernel::Rbf { gamma: 0.5 };
        let a = array![1.0, 2.0, 3.0];
        assert_eq!(k.compute(a.view(), a.view()), 1.0);
    }

    #[test]
    fn matrix_matches_pairwise_evaluation() {
        let k = Kernel::Rbf { gamma: 0.1 };
        let a = array![[0.0, 1.0], [2.0, 3.0], [4.0, -1.0]];
        let b = array![[1.0, 1.0], [0.0, -2.0]];

        let m = k.matrix(a.view(), b.view());
        assert_eq!(m.dim(), (3, 2));
        for i in 0..3 {
            for j in 0..2 {
                let expected = k.compute(a.row(i), b.row(j));
                assert!((m[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }
}
