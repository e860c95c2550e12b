use log::warn;
use ndarray::ArrayView2;

/// Replaces non positive curvatures in the two variable sub-problem.
const TAU: f64 = 1e-12;

/// The optimum of a binary C-SVC dual problem.
#[derive(Debug, Clone)]
pub(super) struct Solution {
    pub alpha: Vec<f64>,
    pub rho: f64,
    pub iterations: usize,
}

/// Sequential minimal optimization for the C-SVC dual
///
/// ```text
/// min 0.5 a'Qa - e'a   s.t.   0 <= a_i <= C,   y'a = 0
/// ```
///
/// where `Q_ij = y_i y_j K_ij`. The working set is chosen with second order information, picking
/// the maximal violating `i` and the `j` that most decreases the objective alongside it.
pub(super) struct Smo<'a> {
    k: ArrayView2<'a, f64>,
    y: &'a [f64],
    c: f64,
    tol: f64,

    alpha: Vec<f64>,
    grad: Vec<f64>,
}

impl<'a> Smo<'a> {
    /// Creates a new solver.
    ///
    /// # Arguments
    /// * `k` - The square kernel matrix of the training samples.
    /// * `y` - The labels of the training samples, either `1.0` or `-1.0`.
    /// * `c` - The upper bound of every multiplier.
    /// * `tol` - The stopping tolerance on the maximal KKT violation.
    pub fn new(k: ArrayView2<'a, f64>, y: &'a [f64], c: f64, tol: f64) -> Self {
        let n = y.len();

        Self {
            k,
            y,
            c,
            tol,
            alpha: vec![0.0; n],
            grad: vec![-1.0; n],
        }
    }

    /// Runs the optimization until the KKT conditions hold within `tol` or `max_iter` steps.
    pub fn solve(mut self, max_iter: usize) -> Solution {
        let mut iterations = 0;

        while iterations < max_iter {
            let Some((i, j)) = self.select_working_set() else {
                break;
            };

            self.update(i, j);
            iterations += 1;
        }

        if iterations == max_iter {
            warn!("reached the maximum of {max_iter} iterations before converging");
        }

        let rho = self.rho();
        Solution {
            alpha: self.alpha,
            rho,
            iterations,
        }
    }

    #[inline]
    fn q(&self, i: usize, j: usize) -> f64 {
        self.y[i] * self.y[j] * self.k[[i, j]]
    }

    #[inline]
    fn is_upper_bound(&self, i: usize) -> bool {
        self.alpha[i] >= self.c
    }

    #[inline]
    fn is_lower_bound(&self, i: usize) -> bool {
        self.alpha[i] <= 0.0
    }

    /// Returns the pair of multipliers to optimize next, or `None` if the current point is
    /// optimal.
    fn select_working_set(&self) -> Option<(usize, usize)> {
        let n = self.y.len();

        let mut g_max = f64::NEG_INFINITY;
        let mut i_idx = None;
        for t in 0..n {
            let violation = if self.y[t] > 0.0 {
                (!self.is_upper_bound(t)).then(|| -self.grad[t])
            } else {
                (!self.is_lower_bound(t)).then(|| self.grad[t])
            };

            match violation {
                Some(v) if v >= g_max => {
                    g_max = v;
                    i_idx = Some(t);
                }
                _ => {}
            }
        }

        let i = i_idx?;
        let mut g_max2 = f64::NEG_INFINITY;
        let mut j_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..n {
            let (violation, grad_diff, quad_coef) = if self.y[t] > 0.0 {
                if self.is_lower_bound(t) {
                    continue;
                }
                let quad = self.k[[i, i]] + self.k[[t, t]] - 2.0 * self.y[i] * self.q(i, t);
                (self.grad[t], g_max + self.grad[t], quad)
            } else {
                if self.is_upper_bound(t) {
                    continue;
                }
                let quad = self.k[[i, i]] + self.k[[t, t]] + 2.0 * self.y[i] * self.q(i, t);
                (-self.grad[t], g_max - self.grad[t], quad)
            };

            g_max2 = g_max2.max(violation);

            if grad_diff > 0.0 {
                let quad_coef = if quad_coef > 0.0 { quad_coef } else { TAU };
                let obj_diff = -(grad_diff * grad_diff) / quad_coef;

                if obj_diff <= obj_diff_min {
                    obj_diff_min = obj_diff;
                    j_idx = Some(t);
                }
            }
        }

        if g_max + g_max2 < self.tol {
            return None;
        }

        j_idx.map(|j| (i, j))
    }

    /// Solves the two variable sub-problem on `(i, j)` and updates the gradient.
    fn update(&mut self, i: usize, j: usize) {
        let c = self.c;
        let (old_i, old_j) = (self.alpha[i], self.alpha[j]);
        let q_ij = self.q(i, j);
        let (q_ii, q_jj) = (self.k[[i, i]], self.k[[j, j]]);

        if self.y[i] != self.y[j] {
            let quad_coef = positive_or_tau(q_ii + q_jj + 2.0 * q_ij);
            let delta = (-self.grad[i] - self.grad[j]) / quad_coef;
            let diff = old_i - old_j;
            let (mut a_i, mut a_j) = (old_i + delta, old_j + delta);

            if diff > 0.0 {
                if a_j < 0.0 {
                    a_j = 0.0;
                    a_i = diff;
                }
            } else if a_i < 0.0 {
                a_i = 0.0;
                a_j = -diff;
            }

            if diff > 0.0 {
                if a_i > c {
                    a_i = c;
                    a_j = c - diff;
                }
            } else if a_j > c {
                a_j = c;
                a_i = c + diff;
            }

            self.alpha[i] = a_i;
            self.alpha[j] = a_j;
        } else {
            let quad_coef = positive_or_tau(q_ii + q_jj - 2.0 * q_ij);
            let delta = (self.grad[i] - self.grad[j]) / quad_coef;
            let sum = old_i + old_j;
            let (mut a_i, mut a_j) = (old_i - delta, old_j + delta);

            if sum > c {
                if a_i > c {
                    a_i = c;
                    a_j = sum - c;
                }
            } else if a_j < 0.0 {
                a_j = 0.0;
                a_i = sum;
            }

            if sum > c {
                if a_j > c {
                    a_j = c;
                    a_i = sum - c;
                }
            } else if a_i < 0.0 {
                a_i = 0.0;
                a_j = sum;
            }

            self.alpha[i] = a_i;
            self.alpha[j] = a_j;
        }

        let delta_i = self.alpha[i] - old_i;
        let delta_j = self.alpha[j] - old_j;
        for t in 0..self.y.len() {
            self.grad[t] += self.q(i, t) * delta_i + self.q(j, t) * delta_j;
        }
    }

    /// Computes the bias from the free multipliers, or from the bounds if there are none.
    fn rho(&self) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut sum_free = 0.0;
        let mut n_free = 0usize;

        for t in 0..self.y.len() {
            let yg = self.y[t] * self.grad[t];

            if self.is_upper_bound(t) {
                if self.y[t] < 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else if self.is_lower_bound(t) {
                if self.y[t] > 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else {
                n_free += 1;
                sum_free += yg;
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (upper + lower) / 2.0
        }
    }
}

#[inline]
fn positive_or_tau(quad_coef: f64) -> f64 {
    if quad_coef > 0.0 { quad_coef } else { TAU }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::svc::Kernel;

    #[test]
    fn two_points_become_support_vectors() {
        let x = array![[0.0, 0.0], [2.0, 0.0]];
        let y = [1.0, -1.0];
        let k = Kernel::Rbf { gamma: 0.5 }.matrix(x.view(), x.view());

        let sol = Smo::new(k.view(), &y, 10.0, 1e-3).solve(1000);

        assert!(sol.alpha.iter().all(|a| *a > 0.0));
        // Equality constraint y'a = 0
        assert!((sol.alpha[0] - sol.alpha[1]).abs() < 1e-9);
        // Symmetric problem, the bias is zero.
        assert!(sol.rho.abs() < 1e-9);
    }

    #[test]
    fn multipliers_respect_the_box() {
        let x = array![[0.0], [0.1], [0.2], [1.0], [1.1], [0.15]];
        let y = [1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
        let c = 0.5;
        let k = Kernel::Rbf { gamma: 1.0 }.matrix(x.view(), x.view());

        let sol = Smo::new(k.view(), &y, c, 1e-3).solve(10_000);

        assert!(sol.alpha.iter().all(|a| (0.0..=c).contains(a)));
        let balance: f64 = sol.alpha.iter().zip(&y).map(|(a, y)| a * y).sum();
        assert!(balance.abs() < 1e-9);
    }
}
