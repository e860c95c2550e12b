use std::fmt;

use machine_learning::SvcParams;

use crate::{Result, SweepErr};

/// One cell of the hyperparameter grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperParams {
    pub gamma: f64,
    pub c: f64,
}

impl HyperParams {
    pub fn svc_params(&self) -> SvcParams {
        SvcParams::new(self.gamma, self.c)
    }
}

impl fmt::Display for HyperParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gamma={}, C={}", self.gamma, self.c)
    }
}

/// Returns the Cartesian product of `gammas` and `cs`, for every gamma every C.
///
/// # Errors
/// Returns `SweepErr::EmptyGrid` if either list is empty.
pub fn grid(gammas: &[f64], cs: &[f64]) -> Result<Vec<HyperParams>> {
    if gammas.is_empty() || cs.is_empty() {
        return Err(SweepErr::EmptyGrid);
    }

    let combinations: Vec<HyperParams> = gammas
        .iter()
        .flat_map(|&gamma| cs.iter().map(move |&c| HyperParams { gamma, c }))
        .collect();

    debug_assert_eq!(combinations.len(), gammas.len() * cs.len());
    Ok(combinations)
}
