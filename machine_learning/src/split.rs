use log::info;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{Dataset, MlErr, Result};

/// Tolerance used when checking that the fractions add up to one.
const FRACTION_EPS: f64 = 1e-9;

/// The share of samples assigned to each partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFractions")]
pub struct SplitFractions {
    train: f64,
    validation: f64,
    test: f64,
}

#[derive(Deserialize)]
struct RawFractions {
    train: f64,
    validation: f64,
    test: f64,
}

impl TryFrom<RawFractions> for SplitFractions {
    type Error = MlErr;

    fn try_from(raw: RawFractions) -> Result<Self> {
        Self::new(raw.train, raw.validation, raw.test)
    }
}

impl SplitFractions {
    /// Creates a new `SplitFractions`.
    ///
    /// # Errors
    /// Returns `MlErr::InvalidFractions` if any fraction is negative or not finite, or if they
    /// don't add up to one.
    pub fn new(train: f64, validation: f64, test: f64) -> Result<Self> {
        let fractions = [train, validation, test];
        let valid = fractions.iter().all(|f| f.is_finite() && *f >= 0.0)
            && (fractions.iter().sum::<f64>() - 1.0).abs() <= FRACTION_EPS;

        if !valid {
            return Err(MlErr::InvalidFractions {
                train,
                validation,
                test,
            });
        }

        Ok(Self {
            train,
            validation,
            test,
        })
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn validation(&self) -> f64 {
        self.validation
    }

    pub fn test(&self) -> f64 {
        self.test
    }
}

impl Default for SplitFractions {
    fn default() -> Self {
        Self {
            train: 0.8,
            validation: 0.1,
            test: 0.1,
        }
    }
}

/// Three disjoint subsets of a dataset.
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
}

/// Shuffles `0..n` and holds out `ceil(test_size * n)` of the indices.
///
/// # Returns
/// A tuple `(kept, held_out)` of disjoint index lists covering `0..n`.
pub fn train_test_split<R: Rng + ?Sized>(
    n: usize,
    test_size: f64,
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let n_test = ((test_size * n as f64).ceil().max(0.0) as usize).min(n);
    let held_out = indices.split_off(n - n_test);
    (indices, held_out)
}

/// Splits `dataset` into train, validation and test partitions with two successive shuffles.
///
/// The first split holds out `1 - train` of the samples. The second one splits that remainder
/// holding out `validation / (1 - train)` of it as the validation partition, what's left of it
/// becomes the test partition.
///
/// # Errors
/// Returns `MlErr::EmptyDataset` if there are no samples, or `MlErr::EmptyPartition` if any of
/// the resulting partitions would be empty.
pub fn split<R: Rng + ?Sized>(
    dataset: &Dataset,
    fractions: SplitFractions,
    rng: &mut R,
) -> Result<Partitions> {
    if dataset.is_empty() {
        return Err(MlErr::EmptyDataset);
    }

    let held_out = 1.0 - fractions.train();
    let (train_idx, rest_idx) = train_test_split(dataset.len(), held_out, rng);

    let validation_share = if held_out > 0.0 {
        fractions.validation() / held_out
    } else {
        0.0
    };
    let (test_pos, validation_pos) = train_test_split(rest_idx.len(), validation_share, rng);

    let test_idx: Vec<usize> = test_pos.into_iter().map(|p| rest_idx[p]).collect();
    let validation_idx: Vec<usize> = validation_pos.into_iter().map(|p| rest_idx[p]).collect();

    for (name, idx) in [
        ("train", &train_idx),
        ("validation", &validation_idx),
        ("test", &test_idx),
    ] {
        if idx.is_empty() {
            return Err(MlErr::EmptyPartition(name));
        }
    }

    info!(
        "split {} samples into {} train, {} validation and {} test",
        dataset.len(),
        train_idx.len(),
        validation_idx.len(),
        test_idx.len()
    );

    Ok(Partitions {
        train: dataset.select(&train_idx),
        validation: dataset.select(&validation_idx),
        test: dataset.select(&test_idx),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use ndarray::Array2;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    /// A dataset whose only feature is the sample's own index.
    fn indexed(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        Dataset::new(x, vec![0; n]).unwrap()
    }

    fn ids(ds: &Dataset) -> Vec<usize> {
        ds.x().column(0).iter().map(|v| *v as usize).collect()
    }

    #[test]
    fn fractions_must_add_up_to_one() {
        assert!(SplitFractions::new(0.8, 0.1, 0.1).is_ok());
        assert!(matches!(
            SplitFractions::new(0.8, 0.2, 0.1),
            Err(MlErr::InvalidFractions { .. })
        ));
        assert!(SplitFractions::new(1.2, -0.1, -0.1).is_err());
    }

    #[test]
    fn fractions_are_validated_when_deserialized() {
        let ok: std::result::Result<SplitFractions, _> =
            serde_json::from_str(r#"{"train": 0.6, "validation": 0.2, "test": 0.2}"#);
        assert!(ok.is_ok());

        let bad: std::result::Result<SplitFractions, _> =
            serde_json::from_str(r#"{"train": 0.6, "validation": 0.6, "test": 0.2}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn train_test_split_rounds_held_out_up() {
        let mut rng = StdRng::seed_from_u64(0);
        let (kept, held_out) = train_test_split(10, 0.25, &mut rng);
        assert_eq!(held_out.len(), 3);
        assert_eq!(kept.len(), 7);
    }

    #[test]
    fn partitions_cover_every_sample_exactly_once() {
        let ds = indexed(1797);
        let mut rng = StdRng::seed_from_u64(42);
        let parts = split(&ds, SplitFractions::default(), &mut rng).unwrap();

        let total = parts.train.len() + parts.validation.len() + parts.test.len();
        assert_eq!(total, ds.len());

        let mut seen = HashSet::new();
        for part in [&parts.train, &parts.validation, &parts.test] {
            for id in ids(part) {
                assert!(seen.insert(id), "sample {id} appears twice");
            }
        }
        assert_eq!(seen.len(), ds.len());
    }

    #[test]
    fn partition_sizes_follow_the_fractions() {
        let ds = indexed(100);
        let mut rng = StdRng::seed_from_u64(1);
        let parts = split(&ds, SplitFractions::default(), &mut rng).unwrap();

        assert_eq!(parts.train.len(), 80);
        assert_eq!(parts.validation.len() + parts.test.len(), 20);
        assert!(parts.validation.len().abs_diff(parts.test.len()) <= 2);
    }

    #[test]
    fn same_seed_same_partitions() {
        let ds = indexed(50);
        let a = split(&ds, SplitFractions::default(), &mut StdRng::seed_from_u64(7)).unwrap();
        let b = split(&ds, SplitFractions::default(), &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(ids(&a.train), ids(&b.train));
        assert_eq!(ids(&a.validation), ids(&b.validation));
        assert_eq!(ids(&a.test), ids(&b.test));
    }

    #[test]
    fn tiny_datasets_report_empty_partitions() {
        let ds = indexed(2);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            split(&ds, SplitFractions::default(), &mut rng),
            Err(MlErr::EmptyPartition(_))
        ));
    }

    #[test]
    fn empty_datasets_are_rejected() {
        let ds = indexed(0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            split(&ds, SplitFractions::default(), &mut rng),
            Err(MlErr::EmptyDataset)
        ));
    }
}
