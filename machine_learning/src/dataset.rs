use std::{fs, path::Path};

use log::info;
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::{MlErr, Result};

/// A stack of grayscale images, each paired with the digit it depicts.
#[derive(Debug, Clone)]
pub struct LabeledImages {
    images: Array3<f64>,
    targets: Vec<usize>,
}

impl LabeledImages {
    /// Creates a new `LabeledImages`.
    ///
    /// # Arguments
    /// * `images` - An array of shape `(n_samples, rows, cols)`.
    /// * `targets` - One label per image.
    ///
    /// # Errors
    /// Returns `MlErr::SizeMismatch` if there isn't exactly one label per image.
    pub fn new(images: Array3<f64>, targets: Vec<usize>) -> Result<Self> {
        if images.len_of(Axis(0)) != targets.len() {
            return Err(MlErr::SizeMismatch {
                a: "images",
                b: "targets",
                got: targets.len(),
                expected: images.len_of(Axis(0)),
            });
        }

        Ok(Self { images, targets })
    }

    /// Loads the images from a CSV file.
    ///
    /// Every non blank line holds `rows * cols` intensities in row-major order followed by the
    /// label, which is the layout of the UCI optdigits files.
    ///
    /// # Arguments
    /// * `path` - The path of the CSV file.
    /// * `shape` - The `(rows, cols)` of every image.
    pub fn load_csv<P: AsRef<Path>>(path: P, shape: (usize, usize)) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let images = Self::parse_csv(&content, shape)?;

        info!(
            "loaded {} images of {}x{} from {}",
            images.len(),
            shape.0,
            shape.1,
            path.display()
        );
        Ok(images)
    }

    /// Parses CSV content, see `load_csv`.
    pub fn parse_csv(content: &str, (rows, cols): (usize, usize)) -> Result<Self> {
        let pixels = rows * cols;
        let mut data = Vec::new();
        let mut targets = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = idx + 1;
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let values = raw
                .split(',')
                .map(|field| {
                    field.trim().parse::<f64>().map_err(|e| MlErr::Parse {
                        line,
                        msg: format!("'{}': {e}", field.trim()),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            if values.len() != pixels + 1 {
                return Err(MlErr::Parse {
                    line,
                    msg: format!("expected {} fields, got {}", pixels + 1, values.len()),
                });
            }

            let label = values[pixels];
            if label < 0.0 || label.fract() != 0.0 {
                return Err(MlErr::Parse {
                    line,
                    msg: format!("the label must be a non-negative integer, got {label}"),
                });
            }

            data.extend_from_slice(&values[..pixels]);
            targets.push(label as usize);
        }

        let images = Array3::from_shape_vec((targets.len(), rows, cols), data)?;
        Self::new(images, targets)
    }

    pub fn images(&self) -> ArrayView3<'_, f64> {
        self.images.view()
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns the `(n_samples, rows, cols)` shape of the image stack.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.images.dim()
    }
}

/// A labeled feature matrix, one flattened sample per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f64>,
    y: Vec<usize>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Errors
    /// Returns `MlErr::SizeMismatch` if `x` doesn't have one row per label.
    pub fn new(x: Array2<f64>, y: Vec<usize>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(MlErr::SizeMismatch {
                a: "samples",
                b: "labels",
                got: y.len(),
                expected: x.nrows(),
            });
        }

        Ok(Self { x, y })
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> &[usize] {
        &self.y
    }

    pub fn sample(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.x.row(idx)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Builds a new dataset with the rows at `indices`, in that order.
    ///
    /// # Panics
    /// If any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn parse_csv_reads_pixels_and_labels() {
        let content = "0,1,2,3,7\n\n4,5,6,7,1\n";
        let images = LabeledImages::parse_csv(content, (2, 2)).unwrap();

        assert_eq!(images.shape(), (2, 2, 2));
        assert_eq!(images.targets(), &[7, 1]);
        assert_eq!(images.images()[[1, 0, 1]], 5.0);
    }

    #[test]
    fn parse_csv_rejects_short_lines() {
        let err = LabeledImages::parse_csv("0,1,2,3,7\n0,1,2\n", (2, 2)).unwrap_err();
        assert!(matches!(err, MlErr::Parse { line: 2, .. }));
    }

    #[test]
    fn parse_csv_rejects_fractional_labels() {
        let err = LabeledImages::parse_csv("0,1,2,3,7.5\n", (2, 2)).unwrap_err();
        assert!(matches!(err, MlErr::Parse { line: 1, .. }));
    }

    #[test]
    fn dataset_requires_one_label_per_row() {
        let err = Dataset::new(array![[1.0, 2.0], [3.0, 4.0]], vec![0]).unwrap_err();
        assert!(matches!(err, MlErr::SizeMismatch { got: 1, expected: 2, .. }));
    }

    #[test]
    fn select_keeps_rows_and_labels_together() {
        let ds = Dataset::new(array![[0.0], [1.0], [2.0]], vec![5, 6, 7]).unwrap();
        let sub = ds.select(&[2, 0]);

        assert_eq!(sub.x(), array![[2.0], [0.0]]);
        assert_eq!(sub.y(), &[7, 5]);
    }
}
