use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::{MlErr, Result};

/// Gaussian kernels are truncated at this many standard deviations.
const TRUNCATE: f64 = 4.0;

/// Downscales every image by `divisor` along both spatial dimensions.
///
/// The output shape is `(rows / divisor, cols / divisor)` using integer division.
///
/// # Errors
/// Returns `MlErr::InvalidParam` if `divisor` is zero or larger than an image side.
pub fn downscale(images: ArrayView3<f64>, divisor: usize) -> Result<Array3<f64>> {
    let (_, rows, cols) = images.dim();
    if divisor == 0 || divisor > rows || divisor > cols {
        return Err(MlErr::InvalidParam {
            name: "resize divisor",
            value: divisor as f64,
        });
    }

    resize(images, (rows / divisor, cols / divisor), true)
}

/// Resizes every image to `shape` with bilinear interpolation.
///
/// When downsampling with `anti_aliasing`, each image is first smoothed with a gaussian filter of
/// `sigma = max(0, (scale - 1) / 2)` per axis. Samples that fall outside the image are mirrored
/// back in (`d c b | a b c d | c b a`).
///
/// # Arguments
/// * `images` - An array of shape `(n_samples, rows, cols)`.
/// * `shape` - The target `(rows, cols)`.
/// * `anti_aliasing` - Whether to smooth before downsampling.
pub fn resize(
    images: ArrayView3<f64>,
    (out_rows, out_cols): (usize, usize),
    anti_aliasing: bool,
) -> Result<Array3<f64>> {
    let (n, rows, cols) = images.dim();
    if out_rows == 0 || out_cols == 0 {
        return Err(MlErr::InvalidParam {
            name: "resize shape",
            value: 0.0,
        });
    }

    let scale_r = rows as f64 / out_rows as f64;
    let scale_c = cols as f64 / out_cols as f64;
    let sigma_r = if anti_aliasing { ((scale_r - 1.0) / 2.0).max(0.0) } else { 0.0 };
    let sigma_c = if anti_aliasing { ((scale_c - 1.0) / 2.0).max(0.0) } else { 0.0 };

    let mut out = Array3::zeros((n, out_rows, out_cols));
    for (image, mut target) in images.outer_iter().zip(out.outer_iter_mut()) {
        let smooth = gaussian_filter(image, sigma_r, sigma_c);

        for r in 0..out_rows {
            let y = (r as f64 + 0.5) * scale_r - 0.5;
            for c in 0..out_cols {
                let x = (c as f64 + 0.5) * scale_c - 0.5;
                target[[r, c]] = bilinear(smooth.view(), y, x);
            }
        }
    }

    Ok(out)
}

/// Flattens every image into a row of `rows * cols` values, in row-major order.
pub fn flatten(images: ArrayView3<f64>) -> Result<Array2<f64>> {
    let (n, rows, cols) = images.dim();
    let data = images.iter().copied().collect();
    Ok(Array2::from_shape_vec((n, rows * cols), data)?)
}

fn gaussian_filter(image: ArrayView2<f64>, sigma_r: f64, sigma_c: f64) -> Array2<f64> {
    let mut out = image.to_owned();

    if sigma_r > 0.0 {
        out = convolve_axis(out.view(), &gaussian_kernel(sigma_r), Axis(0));
    }
    if sigma_c > 0.0 {
        out = convolve_axis(out.view(), &gaussian_kernel(sigma_c), Axis(1));
    }

    out
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();

    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

fn convolve_axis(image: ArrayView2<f64>, kernel: &[f64], axis: Axis) -> Array2<f64> {
    let radius = (kernel.len() / 2) as isize;
    let len = image.len_of(axis);

    Array2::from_shape_fn(image.dim(), |(r, c)| {
        let center = (if axis == Axis(0) { r } else { c }) as isize;
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let idx = mirror(center + k as isize - radius, len);
                let px = if axis == Axis(0) { image[[idx, c]] } else { image[[r, idx]] };
                w * px
            })
            .sum()
    })
}

fn bilinear(image: ArrayView2<f64>, y: f64, x: f64) -> f64 {
    let (rows, cols) = image.dim();
    let y0 = y.floor();
    let x0 = x.floor();
    let (wy, wx) = (y - y0, x - x0);

    let (r0, r1) = (mirror(y0 as isize, rows), mirror(y0 as isize + 1, rows));
    let (c0, c1) = (mirror(x0 as isize, cols), mirror(x0 as isize + 1, cols));

    let top = image[[r0, c0]] * (1.0 - wx) + image[[r0, c1]] * wx;
    let bottom = image[[r1, c0]] * (1.0 - wx) + image[[r1, c1]] * wx;
    top * (1.0 - wy) + bottom * wy
}

/// Maps any index into `0..len` reflecting about the edge samples.
fn mirror(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }

    let period = 2 * (len as isize - 1);
    let idx = idx.rem_euclid(period);
    if idx < len as isize {
        idx as usize
    } else {
        (period - idx) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downscale_halves_both_sides() {
        let images = Array3::from_shape_fn((3, 8, 8), |(n, r, c)| (n + r + c) as f64);
        let resized = downscale(images.view(), 2).unwrap();
        assert_eq!(resized.dim(), (3, 4, 4));
    }

    #[test]
    fn downscale_uses_integer_division() {
        let images = Array3::<f64>::zeros((1, 8, 8));
        let resized = downscale(images.view(), 3).unwrap();
        assert_eq!(resized.dim(), (1, 2, 2));
    }

    #[test]
    fn downscale_rejects_zero_divisor() {
        let images = Array3::<f64>::zeros((1, 8, 8));
        assert!(matches!(
            downscale(images.view(), 0),
            Err(MlErr::InvalidParam { .. })
        ));
    }

    #[test]
    fn constant_images_stay_constant() {
        let images = Array3::from_elem((2, 8, 8), 7.0);
        let resized = downscale(images.view(), 2).unwrap();
        assert!(resized.iter().all(|v| (v - 7.0).abs() < 1e-9));
    }

    #[test]
    fn resize_without_scaling_is_identity() {
        let images = Array3::from_shape_fn((1, 4, 4), |(_, r, c)| (r * 4 + c) as f64);
        let resized = resize(images.view(), (4, 4), true).unwrap();
        assert_eq!(resized, images);
    }

    #[test]
    fn flatten_is_row_major() {
        let images = Array3::from_shape_fn((2, 2, 3), |(n, r, c)| (n * 100 + r * 10 + c) as f64);
        let flat = flatten(images.view()).unwrap();

        assert_eq!(flat.dim(), (2, 6));
        assert_eq!(flat.row(1).to_vec(), vec![100.0, 101.0, 102.0, 110.0, 111.0, 112.0]);
    }

    #[test]
    fn mirror_reflects_about_edges() {
        assert_eq!(mirror(-1, 4), 1);
        assert_eq!(mirror(4, 4), 2);
        assert_eq!(mirror(2, 4), 2);
        assert_eq!(mirror(5, 1), 0);
    }
}
