use machine_learning::LabeledImages;
use ndarray::{ArrayView2, Axis};

/// Darkest to brightest.
const RAMP: &[u8] = b" .:-=+*#%@";
const GAP: &str = "   ";

/// Renders the first `count` images side by side, each titled `Training: <label>`.
///
/// Intensities are scaled against the brightest pixel of each image.
pub fn preview(images: &LabeledImages, count: usize) -> String {
    let count = count.min(images.len());
    if count == 0 {
        return String::new();
    }

    let (_, rows, cols) = images.shape();
    let tiles: Vec<(String, Vec<String>)> = (0..count)
        .map(|i| {
            let title = format!("Training: {}", images.targets()[i]);
            let image = images.images().index_axis_move(Axis(0), i);
            (title, render(image))
        })
        .collect();

    let width = tiles
        .iter()
        .map(|(title, _)| title.len())
        .max()
        .unwrap_or(0)
        .max(cols);

    let mut out = String::new();
    push_line(&mut out, tiles.iter().map(|(title, _)| title.as_str()), width);
    for r in 0..rows {
        push_line(&mut out, tiles.iter().map(|(_, lines)| lines[r].as_str()), width);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, width: usize) {
    let line = cells
        .map(|cell| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(GAP);
    out.push_str(line.trim_end());
    out.push('\n');
}

fn render(image: ArrayView2<f64>) -> Vec<String> {
    let max = image.iter().copied().fold(0.0_f64, f64::max);
    let last = (RAMP.len() - 1) as f64;

    image
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|&v| {
                    let level = if max > 0.0 {
                        (v.max(0.0) / max * last).round() as usize
                    } else {
                        0
                    };
                    RAMP[level.min(RAMP.len() - 1)] as char
                })
                .collect()
        })
        .collect()
}
