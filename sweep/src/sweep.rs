use log::info;
use machine_learning::{
    Classifier, Dataset, LabeledImages, Svc,
    metrics::{self, ClassificationReport},
    preprocessing,
    split::{self, Partitions},
};
use ndarray::Array3;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Result, SweepErr,
    config::{FlattenSource, SweepConfig},
    grid::{self, HyperParams},
    report::{BestRun, ResultsTable, Selection, SweepRow},
};

/// The images fed to the sweep, after preprocessing.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub resized: Array3<f64>,
    pub dataset: Dataset,
}

/// Everything a finished sweep produced.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub table: ResultsTable,
    pub best: BestRun,
    pub model: Svc,
}

/// Builds the sweep's random generator, seeded if `seed` is set and from OS entropy otherwise.
pub fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Downscales `images` by the configured divisor and flattens the images selected by
/// `config.flatten` into a feature matrix.
///
/// # Errors
/// Returns an error if the divisor doesn't fit the images.
pub fn prepare(images: &LabeledImages, config: &SweepConfig) -> Result<Prepared> {
    let resized = preprocessing::downscale(images.images(), config.resize_divisor)?;
    info!(
        "resized images from {:?} to {:?}",
        images.shape(),
        resized.dim()
    );

    let x = match config.flatten {
        FlattenSource::Original => preprocessing::flatten(images.images())?,
        FlattenSource::Resized => preprocessing::flatten(resized.view())?,
    };
    let dataset = Dataset::new(x, images.targets().to_vec())?;

    Ok(Prepared { resized, dataset })
}

fn accuracies(model: &Svc, parts: &Partitions) -> Result<[f64; 3]> {
    let score = |part: &Dataset| -> Result<f64> {
        let y_pred = model.predict_all(part.x())?;
        Ok(metrics::accuracy(part.y(), &y_pred)?)
    };

    Ok([
        score(&parts.train)?,
        score(&parts.validation)?,
        score(&parts.test)?,
    ])
}

/// Splits `dataset`, fits a classifier for every combination of the grid and keeps the one with
/// the best validation accuracy.
///
/// # Arguments
/// * `dataset` - The flattened samples.
/// * `config` - The grid and the split fractions.
/// * `rng` - The random generator used to shuffle the partitions.
///
/// # Returns
/// The table with a row per combination, the final evaluation of the best one and its model.
///
/// # Errors
/// Returns `SweepErr::EmptyGrid` if there are no combinations, or any error from splitting,
/// fitting or scoring.
pub fn run<R: rand::Rng + ?Sized>(
    dataset: &Dataset,
    config: &SweepConfig,
    rng: &mut R,
) -> Result<SweepOutcome> {
    let combinations = grid::grid(&config.gammas, &config.cs)?;
    let parts = split::split(dataset, config.fractions, rng)?;

    let mut table = ResultsTable::new();
    let mut selection: Selection<Svc> = Selection::new();

    for params in combinations {
        let model = Svc::fit(params.svc_params(), &parts.train)?;
        let [train, validation, test] = accuracies(&model, &parts)?;
        info!("{params}: train={train:.5} validation={validation:.5} test={test:.5}");

        table.push(SweepRow::new(params, train, validation, test));
        selection.observe(params, validation, model);
    }

    let best = selection.into_best().ok_or(SweepErr::EmptyGrid)?;
    let best_run = evaluate(best.params, &best.candidate, &parts)?;

    Ok(SweepOutcome {
        table,
        best: best_run,
        model: best.candidate,
    })
}

fn evaluate(params: HyperParams, model: &Svc, parts: &Partitions) -> Result<BestRun> {
    let [train, validation, test] = accuracies(model, parts)?;
    let y_pred = model.predict_all(parts.test.x())?;
    let report = ClassificationReport::new(parts.test.y(), &y_pred)?;

    Ok(BestRun {
        params,
        train,
        validation,
        test,
        report,
    })
}
