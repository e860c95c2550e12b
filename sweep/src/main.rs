use anyhow::Context;
use log::info;
use machine_learning::{LabeledImages, ModelArtifact};
use sweep::{SweepConfig, preview::preview};

const PREVIEW_IMAGES: usize = 4;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = SweepConfig::load()?;
    let images = LabeledImages::load_csv(&config.dataset, config.image_shape)
        .with_context(|| format!("loading dataset {}", config.dataset.display()))?;

    let prepared = sweep::prepare(&images, &config)?;
    println!("original image shape: {:?}", images.shape());
    println!("resized image shape: {:?}", prepared.resized.dim());
    println!();
    println!("{}", preview(&images, PREVIEW_IMAGES));

    let mut rng = sweep::sweep::rng(config.seed);
    let outcome = sweep::run(&prepared.dataset, &config, &mut rng)?;

    println!("{}", outcome.table);
    println!();
    println!("{}", outcome.best);

    if let Some(path) = &config.model_out {
        ModelArtifact::from(outcome.model)
            .save(path)
            .with_context(|| format!("saving model to {}", path.display()))?;
        info!("best model saved to {}", path.display());
    }

    Ok(())
}
