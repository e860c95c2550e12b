use std::{env, fs, path::PathBuf};

use log::info;
use machine_learning::split::SplitFractions;
use serde::Deserialize;

use crate::{Result, SweepErr};

/// Path of an optional JSON file with the sweep configuration.
pub const CONFIG_VAR: &str = "DIGITS_SWEEP_CONFIG";
pub const DATASET_VAR: &str = "DIGITS_DATASET";
pub const SEED_VAR: &str = "DIGITS_SEED";
pub const MODEL_OUT_VAR: &str = "DIGITS_MODEL_OUT";

/// Which images are flattened into the feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenSource {
    /// The images as loaded. The resized ones are computed and reported but not trained on.
    #[default]
    Original,
    /// The downscaled images.
    Resized,
}

/// Everything a sweep run needs to know.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub dataset: PathBuf,
    pub image_shape: (usize, usize),
    pub resize_divisor: usize,
    pub flatten: FlattenSource,
    pub gammas: Vec<f64>,
    pub cs: Vec<f64>,
    pub fractions: SplitFractions,
    pub seed: Option<u64>,
    pub model_out: Option<PathBuf>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/digits.csv"),
            image_shape: (8, 8),
            resize_divisor: 2,
            flatten: FlattenSource::Original,
            gammas: vec![0.01, 0.005, 0.001, 0.0005, 0.0001],
            cs: vec![0.1, 0.5, 0.7, 1.0, 2.0],
            fractions: SplitFractions::default(),
            seed: None,
            model_out: None,
        }
    }
}

impl SweepConfig {
    /// Builds the configuration from the defaults, then the JSON file at `DIGITS_SWEEP_CONFIG`
    /// if set, then the `DIGITS_DATASET`, `DIGITS_SEED` and `DIGITS_MODEL_OUT` variables.
    pub fn load() -> Result<Self> {
        let config = match env::var(CONFIG_VAR) {
            Ok(path) => {
                info!("reading sweep config from {path}");
                let content = fs::read_to_string(&path)?;
                Self::from_json(&content)?
            }
            Err(_) => Self::default(),
        };

        config.with_overrides(|key| env::var(key).ok())
    }

    /// Parses a JSON document, missing fields keep their default value.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| SweepErr::Config(e.to_string()))
    }

    /// Applies the variable overrides, `lookup` returns the value of a variable if it's set.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dataset) = lookup(DATASET_VAR) {
            self.dataset = PathBuf::from(dataset);
        }

        if let Some(seed) = lookup(SEED_VAR) {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|e| SweepErr::Config(format!("{SEED_VAR}='{seed}': {e}")))?;
            self.seed = Some(seed);
        }

        if let Some(out) = lookup(MODEL_OUT_VAR) {
            self.model_out = Some(PathBuf::from(out));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_the_reference_grid() {
        let config = SweepConfig::default();
        assert_eq!(config.gammas.len(), 5);
        assert_eq!(config.cs, vec![0.1, 0.5, 0.7, 1.0, 2.0]);
        assert_eq!(config.fractions.train(), 0.8);
        assert_eq!(config.flatten, FlattenSource::Original);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn json_fields_are_optional() {
        let config = SweepConfig::from_json(r#"{"seed": 3, "flatten": "resized"}"#).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.flatten, FlattenSource::Resized);
        assert_eq!(config.resize_divisor, 2);
    }

    #[test]
    fn json_rejects_bad_fractions_and_unknown_fields() {
        let bad = r#"{"fractions": {"train": 0.5, "validation": 0.1, "test": 0.1}}"#;
        assert!(matches!(SweepConfig::from_json(bad), Err(SweepErr::Config(_))));
        assert!(SweepConfig::from_json(r#"{"gama": [1.0]}"#).is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            (DATASET_VAR, "/tmp/optdigits.csv"),
            (SEED_VAR, "42"),
            (MODEL_OUT_VAR, "models/best.json"),
        ]
        .into();

        let config = SweepConfig::from_json(r#"{"seed": 1}"#)
            .unwrap()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.dataset, PathBuf::from("/tmp/optdigits.csv"));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.model_out, Some(PathBuf::from("models/best.json")));
    }

    #[test]
    fn unparsable_seed_is_a_config_error() {
        let err = SweepConfig::default()
            .with_overrides(|k| (k == SEED_VAR).then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, SweepErr::Config(_)));
    }
}
