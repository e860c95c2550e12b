use std::{fs, path::Path};

use log::info;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{Result, svc::Svc};

/// A fitted model that maps a flattened sample to a label.
pub trait Classifier: Send + Sync {
    /// Returns the amount of features every sample must have.
    fn n_features(&self) -> usize;

    /// Predicts the label of a single sample.
    ///
    /// # Errors
    /// Returns `MlErr::SizeMismatch` if the sample doesn't have `n_features` values.
    fn predict(&self, sample: ArrayView1<f64>) -> Result<usize>;

    /// Predicts the label of every row of `samples`.
    fn predict_all(&self, samples: ArrayView2<f64>) -> Result<Vec<usize>> {
        samples.rows().into_iter().map(|s| self.predict(s)).collect()
    }
}

/// A serialized fitted model, the file format shared by the sweep and the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ModelArtifact {
    Svc(Svc),
}

impl ModelArtifact {
    /// Reads an artifact from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&content)?;

        info!(
            "loaded {} model with {} features from {}",
            artifact.kind(),
            artifact.n_features(),
            path.display()
        );
        Ok(artifact)
    }

    /// Writes the artifact as JSON, creating the parent directories if needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_vec(self)?)?;
        info!("saved {} model to {}", self.kind(), path.display());
        Ok(())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Svc(_) => "svc",
        }
    }
}

impl From<Svc> for ModelArtifact {
    fn from(value: Svc) -> Self {
        Self::Svc(value)
    }
}

impl Classifier for ModelArtifact {
    fn n_features(&self) -> usize {
        match self {
            ModelArtifact::Svc(svc) => svc.n_features(),
        }
    }

    fn predict(&self, sample: ArrayView1<f64>) -> Result<usize> {
        match self {
            ModelArtifact::Svc(svc) => svc.predict(sample),
        }
    }
}
