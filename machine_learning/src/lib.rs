pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod preprocessing;
pub mod split;
pub mod svc;

pub use dataset::{Dataset, LabeledImages};
pub use error::{MlErr, Result};
pub use model::{Classifier, ModelArtifact};
pub use svc::{Svc, SvcParams};
