use std::sync::Arc;

use machine_learning::Classifier;

/// Shared, read only state of every worker.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new<C: Classifier + 'static>(model: C) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}
