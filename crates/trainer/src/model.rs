//! The contract a model has to meet to be driven by [`Trainer`](crate::Trainer).

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// Output from a training or evaluation step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub loss: f64,
    /// Optional metrics (e.g., accuracy).
    pub metrics: BTreeMap<String, f64>,
}

impl StepOutput {
    pub fn new(loss: f64) -> Self {
        Self {
            loss,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }
}

/// The part of a model callbacks are allowed to touch: the optimizer's
/// learning rate and persistence.
pub trait ModelState {
    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, lr: f64);

    /// Serialize the model to `path`, replacing any existing file.
    fn save(&self, path: &Path) -> Result<()>;
}

pub trait Model: ModelState {
    type Batch;

    /// Forward, backward and optimizer update for one batch.
    fn train_step(&mut self, batch: Self::Batch) -> Result<StepOutput>;

    /// Loss and metrics for one batch without updating weights.
    fn evaluate_step(&mut self, batch: Self::Batch) -> Result<StepOutput>;
}
