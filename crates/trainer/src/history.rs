use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// Metric name to value for one epoch. Validation metrics carry a `val_`
/// prefix and the learning rate is stored under `lr`.
pub type Logs = BTreeMap<String, f64>;

/// Per-epoch logs of a finished `fit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<usize>,
    pub logs: Vec<Logs>,
}

impl History {
    pub(crate) fn record(&mut self, epoch: usize, logs: Logs) {
        self.epochs.push(epoch);
        self.logs.push(logs);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Values of `metric` across epochs, skipping epochs that lack it.
    pub fn metric(&self, metric: &str) -> Vec<f64> {
        self.logs
            .iter()
            .filter_map(|logs| logs.get(metric).copied())
            .collect()
    }

    pub fn last(&self) -> Option<&Logs> {
        self.logs.last()
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
