//! Model checkpointing callback.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::Callback;
use crate::error::Result;
use crate::history::Logs;
use crate::model::ModelState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `Max` for accuracy-like metrics, `Min` otherwise.
    #[default]
    Auto,
    Min,
    Max,
}

impl Mode {
    fn resolve(self, monitor: &str) -> Mode {
        match self {
            Mode::Auto if monitor.contains("acc") => Mode::Max,
            Mode::Auto => Mode::Min,
            other => other,
        }
    }
}

/// Saves the model at the end of every epoch, or only when the monitored
/// metric improves when `save_best_only` is set.
///
/// A `{epoch}` placeholder in the path is replaced by the 1-based epoch
/// number.
pub struct ModelCheckpoint {
    filepath: PathBuf,
    monitor: String,
    save_best_only: bool,
    mode: Mode,
    best: Option<f64>,
}

impl ModelCheckpoint {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            monitor: "val_loss".to_string(),
            save_best_only: false,
            mode: Mode::Auto,
            best: None,
        }
    }

    pub fn monitor(mut self, metric: impl Into<String>) -> Self {
        self.monitor = metric.into();
        self
    }

    pub fn save_best_only(mut self, yes: bool) -> Self {
        self.save_best_only = yes;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    fn is_better(&self, current: f64, best: f64) -> bool {
        match self.mode.resolve(&self.monitor) {
            Mode::Max => current > best,
            _ => current < best,
        }
    }

    fn path_for(&self, epoch: usize) -> PathBuf {
        let raw = self.filepath.to_string_lossy();
        if raw.contains("{epoch}") {
            PathBuf::from(raw.replace("{epoch}", &(epoch + 1).to_string()))
        } else {
            self.filepath.clone()
        }
    }

    fn save(&self, model: &dyn ModelState, epoch: usize) -> Result<()> {
        let path = self.path_for(epoch);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        model.save(&path)
    }
}

impl Callback for ModelCheckpoint {
    fn on_epoch_end(&mut self, model: &mut dyn ModelState, epoch: usize, logs: &Logs) -> Result<()> {
        if !self.save_best_only {
            return self.save(model, epoch);
        }

        let Some(&current) = logs.get(&self.monitor) else {
            warn!(
                "Can save best model only with {} available, skipping.",
                self.monitor
            );
            return Ok(());
        };

        let improved = match self.best {
            None => !current.is_nan(),
            Some(best) => self.is_better(current, best),
        };

        if improved {
            info!(
                "Epoch {}: {} improved from {:?} to {:.5}, saving model to {:?}",
                epoch + 1,
                self.monitor,
                self.best,
                current,
                self.path_for(epoch)
            );
            self.best = Some(current);
            self.save(model, epoch)?;
        }

        Ok(())
    }
}
