use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrainError};
use crate::schedule::{Constant, LearningRateSchedule, StepDecay};

/// Settings of the generator-driven fit loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Index of the epoch after which training stops (exclusive).
    pub epochs: usize,
    /// Epoch index to start counting from, for resumed runs.
    pub initial_epoch: usize,
    /// Batches drawn from the training generator per epoch.
    pub steps_per_epoch: usize,
    /// Batches drawn from the validation generator per epoch. Required when
    /// a validation generator is passed to `fit`.
    pub validation_steps: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            initial_epoch: 0,
            steps_per_epoch: 10,
            validation_steps: None,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn initial_epoch(mut self, epoch: usize) -> Self {
        self.initial_epoch = epoch;
        self
    }

    pub fn steps_per_epoch(mut self, steps: usize) -> Self {
        self.steps_per_epoch = steps;
        self
    }

    pub fn validation_steps(mut self, steps: usize) -> Self {
        self.validation_steps = Some(steps);
        self
    }

    pub(crate) fn validate(&self, with_validation: bool) -> Result<()> {
        if self.steps_per_epoch == 0 {
            return Err(TrainError::invalid("steps_per_epoch", "must be at least 1"));
        }
        if with_validation {
            match self.validation_steps {
                None => {
                    return Err(TrainError::invalid(
                        "validation_steps",
                        "must be set when a validation generator is given",
                    ))
                }
                Some(0) => {
                    return Err(TrainError::invalid("validation_steps", "must be at least 1"))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Parameters of [`train_model`](crate::train_model), usually read from a
/// `training_config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub n_epochs: usize,
    pub steps_per_epoch: usize,
    pub validation_steps: Option<usize>,
    pub initial_learning_rate: f64,
    /// Factor applied every `epochs_drop` epochs. Leave both unset for a
    /// constant learning rate.
    pub learning_rate_drop: Option<f64>,
    pub epochs_drop: Option<f64>,
    /// Directory receiving `training.log`.
    pub logging_dir: PathBuf,
    /// Metric the checkpoint callback tracks.
    pub monitor: String,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            n_epochs: 1,
            steps_per_epoch: 10,
            validation_steps: None,
            initial_learning_rate: 0.01,
            learning_rate_drop: None,
            epochs_drop: None,
            logging_dir: PathBuf::from("."),
            monitor: "loss".to_string(),
        }
    }
}

impl FitConfig {
    pub fn new(n_epochs: usize) -> Self {
        Self {
            n_epochs,
            ..Self::default()
        }
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn steps_per_epoch(mut self, steps: usize) -> Self {
        self.steps_per_epoch = steps;
        self
    }

    pub fn validation_steps(mut self, steps: usize) -> Self {
        self.validation_steps = Some(steps);
        self
    }

    pub fn initial_learning_rate(mut self, rate: f64) -> Self {
        self.initial_learning_rate = rate;
        self
    }

    pub fn step_decay(mut self, drop: f64, epochs_drop: f64) -> Self {
        self.learning_rate_drop = Some(drop);
        self.epochs_drop = Some(epochs_drop);
        self
    }

    pub fn logging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logging_dir = dir.into();
        self
    }

    pub fn monitor(mut self, metric: impl Into<String>) -> Self {
        self.monitor = metric.into();
        self
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            epochs: self.n_epochs,
            initial_epoch: 0,
            steps_per_epoch: self.steps_per_epoch,
            validation_steps: self.validation_steps,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.logging_dir.join("training.log")
    }

    /// Step decay when both drop parameters are set, a constant
    /// `initial_learning_rate` when neither is. Setting only one of them is
    /// rejected.
    pub fn learning_rate_schedule(&self) -> Result<Box<dyn LearningRateSchedule>> {
        match (self.learning_rate_drop, self.epochs_drop) {
            (Some(drop), Some(epochs_drop)) => Ok(Box::new(StepDecay::new(
                self.initial_learning_rate,
                drop,
                epochs_drop,
            )?)),
            (None, None) => {
                let rate = self.initial_learning_rate;
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(TrainError::invalid(
                        "initial_learning_rate",
                        format!("must be a positive finite number, got {rate}"),
                    ));
                }
                Ok(Box::new(Constant(rate)))
            }
            (Some(_), None) => Err(TrainError::invalid(
                "epochs_drop",
                "must be set together with learning_rate_drop",
            )),
            (None, Some(_)) => Err(TrainError::invalid(
                "learning_rate_drop",
                "must be set together with epochs_drop",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let cfg: FitConfig = serde_yaml::from_str(
            "n_epochs: 30\nlearning_rate_drop: 0.5\nepochs_drop: 10\nlogging_dir: logs\n",
        )
        .unwrap();
        assert_eq!(cfg.n_epochs, 30);
        assert_eq!(cfg.steps_per_epoch, 10);
        assert_eq!(cfg.initial_learning_rate, 0.01);
        assert_eq!(cfg.learning_rate_drop, Some(0.5));
        assert_eq!(cfg.epochs_drop, Some(10.0));
        assert_eq!(cfg.log_path(), PathBuf::from("logs").join("training.log"));
        assert_eq!(cfg.monitor, "loss");
    }

    #[test]
    fn schedule_requires_both_drop_parameters() {
        let decay = FitConfig::new(30).step_decay(0.5, 10.0);
        let schedule = decay.learning_rate_schedule().unwrap();
        assert_eq!(schedule.learning_rate(9), 0.005);

        let constant = FitConfig::new(30).initial_learning_rate(0.2);
        assert_eq!(constant.learning_rate_schedule().unwrap().learning_rate(50), 0.2);

        let mut half = FitConfig::new(30);
        half.epochs_drop = Some(10.0);
        assert!(matches!(
            half.learning_rate_schedule(),
            Err(TrainError::InvalidParameter { name: "learning_rate_drop", .. })
        ));
    }

    #[test]
    fn validation_steps_required_with_validation_data() {
        let cfg = TrainerConfig::new().epochs(2);
        assert!(cfg.validate(false).is_ok());
        assert!(matches!(
            cfg.validate(true),
            Err(TrainError::InvalidParameter { name: "validation_steps", .. })
        ));
        assert!(cfg.clone().validation_steps(3).validate(true).is_ok());
        assert!(cfg.steps_per_epoch(0).validate(false).is_err());
    }
}
