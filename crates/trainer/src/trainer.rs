//! Generator-driven training loop.

use log::info;
use std::collections::BTreeMap;

use crate::callbacks::Callback;
use crate::config::TrainerConfig;
use crate::error::{Result, TrainError};
use crate::history::{History, Logs};
use crate::model::{Model, ModelState, StepOutput};

pub struct Trainer {
    config: TrainerConfig,
    callbacks: Vec<Box<dyn Callback>>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            callbacks: Vec::new(),
        }
    }

    pub fn with_callback(mut self, callback: impl Callback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn with_callbacks(mut self, callbacks: Vec<Box<dyn Callback>>) -> Self {
        self.callbacks.extend(callbacks);
        self
    }

    /// Runs epochs `initial_epoch..epochs`, drawing `steps_per_epoch` batches
    /// per epoch from `training` and, when given, `validation_steps` batches
    /// from `validation`. Both generators are consumed across epochs, so they
    /// must yield enough batches for the whole run.
    pub fn fit<M, T, V>(
        &mut self,
        model: &mut M,
        training: T,
        validation: Option<V>,
    ) -> Result<History>
    where
        M: Model,
        T: IntoIterator<Item = Result<M::Batch>>,
        V: IntoIterator<Item = Result<M::Batch>>,
    {
        self.config.validate(validation.is_some())?;

        let mut training = training.into_iter();
        let mut validation = validation.map(IntoIterator::into_iter);
        let mut history = History::default();

        info!(
            "Starting training: epochs {}..{}, {} steps per epoch",
            self.config.initial_epoch, self.config.epochs, self.config.steps_per_epoch
        );

        for cb in self.callbacks.iter_mut() {
            cb.on_train_begin(model)?;
        }

        for epoch in self.config.initial_epoch..self.config.epochs {
            for cb in self.callbacks.iter_mut() {
                cb.on_epoch_begin(model, epoch)?;
            }

            let mut train_means = RunningMeans::default();
            for step in 0..self.config.steps_per_epoch {
                let batch = training
                    .next()
                    .ok_or(TrainError::GeneratorExhausted { epoch, step })??;
                let output = model.train_step(batch)?;
                train_means.add(&output);
                for cb in self.callbacks.iter_mut() {
                    cb.on_batch_end(step, &output)?;
                }
            }

            let mut logs = train_means.into_logs("");

            if let Some(validation) = validation.as_mut() {
                let steps = self.config.validation_steps.unwrap_or(0);
                let mut val_means = RunningMeans::default();
                for step in 0..steps {
                    let batch = validation
                        .next()
                        .ok_or(TrainError::GeneratorExhausted { epoch, step })??;
                    val_means.add(&model.evaluate_step(batch)?);
                }
                logs.extend(val_means.into_logs("val_"));
            }

            logs.insert("lr".to_string(), model.learning_rate());

            info!("Epoch {}/{} {}", epoch + 1, self.config.epochs, format_logs(&logs));

            for cb in self.callbacks.iter_mut() {
                cb.on_epoch_end(model, epoch, &logs)?;
            }
            history.record(epoch, logs);
        }

        for cb in self.callbacks.iter_mut() {
            cb.on_train_end(model)?;
        }

        Ok(history)
    }
}

#[derive(Default)]
struct RunningMeans {
    steps: usize,
    loss: f64,
    metrics: BTreeMap<String, (f64, usize)>,
}

impl RunningMeans {
    fn add(&mut self, output: &StepOutput) {
        self.steps += 1;
        self.loss += output.loss;
        for (name, value) in &output.metrics {
            let entry = self.metrics.entry(name.clone()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    fn into_logs(self, prefix: &str) -> Logs {
        let mut logs = Logs::new();
        if self.steps == 0 {
            return logs;
        }
        logs.insert(format!("{prefix}loss"), self.loss / self.steps as f64);
        for (name, (sum, count)) in self.metrics {
            logs.insert(format!("{prefix}{name}"), sum / count as f64);
        }
        logs
    }
}

fn format_logs(logs: &Logs) -> String {
    logs.iter()
        .map(|(k, v)| format!("- {k}: {v:.4}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Loss equals the batch value.
    struct Echo {
        lr: f64,
    }

    impl ModelState for Echo {
        fn learning_rate(&self) -> f64 {
            self.lr
        }

        fn set_learning_rate(&mut self, lr: f64) {
            self.lr = lr;
        }

        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    impl Model for Echo {
        type Batch = f64;

        fn train_step(&mut self, batch: f64) -> Result<StepOutput> {
            Ok(StepOutput::new(batch).with_metric("acc", 1.0 - batch))
        }

        fn evaluate_step(&mut self, batch: f64) -> Result<StepOutput> {
            Ok(StepOutput::new(batch * 2.0))
        }
    }

    fn batches(values: &[f64]) -> Vec<Result<f64>> {
        values.iter().copied().map(Ok).collect()
    }

    #[test]
    fn averages_loss_and_metrics_per_epoch() {
        let mut model = Echo { lr: 0.1 };
        let mut trainer = Trainer::new(TrainerConfig::new().epochs(2).steps_per_epoch(2));
        let history = trainer
            .fit(&mut model, batches(&[1.0, 0.0, 0.5, 0.5]), None::<Vec<Result<f64>>>)
            .unwrap();

        assert_eq!(history.epochs, vec![0, 1]);
        assert_eq!(history.metric("loss"), vec![0.5, 0.5]);
        assert_eq!(history.metric("acc"), vec![0.5, 0.5]);
        assert_eq!(history.metric("lr"), vec![0.1, 0.1]);
        assert!(history.metric("val_loss").is_empty());
    }

    #[test]
    fn validation_metrics_are_prefixed() {
        let mut model = Echo { lr: 0.1 };
        let mut trainer = Trainer::new(
            TrainerConfig::new()
                .epochs(1)
                .steps_per_epoch(1)
                .validation_steps(2),
        );
        let history = trainer
            .fit(&mut model, batches(&[1.0]), Some(batches(&[1.0, 2.0])))
            .unwrap();
        assert_eq!(history.metric("val_loss"), vec![3.0]);
    }

    #[test]
    fn exhausted_generator_is_an_error() {
        let mut model = Echo { lr: 0.1 };
        let mut trainer = Trainer::new(TrainerConfig::new().epochs(3).steps_per_epoch(2));
        let err = trainer
            .fit(&mut model, batches(&[1.0, 1.0, 1.0]), None::<Vec<Result<f64>>>)
            .unwrap_err();
        assert!(matches!(err, TrainError::GeneratorExhausted { epoch: 1, step: 1 }));
    }

    #[test]
    fn generator_errors_propagate() {
        let mut model = Echo { lr: 0.1 };
        let mut trainer = Trainer::new(TrainerConfig::new().epochs(1).steps_per_epoch(2));
        let data: Vec<Result<f64>> = vec![Ok(1.0), Err(anyhow::anyhow!("corrupt shard").into())];
        let err = trainer
            .fit(&mut model, data, None::<Vec<Result<f64>>>)
            .unwrap_err();
        assert!(matches!(err, TrainError::Model(_)));
    }

    #[test]
    fn resumes_from_initial_epoch() {
        let mut model = Echo { lr: 0.1 };
        let mut trainer = Trainer::new(
            TrainerConfig::new()
                .epochs(5)
                .initial_epoch(3)
                .steps_per_epoch(1),
        );
        let history = trainer
            .fit(&mut model, batches(&[1.0, 1.0]), None::<Vec<Result<f64>>>)
            .unwrap();
        assert_eq!(history.epochs, vec![3, 4]);
    }
}
