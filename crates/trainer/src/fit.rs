//! One-call training with the standard callback set.

use log::info;
use std::path::Path;

use crate::callbacks::{Callback, CsvLogger, LearningRateScheduler, ModelCheckpoint};
use crate::config::FitConfig;
use crate::error::Result;
use crate::history::History;
use crate::model::Model;
use crate::trainer::Trainer;

/// Builds the standard callbacks, in order:
///
/// 1. [`ModelCheckpoint`] at `model_file`, keeping the best model by
///    `config.monitor`.
/// 2. [`CsvLogger`] writing `training.log` under `config.logging_dir`.
/// 3. [`LearningRateScheduler`] applying step decay, or a constant rate when
///    neither drop parameter is set.
pub fn default_callbacks(
    model_file: impl AsRef<Path>,
    config: &FitConfig,
) -> Result<Vec<Box<dyn Callback>>> {
    let checkpoint = ModelCheckpoint::new(model_file.as_ref())
        .monitor(config.monitor.clone())
        .save_best_only(true);
    let logger = CsvLogger::new(config.log_path());

    let scheduler = LearningRateScheduler::from_boxed(config.learning_rate_schedule()?);

    let callbacks: Vec<Box<dyn Callback>> =
        vec![Box::new(checkpoint), Box::new(logger), Box::new(scheduler)];
    Ok(callbacks)
}

/// Fits `model` on the generators with [`default_callbacks`], then saves the
/// final model to `model_filepath`.
///
/// The final save overwrites the best-so-far checkpoint written to the same
/// path during training.
pub fn train_model<M, T, V>(
    model: &mut M,
    model_filepath: impl AsRef<Path>,
    training: T,
    validation: Option<V>,
    config: &FitConfig,
) -> Result<History>
where
    M: Model,
    T: IntoIterator<Item = Result<M::Batch>>,
    V: IntoIterator<Item = Result<M::Batch>>,
{
    let model_filepath = model_filepath.as_ref();
    let callbacks = default_callbacks(model_filepath, config)?;

    let mut trainer = Trainer::new(config.trainer_config()).with_callbacks(callbacks);
    let history = trainer.fit(model, training, validation)?;

    if let Some(parent) = model_filepath.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    model.save(model_filepath)?;
    info!("Saved model to {:?}", model_filepath);

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrainError;

    #[test]
    fn standard_set_has_three_callbacks() {
        let cfg = FitConfig::new(5).step_decay(0.5, 10.0);
        assert_eq!(default_callbacks("model.json", &cfg).unwrap().len(), 3);
        assert_eq!(default_callbacks("model.json", &FitConfig::new(5)).unwrap().len(), 3);
    }

    #[test]
    fn half_configured_decay_is_rejected() {
        let mut cfg = FitConfig::new(5);
        cfg.learning_rate_drop = Some(0.5);
        assert!(matches!(
            default_callbacks("model.json", &cfg),
            Err(TrainError::InvalidParameter { name: "epochs_drop", .. })
        ));
    }

    #[test]
    fn invalid_decay_is_rejected_before_training() {
        let cfg = FitConfig::new(5).step_decay(0.5, 0.0);
        assert!(default_callbacks("model.json", &cfg).is_err());
    }
}
