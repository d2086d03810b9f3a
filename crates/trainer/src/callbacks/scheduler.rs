use log::debug;

use super::Callback;
use crate::error::{Result, TrainError};
use crate::model::ModelState;
use crate::schedule::LearningRateSchedule;

/// Sets the model's learning rate from a schedule at the start of each epoch.
pub struct LearningRateScheduler {
    schedule: Box<dyn LearningRateSchedule>,
}

impl LearningRateScheduler {
    pub fn new(schedule: impl LearningRateSchedule + 'static) -> Self {
        Self {
            schedule: Box::new(schedule),
        }
    }

    pub fn from_boxed(schedule: Box<dyn LearningRateSchedule>) -> Self {
        Self { schedule }
    }
}

impl Callback for LearningRateScheduler {
    fn on_epoch_begin(&mut self, model: &mut dyn ModelState, epoch: usize) -> Result<()> {
        let rate = self.schedule.learning_rate(epoch);
        if !rate.is_finite() || rate < 0.0 {
            return Err(TrainError::InvalidLearningRate { epoch, rate });
        }
        debug!("Epoch {}: learning rate set to {:e}", epoch + 1, rate);
        model.set_learning_rate(rate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::StepDecay;
    use std::path::Path;

    struct Lr(f64);

    impl ModelState for Lr {
        fn learning_rate(&self) -> f64 {
            self.0
        }

        fn set_learning_rate(&mut self, lr: f64) {
            self.0 = lr;
        }

        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn applies_step_decay() {
        let mut model = Lr(1.0);
        let mut cb = LearningRateScheduler::new(StepDecay::new(0.01, 0.5, 10.0).unwrap());
        cb.on_epoch_begin(&mut model, 0).unwrap();
        assert_eq!(model.0, 0.01);
        cb.on_epoch_begin(&mut model, 9).unwrap();
        assert_eq!(model.0, 0.005);
    }

    #[test]
    fn rejects_nan_rate() {
        let mut model = Lr(1.0);
        let mut cb = LearningRateScheduler::new(|_epoch: usize| f64::NAN);
        assert!(matches!(
            cb.on_epoch_begin(&mut model, 3),
            Err(TrainError::InvalidLearningRate { epoch: 3, .. })
        ));
        assert_eq!(model.0, 1.0);
    }
}
