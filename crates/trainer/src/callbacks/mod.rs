//! Callback system for training hooks.

mod checkpoint;
mod csv_logger;
mod scheduler;

pub use checkpoint::{Mode, ModelCheckpoint};
pub use csv_logger::CsvLogger;
pub use scheduler::LearningRateScheduler;

use crate::error::Result;
use crate::history::Logs;
use crate::model::{ModelState, StepOutput};

/// Hooks invoked by [`Trainer::fit`](crate::Trainer::fit), in registration
/// order. An error returned from any hook aborts training.
pub trait Callback: Send {
    fn on_train_begin(&mut self, _model: &mut dyn ModelState) -> Result<()> {
        Ok(())
    }

    fn on_train_end(&mut self, _model: &mut dyn ModelState) -> Result<()> {
        Ok(())
    }

    fn on_epoch_begin(&mut self, _model: &mut dyn ModelState, _epoch: usize) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(
        &mut self,
        _model: &mut dyn ModelState,
        _epoch: usize,
        _logs: &Logs,
    ) -> Result<()> {
        Ok(())
    }

    fn on_batch_end(&mut self, _step: usize, _output: &StepOutput) -> Result<()> {
        Ok(())
    }
}
