//! libtorch backend through `tch`.

use std::path::Path;
use tch::{nn, nn::OptimizerConfig, Tensor};

use crate::error::Result;
use crate::model::{Model, ModelState, StepOutput};

/// A `tch` module, its variables and optimizer, trained against a loss
/// closure `loss_fn(output, target)`. Batches are `(input, target)` pairs.
pub struct TchModel<M, F> {
    vs: nn::VarStore,
    module: M,
    optimizer: nn::Optimizer,
    loss_fn: F,
    learning_rate: f64,
}

impl<M, F> TchModel<M, F>
where
    M: nn::ModuleT,
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    pub fn new<O: OptimizerConfig>(
        vs: nn::VarStore,
        module: M,
        optimizer: O,
        learning_rate: f64,
        loss_fn: F,
    ) -> Result<Self> {
        let optimizer = optimizer
            .build(&vs, learning_rate)
            .map_err(anyhow::Error::from)?;
        Ok(Self {
            vs,
            module,
            optimizer,
            loss_fn,
            learning_rate,
        })
    }
}

impl<M, F> ModelState for TchModel<M, F>
where
    M: nn::ModuleT,
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
        self.optimizer.set_lr(lr);
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.vs.save(path).map_err(anyhow::Error::from)?;
        Ok(())
    }
}

impl<M, F> Model for TchModel<M, F>
where
    M: nn::ModuleT,
    F: Fn(&Tensor, &Tensor) -> Tensor,
{
    type Batch = (Tensor, Tensor);

    fn train_step(&mut self, (input, target): (Tensor, Tensor)) -> Result<StepOutput> {
        let output = self.module.forward_t(&input, true);
        let loss = (self.loss_fn)(&output, &target);
        self.optimizer.backward_step(&loss);
        Ok(StepOutput::new(loss.double_value(&[])))
    }

    fn evaluate_step(&mut self, (input, target): (Tensor, Tensor)) -> Result<StepOutput> {
        let loss = tch::no_grad(|| {
            let output = self.module.forward_t(&input, false);
            (self.loss_fn)(&output, &target)
        });
        Ok(StepOutput::new(loss.double_value(&[])))
    }
}
