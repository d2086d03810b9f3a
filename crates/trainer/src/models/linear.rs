use anyhow::anyhow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::model::{Model, ModelState, StepOutput};

/// Inputs (one row per sample) and regression targets.
pub type Batch = (Vec<Vec<f64>>, Vec<f64>);

/// Dense `y = w.x + b` trained with plain SGD on mean squared error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(skip)]
    learning_rate: f64,
}

impl LinearRegression {
    pub fn new(n_features: usize, learning_rate: f64) -> Self {
        Self {
            weights: vec![0.0; n_features],
            bias: 0.0,
            learning_rate,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        self.weights.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + self.bias
    }

    fn check(&self, batch: &Batch) -> Result<()> {
        let (xs, ys) = batch;
        if xs.len() != ys.len() || xs.is_empty() {
            return Err(anyhow!("batch has {} inputs and {} targets", xs.len(), ys.len()).into());
        }
        if let Some(row) = xs.iter().find(|row| row.len() != self.weights.len()) {
            return Err(anyhow!(
                "expected {} features per row, got {}",
                self.weights.len(),
                row.len()
            )
            .into());
        }
        Ok(())
    }

    fn mse(&self, (xs, ys): &Batch) -> f64 {
        xs.iter()
            .zip(ys)
            .map(|(x, y)| (self.predict(x) - y).powi(2))
            .sum::<f64>()
            / xs.len() as f64
    }
}

impl ModelState for LinearRegression {
    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }

    fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Model for LinearRegression {
    type Batch = Batch;

    fn train_step(&mut self, batch: Batch) -> Result<StepOutput> {
        self.check(&batch)?;
        let (xs, ys) = &batch;
        let n = xs.len() as f64;

        let mut grad_w = vec![0.0; self.weights.len()];
        let mut grad_b = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let err = self.predict(x) - y;
            for (g, xi) in grad_w.iter_mut().zip(x) {
                *g += 2.0 * err * xi / n;
            }
            grad_b += 2.0 * err / n;
        }

        for (w, g) in self.weights.iter_mut().zip(&grad_w) {
            *w -= self.learning_rate * g;
        }
        self.bias -= self.learning_rate * grad_b;

        Ok(StepOutput::new(self.mse(&batch)))
    }

    fn evaluate_step(&mut self, batch: Batch) -> Result<StepOutput> {
        self.check(&batch)?;
        Ok(StepOutput::new(self.mse(&batch)))
    }
}

/// Endless, seeded generator of noisy samples from `y = w.x + b`.
pub fn synthetic_batches(
    weights: Vec<f64>,
    bias: f64,
    batch_size: usize,
    noise: f64,
    seed: u64,
) -> impl Iterator<Item = Result<Batch>> + Send + 'static {
    let mut rng = StdRng::seed_from_u64(seed);
    std::iter::repeat_with(move || {
        let mut xs = Vec::with_capacity(batch_size);
        let mut ys = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let x: Vec<f64> = (0..weights.len()).map(|_| rng.gen_range(-1.0..1.0_f64)).collect();
            let y = weights.iter().zip(&x).map(|(w, x)| w * x).sum::<f64>()
                + bias
                + noise * rng.gen_range(-1.0..1.0_f64);
            xs.push(x);
            ys.push(y);
        }
        Ok((xs, ys))
    })
}
