use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("schedule produced an invalid learning rate {rate} at epoch {epoch}")]
    InvalidLearningRate { epoch: usize, rate: f64 },

    #[error("generator ran out of batches at epoch {epoch}, step {step}")]
    GeneratorExhausted { epoch: usize, step: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("model error: {0}")]
    Model(#[from] anyhow::Error),
}

impl TrainError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrainError>;
