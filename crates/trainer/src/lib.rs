pub mod callbacks;
pub mod config;
pub mod error;
pub mod fit;
pub mod history;
pub mod model;
pub mod models;
pub mod prefetch;
pub mod schedule;
pub mod trainer;

pub use callbacks::{Callback, CsvLogger, LearningRateScheduler, Mode, ModelCheckpoint};
pub use config::{FitConfig, TrainerConfig};
pub use error::{Result, TrainError};
pub use fit::{default_callbacks, train_model};
pub use history::{History, Logs};
pub use model::{Model, ModelState, StepOutput};
pub use prefetch::Prefetch;
pub use schedule::{step_decay, Constant, LearningRateSchedule, StepDecay};
pub use trainer::Trainer;
