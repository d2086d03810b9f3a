use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use deepneuro_train::{FitConfig, LearningRateSchedule, StepDecay};

/// Print the step-decay learning rate for each epoch
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read the schedule parameters from a training config instead
    #[arg(short, long, conflicts_with_all = ["initial_rate", "drop", "epochs_drop", "epochs"])]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 0.01)]
    initial_rate: f64,

    /// Factor applied at every drop
    #[arg(long, default_value_t = 0.5)]
    drop: f64,

    /// Epochs between drops
    #[arg(long, default_value_t = 10.0)]
    epochs_drop: f64,

    #[arg(short, long, default_value_t = 30)]
    epochs: usize,

    /// Emit a JSON array instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (schedule, epochs): (Box<dyn LearningRateSchedule>, usize) = match &cli.config {
        Some(path) => {
            let cfg = FitConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load {:?}", path))?;
            let schedule = cfg
                .learning_rate_schedule()
                .with_context(|| format!("Invalid schedule in {:?}", path))?;
            (schedule, cfg.n_epochs)
        }
        None => {
            let schedule = StepDecay::new(cli.initial_rate, cli.drop, cli.epochs_drop)
                .context("Invalid schedule parameters")?;
            (Box::new(schedule) as Box<dyn LearningRateSchedule>, cli.epochs)
        }
    };

    let rates: Vec<f64> = (0..epochs).map(|e| schedule.learning_rate(e)).collect();

    if cli.json {
        println!("{}", serde_json::to_string(&rates)?);
        return Ok(());
    }

    println!("{:>6}  {:>12}", "epoch", "lr");
    let mut previous = None;
    for (epoch, rate) in rates.iter().enumerate() {
        let marker = match previous {
            Some(p) if p != *rate => "  <- drop",
            _ => "",
        };
        println!("{:>6}  {:>12.6e}{}", epoch, rate, marker);
        previous = Some(*rate);
    }

    Ok(())
}
