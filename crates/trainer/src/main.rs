use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use deepneuro_train::models::linear::{synthetic_batches, LinearRegression};
use deepneuro_train::{train_model, FitConfig, Prefetch};

/// Fit the reference linear model on synthetic data with the standard
/// checkpoint / CSV log / learning-rate schedule callbacks.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Training configuration (YAML). Defaults are used when the file is missing.
    #[arg(short, long, default_value = "configs/training_config.yaml")]
    config: PathBuf,

    /// Where the trained model is written
    #[arg(short, long, default_value = "checkpoints/model.json")]
    model_out: PathBuf,

    /// Number of input features of the synthetic problem
    #[arg(long, default_value_t = 4)]
    features: usize,

    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Batches generated ahead of the training loop
    #[arg(long, default_value_t = 10)]
    max_queue_size: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Also dump the per-epoch history as JSON next to the model
    #[arg(long)]
    history: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = if Path::new(&cli.config).exists() {
        FitConfig::from_yaml_file(&cli.config)
            .with_context(|| format!("Failed to load {:?}", cli.config))?
    } else {
        println!("No config at {:?}, using defaults", cli.config);
        FitConfig::default()
    };
    println!("Training with configuration: {:?}", config);

    let weights: Vec<f64> = (1..=cli.features).map(|i| i as f64).collect();
    let training = Prefetch::spawn(
        synthetic_batches(weights.clone(), 0.5, cli.batch_size, 0.1, cli.seed),
        cli.max_queue_size,
    )?;
    let validation = config.validation_steps.map(|_| {
        synthetic_batches(weights, 0.5, cli.batch_size, 0.1, cli.seed.wrapping_add(1))
    });

    let mut model = LinearRegression::new(cli.features, config.initial_learning_rate);
    let history = train_model(&mut model, &cli.model_out, training, validation, &config)
        .context("Training failed")?;

    if let Some(last) = history.last() {
        println!("Final epoch: {:?}", last);
    }
    if cli.history {
        let path = cli.model_out.with_extension("history.json");
        history.save_json(&path)?;
        println!("Saved history to {:?}", path);
    }

    println!("Training complete! Model saved to {:?}", cli.model_out);
    Ok(())
}
