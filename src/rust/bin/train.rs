use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use shelfsort::dataset::read_training_records;
use shelfsort::{train, TrainingConfig};

#[derive(Parser)]
#[command(author, version, about = "Train the product category classifier", long_about = None)]
struct Args {
    /// Labeled catalog with item_name, category, subcategory and specific_category columns
    #[arg(short, long, default_value = "tagged_products.csv")]
    input: PathBuf,

    /// Where to write the model artifact
    #[arg(short, long, default_value = "product_classifier.model")]
    output: PathBuf,

    /// Number of augmented copies of the dataset
    #[arg(long)]
    passes: Option<usize>,

    /// Seed for augmentation and the train/test split
    #[arg(long)]
    seed: Option<u64>,

    /// Solver iteration cap
    #[arg(long)]
    max_iter: Option<usize>,
}

impl Args {
    fn config(&self) -> TrainingConfig {
        let mut config = TrainingConfig::default();
        if let Some(passes) = self.passes {
            config = config.with_passes(passes);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(max_iter) = self.max_iter {
            let solver = config.solver.clone().with_max_iter(max_iter);
            config = config.with_solver(solver);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.config();

    info!("=== Training product classifier ===");
    let start_time = Instant::now();

    let records = read_training_records(&args.input)
        .with_context(|| format!("Failed to read training data from {:?}", args.input))?;
    let outcome = train(&records, &config).context("Training failed")?;
    outcome
        .artifact
        .save(&args.output)
        .with_context(|| format!("Failed to save model to {:?}", args.output))?;

    info!(
        "Solver finished after {} iterations (converged: {})",
        outcome.solver.iterations, outcome.solver.converged
    );
    info!("=== Training finished (took {:.2?}) ===", start_time.elapsed());

    println!("Model trained and saved!");
    println!("Accuracy: {:.4}", outcome.report.accuracy);
    println!("{}", outcome.report);
    Ok(())
}
