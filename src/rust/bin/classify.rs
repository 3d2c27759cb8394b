use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, info};
use shelfsort::dataset::{read_items, write_predictions};
use shelfsort::{classify, ModelArtifact, DEFAULT_CONFIDENCE_THRESHOLD};

#[derive(Parser)]
#[command(author, version, about = "Assign categories to items with a trained model", long_about = None)]
struct Args {
    /// Items to classify, with item_id and item_name columns
    input: PathBuf,

    /// Where to write the predicted categories
    output: PathBuf,

    /// Model artifact produced by shelfsort-train
    model: PathBuf,

    /// Minimum top-class probability; below it the item is marked Unknown
    #[arg(short, long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    threshold: f32,
}

fn main() -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let artifact = ModelArtifact::load(&args.model)
        .with_context(|| format!("Failed to load model from {:?}", args.model))?;
    let info = artifact.classifier().info();
    info!("Model: {}", info);
    debug!("Class labels: {:?}", info.class_labels);

    let items = read_items(&args.input)
        .with_context(|| format!("Failed to read items from {:?}", args.input))?;
    let predictions = classify(artifact.classifier(), &items, args.threshold)
        .context("Classification failed")?;
    write_predictions(&args.output, &predictions)
        .with_context(|| format!("Failed to write predictions to {:?}", args.output))?;

    println!("Done! Saved with predicted categories.");
    Ok(())
}
