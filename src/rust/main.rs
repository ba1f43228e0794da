use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use category_classifier::{pipeline, PipelineConfig};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Root holding csv/{train,test}.csv and the generated trees
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory the model artifact is written to and loaded from
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the dataset trees, then train, evaluate and save a model (default)
    Train {
        /// Train on the existing trees instead of rebuilding them from CSV
        #[arg(long)]
        skip_build: bool,

        /// Number of passes over the training set
        #[arg(long)]
        epochs: Option<usize>,
    },
    /// Classify a comma-separated keyword list with the saved model
    Predict {
        text: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(data_dir) = &args.data_dir {
        config = PipelineConfig::with_data_root(data_dir, &config.model_dir);
    }
    if let Some(model_dir) = &args.model_dir {
        config = config.with_model_dir(model_dir);
    }

    match args.command.unwrap_or(Command::Train { skip_build: false, epochs: None }) {
        Command::Train { skip_build, epochs } => {
            if let Some(epochs) = epochs {
                config = config.with_epochs(epochs);
            }
            let start = Instant::now();
            info!("=== Building category model ===");
            if !skip_build {
                pipeline::build_data_trees(&config)?;
            }
            let report = pipeline::build_model(&config)?;
            info!("=== Done in {:.2?} ===", start.elapsed());
            println!("Test accuracy: {:.3}", report.test_accuracy);
        }
        Command::Predict { text } => {
            let classifier = pipeline::load_classifier(&config)?;
            let prediction = classifier.predict(&text)?;
            println!("{}", prediction.probabilities);
            println!("{}", prediction.label);
            for (label, score) in classifier.ranked_scores(&prediction) {
                info!("  {}: {:.1}%", label, score * 100.0);
            }
        }
    }

    Ok(())
}
