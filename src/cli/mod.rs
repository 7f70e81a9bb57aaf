// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains the classifier on a labelled dataset
//   2. `classify` — classifies the spans of a document export
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{ClassifyArgs, Commands, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "span-classifier",
    version = "0.1.0",
    about = "Classify document text spans (headers, body text, annotations, …) with a trainable neural model."
)]
pub struct Cli {
    /// The subcommand to run (train or classify)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Classify(args) => run_classify(args),
        }
    }
}

/// Handles the `train` subcommand.
/// Converts CLI args into a TrainRunConfig and hands off to Layer 2.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on dataset: {}", args.dataset.display());

    // Convert CLI args → application config (separates presentation from domain)
    let use_case = TrainUseCase::new(args.into());
    use_case.execute()?;

    println!("Training complete. Artifact saved.");
    Ok(())
}

/// Handles the `classify` subcommand.
/// Builds the pipeline and prints one line per classified span.
fn run_classify(args: ClassifyArgs) -> Result<()> {
    use crate::application::classify_use_case::ClassifyUseCase;

    let document = args.document.clone();
    let (from_page, to_page) = (args.from_page, args.to_page);

    let use_case = ClassifyUseCase::new(args.into())?;
    let classified = use_case.classify_document(&document, from_page, to_page)?;

    if classified.is_empty() {
        println!("No spans found.");
        return Ok(());
    }

    for item in &classified {
        println!(
            "page {:>3}  {:<14}  {}",
            item.span.page,
            item.label,
            item.span.text
        );
    }
    println!("\nClassified {} spans.", classified.len());
    Ok(())
}
