use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use genre_trainer::error::PipelineError;
use genre_trainer::model::{NetworkConfig, PipelineKind};
use genre_trainer::pipeline::{run_preprocessing, run_training};
use genre_trainer::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "genre_cli",
    about = "Genre classification preprocessing and training harness"
)]
struct Cli {
    /// Override path to the JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full preprocessing pipeline over the configured dataset
    Preprocess,
    /// Train and evaluate one pipeline with cross-validation
    Train {
        /// Architecture family
        #[arg(value_enum)]
        pipeline: PipelineArg,
        /// Number of parallel input channels (2 or 3)
        channels: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PipelineArg {
    /// Chunked multi-channel convolutional pipeline with majority voting
    Cnn,
    /// Convolutional-recurrent sequence pipeline over whole recordings
    Crnn,
}

impl From<PipelineArg> for PipelineKind {
    fn from(arg: PipelineArg) -> Self {
        match arg {
            PipelineArg::Cnn => PipelineKind::Cnn,
            PipelineArg::Crnn => PipelineKind::Crnn,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Preprocess => run_preprocess(&config),
        Commands::Train { pipeline, channels } => run_train(&config, pipeline.into(), channels),
    }
}

fn run_preprocess(config: &AppConfig) -> Result<ExitCode> {
    let summary = run_preprocessing(config)?;
    println!(
        "Preprocessed {}/{} recordings: {} chunked examples ({} too short), {} sequence examples",
        summary.discovered - summary.failed,
        summary.discovered,
        summary.chunked_examples,
        summary.too_short_for_chunks,
        summary.sequence_examples
    );
    Ok(ExitCode::from(0))
}

fn run_train(config: &AppConfig, pipeline: PipelineKind, channels: usize) -> Result<ExitCode> {
    // An invalid channel count is a usage error: report and exit nonzero
    // before touching any artifacts
    let network = match NetworkConfig::new(pipeline, channels) {
        Ok(network) => network,
        Err(err @ PipelineError::Configuration { .. }) => {
            eprintln!("Usage error: {err}");
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(err.into()),
    };

    let summary = run_training(config, &network)?;
    for (fold, acc) in summary.fold_accuracies.iter().enumerate() {
        println!("fold {:02}: accuracy {:.4}", fold, acc);
    }
    println!("cross-validation accuracy: {}", summary);
    Ok(ExitCode::from(0))
}
