use anyhow::{Context, Result};
use clap::Parser;
use mirepoix::bundle::Assembler;
use mirepoix::extract::{ProgressEvent, ProgressSink, StreamingExtractor};
use mirepoix::{ContentBundle, ExtractionPipeline, ExtractorConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "mirepoix",
    version,
    about = "Extract a structured recipe from a resolved content bundle"
)]
struct Cli {
    /// Path to a ContentBundle JSON file
    #[arg(long)]
    bundle: PathBuf,

    /// Stream thinking notes to stderr while extracting
    #[arg(long)]
    stream: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Prints progress to stderr so stdout stays clean JSON.
struct StderrSink;

impl ProgressSink for StderrSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Note(note) => eprintln!("  {note}"),
            ProgressEvent::Phase(phase) => eprintln!("[{phase:?}]"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Arc::new(ExtractorConfig::from_env());

    let raw = std::fs::read_to_string(&cli.bundle)
        .with_context(|| format!("reading bundle file {}", cli.bundle.display()))?;
    let bundle: ContentBundle = serde_json::from_str(&raw).context("parsing bundle JSON")?;

    let context = Assembler::new(Arc::clone(&config))?.assemble(&bundle).await;
    let pipeline = ExtractionPipeline::new(Arc::clone(&config))?;

    let result = if cli.stream {
        StreamingExtractor::new(pipeline)
            .extract_streaming(&context, &StderrSink)
            .await?
    } else {
        pipeline.extract(&context).await?
    };

    match result {
        Some(recipe) => println!("{}", serde_json::to_string_pretty(&recipe)?),
        None => println!("null"),
    }
    Ok(())
}
