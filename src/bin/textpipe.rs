//! Command-line front end for textpipe.
//!
//! Reads lines from stdin (or `--input`), stops at the sentinel line `STOP`
//! or end of input, and prints the transformed text in fixed-width segments.
//!
//! Usage:
//!   textpipe [--width 80] [--capacity 128] [--config <file.json>] [--input <file>]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use textpipe::config::PipelineConfig;
use textpipe::error::{Error, Result, EXIT_SUCCESS};
use textpipe::sink::StdoutEmitter;
use textpipe::source::{OverlongPolicy, ReaderLineSource};
use textpipe::text::{PipelineReport, RunningPipeline, TextPipeline};

#[derive(Parser, Debug)]
#[command(name = "textpipe", version, about = "Normalize, rewrite and re-chunk lines of text")]
struct Cli {
    /// JSON pipeline configuration; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read lines from this file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Characters per output segment
    #[arg(short, long)]
    width: Option<usize>,

    /// Items each inter-stage channel holds
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Longest accepted input line, in characters
    #[arg(long)]
    max_line_len: Option<usize>,

    /// Drop over-long lines instead of truncating them
    #[arg(long)]
    reject_overlong: bool,

    /// Input line that ends the stream
    #[arg(long)]
    sentinel: Option<String>,

    /// Prompt written to stderr before each line is read
    #[arg(long)]
    prompt: Option<String>,

    /// Print a JSON run report to stderr on exit
    #[arg(long)]
    report: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(width) = self.width {
            config.segment_width = width;
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(max_line_len) = self.max_line_len {
            config.max_line_len = max_line_len;
        }
        if self.reject_overlong {
            config.overlong = OverlongPolicy::Reject;
        }
        if let Some(sentinel) = &self.sentinel {
            config.sentinel = sentinel.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("textpipe={level}")));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn wait_or_interrupt(running: RunningPipeline) -> Result<PipelineReport> {
    let cancel = running.cancel_token();
    let wait = running.wait();
    tokio::pin!(wait);

    tokio::select! {
        res = &mut wait => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, shutting down pipeline");
            cancel.cancel();
            wait.await
        }
    }
}

async fn run(cli: &Cli) -> Result<PipelineReport> {
    let config = cli.pipeline_config()?;
    let pipeline = TextPipeline::new(config)?;
    let emitter = StdoutEmitter;

    let running = match &cli.input {
        Some(path) => pipeline.spawn(ReaderLineSource::open(path).await?, emitter)?,
        None => {
            let mut source = ReaderLineSource::stdin();
            if let Some(prompt) = &cli.prompt {
                source = source.with_prompt(prompt.clone());
            }
            pipeline.spawn(source, emitter)?
        }
    };

    wait_or_interrupt(running).await
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(report) => {
            if cli.report {
                match serde_json::to_string(&report) {
                    Ok(json) => eprintln!("{json}"),
                    Err(err) => tracing::warn!(error = %err, "failed to serialize run report"),
                }
            }
            exit_code(EXIT_SUCCESS)
        }
        Err(err) => {
            eprintln!("textpipe: {err}");
            if let Error::Closed { stage } = &err {
                tracing::error!(stage = *stage, "pipeline invariant violated");
            }
            exit_code(err.exit_code())
        }
    }
}
