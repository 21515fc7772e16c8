//! Basic Text Pipeline
//!
//! Run with:
//!   cargo run --example basic
//!
//! Feeds three lines through source → normalize → replace_token → sink with
//! 5-character segments. The sentinel line `STOP` ends the input, and the
//! trailing partial segment is flushed at the end.

use textpipe::config::PipelineConfig;
use textpipe::error::Result;
use textpipe::sink::CollectEmitter;
use textpipe::source::VecLineSource;
use textpipe::text::TextPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let input = ["a++b\n", "c\n", "STOP\n", "never read\n"];

    let config = PipelineConfig {
        segment_width: 5,
        ..PipelineConfig::default()
    };
    let emitter = CollectEmitter::new();

    let report = TextPipeline::new(config)?
        .run(VecLineSource::new(input), emitter.clone())
        .await?;

    println!("Input lines: {input:?}");
    println!("Segments (width 5):");
    for segment in emitter.segments() {
        println!("  [{segment}]");
    }

    println!(
        "\nForwarded {} lines, emitted {} segments / {} chars",
        report.lines_forwarded, report.segments_emitted, report.chars_emitted
    );
    println!("Report as JSON: {}", serde_json::to_string(&report)?);

    Ok(())
}
