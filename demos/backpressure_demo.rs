//! Backpressure Demonstration
//!
//! Run with:
//!   cargo run --example backpressure_demo
//!
//! A fast line source feeds the text stages while a slow emitter holds the
//! sink back. With a small channel capacity the source can only run a few
//! lines ahead of the sink; with a large one it finishes reading early.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use textpipe::config::PipelineConfig;
use textpipe::error::Result;
use textpipe::sink::SegmentEmitter;
use textpipe::source::VecLineSource;
use textpipe::text::TextPipeline;

/// Sleeps on every segment, like a slow terminal.
struct SlowEmitter {
    delay: Duration,
    emitted: Arc<AtomicUsize>,
}

impl SegmentEmitter for SlowEmitter {
    fn emit_segment(&self, _segment: String) {
        std::thread::sleep(self.delay);
        self.emitted.fetch_add(1, Ordering::SeqCst);
    }
}

async fn run_with_capacity(capacity: usize, lines: usize) -> Result<Duration> {
    let emitted = Arc::new(AtomicUsize::new(0));
    let emitter = SlowEmitter {
        delay: Duration::from_millis(5),
        emitted: emitted.clone(),
    };

    // One line per segment: 9 chars plus the separator space.
    let input: Vec<String> = (0..lines).map(|i| format!("line {i:04}\n")).collect();
    let config = PipelineConfig {
        segment_width: 10,
        capacity,
        ..PipelineConfig::default()
    };

    let start = Instant::now();
    let running = TextPipeline::new(config)?.spawn(VecLineSource::new(input), emitter)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let sampled = running.report();
    println!(
        "  Capacity: {:>3} | After 100ms: read={:>3}, emitted={:>3}",
        capacity,
        sampled.lines_forwarded,
        emitted.load(Ordering::SeqCst)
    );

    let report = running.wait().await?;
    let elapsed = start.elapsed();
    println!(
        "  Capacity: {:>3} | Completed in {:>4}ms | read={}, segments={}",
        capacity,
        elapsed.as_millis(),
        report.lines_forwarded,
        report.segments_emitted
    );

    Ok(elapsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("Backpressure Demonstration\n");

    let lines = 100;
    println!("  - Lines: {lines}");
    println!("  - Emit delay: 5ms per segment\n");

    println!("Capacity 1: the source stays within a few lines of the sink");
    run_with_capacity(1, lines).await?;

    println!("\nCapacity 8: some buffering between stages");
    run_with_capacity(8, lines).await?;

    println!("\nCapacity 128: the source reads everything almost at once");
    run_with_capacity(128, lines).await?;

    println!("\nMemory stays bounded by capacity x stages, whatever the input size.");
    Ok(())
}
