use std::io::Write as _;
use std::sync::{Arc, Mutex};

use textpipe::config::PipelineConfig;
use textpipe::error::Result;
use textpipe::pipeline::chain::PipeExt;
use textpipe::pipeline::runtime::Runtime;
use textpipe::sink::CollectEmitter;
use textpipe::source::{
    strip_terminator, LineSource, OverlongPolicy, ReaderLineSource, SourceStage, VecLineSource,
};
use textpipe::text::TextPipeline;

mod common;
use common::{run_lines, CollectSink};

async fn collect_source<S: LineSource + 'static>(stage: SourceStage<S>) -> Result<Vec<String>> {
    let collected = Arc::new(Mutex::new(Vec::<String>::new()));
    let pipe = stage.pipe::<(), _>(CollectSink::new(collected.clone()));

    let (start, _cancel, handle) = Runtime::new().buffer(4).spawn_sink::<(), _>(pipe);
    start.push(()).await.unwrap();
    start.close();
    handle.await??;

    let out = collected.lock().unwrap().clone();
    Ok(out)
}

#[tokio::test]
async fn lines_are_forwarded_unmodified() -> Result<()> {
    let stage = SourceStage::new(VecLineSource::new(["a++b\n", "c\r\n", "no newline"]));
    let stats = stage.stats();

    let out = collect_source(stage).await?;
    assert_eq!(out, vec!["a++b\n", "c\r\n", "no newline"]);
    assert_eq!(stats.forwarded(), 3);
    Ok(())
}

#[tokio::test]
async fn sentinel_is_not_forwarded() -> Result<()> {
    let stage = SourceStage::new(VecLineSource::new(["x\n", "STOP\n", "y\n"]));
    let out = collect_source(stage).await?;
    assert_eq!(out, vec!["x\n"]);
    Ok(())
}

#[tokio::test]
async fn overlong_lines_are_truncated_keeping_the_terminator() -> Result<()> {
    let stage = SourceStage::new(VecLineSource::new(["abcdefgh\n", "abc\n", "éééééé"]))
        .max_line_len(4);
    let stats = stage.stats();

    let out = collect_source(stage).await?;
    assert_eq!(out, vec!["abcd\n", "abc\n", "éééé"]);
    assert_eq!(stats.truncated(), 2);
    assert_eq!(stats.rejected(), 0);
    assert_eq!(stats.forwarded(), 3);
    Ok(())
}

#[tokio::test]
async fn overlong_lines_can_be_rejected() -> Result<()> {
    let stage = SourceStage::new(VecLineSource::new(["short\n", "much too long\n", "ok\n"]))
        .max_line_len(5)
        .overlong(OverlongPolicy::Reject);
    let stats = stage.stats();

    let out = collect_source(stage).await?;
    assert_eq!(out, vec!["short\n", "ok\n"]);
    assert_eq!(stats.rejected(), 1);
    assert_eq!(stats.forwarded(), 2);
    Ok(())
}

#[tokio::test]
async fn default_bound_is_999_characters() -> Result<()> {
    let long = format!("{}\n", "z".repeat(1500));
    let (segments, report) = run_lines(PipelineConfig::default(), &[long.as_str()]).await?;

    assert_eq!(report.lines_truncated, 1);
    // 999 kept characters plus the newline turned into a space.
    assert_eq!(report.chars_emitted, 1000);
    assert_eq!(segments.concat().trim_end().len(), 999);
    Ok(())
}

#[test]
fn strip_terminator_handles_lf_and_crlf() {
    assert_eq!(strip_terminator("STOP\n"), "STOP");
    assert_eq!(strip_terminator("STOP\r\n"), "STOP");
    assert_eq!(strip_terminator("STOP"), "STOP");
    assert_eq!(strip_terminator("STOP\n\n"), "STOP\n");
}

#[tokio::test]
async fn reader_source_keeps_terminators_and_last_partial_line() -> Result<()> {
    let input: &[u8] = b"first\nsecond\r\nlast";
    let mut source = ReaderLineSource::new(input);

    assert_eq!(source.read_line().await?.as_deref(), Some("first\n"));
    assert_eq!(source.read_line().await?.as_deref(), Some("second\r\n"));
    assert_eq!(source.read_line().await?.as_deref(), Some("last"));
    assert_eq!(source.read_line().await?, None);
    Ok(())
}

#[tokio::test]
async fn reader_source_recovers_from_invalid_utf8() -> Result<()> {
    let input: &[u8] = b"ok\nbad \xff byte\n";
    let mut source = ReaderLineSource::new(input);

    assert_eq!(source.read_line().await?.as_deref(), Some("ok\n"));
    assert_eq!(
        source.read_line().await?.as_deref(),
        Some("bad \u{FFFD} byte\n")
    );
    assert_eq!(source.read_line().await?, None);
    Ok(())
}

#[tokio::test]
async fn file_source_feeds_the_whole_pipeline() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "a++b\nc\nSTOP\nignored\n")?;
    file.flush()?;

    let emitter = CollectEmitter::new();
    let source = ReaderLineSource::open(file.path()).await?;
    let config = PipelineConfig {
        segment_width: 5,
        ..PipelineConfig::default()
    };
    TextPipeline::new(config)?.run(source, emitter.clone()).await?;

    assert_eq!(emitter.segments(), vec!["a^b c", " "]);
    Ok(())
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let res = ReaderLineSource::open("/definitely/not/here.txt").await;
    assert!(matches!(res, Err(textpipe::error::Error::Io(_))));
}
