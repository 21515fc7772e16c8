use std::time::Duration;

use textpipe::config::PipelineConfig;
use textpipe::error::Result;
use textpipe::sink::CollectEmitter;
use textpipe::source::VecLineSource;
use textpipe::text::TextPipeline;

mod common;
use common::{config_with_width, expected_stream, run_lines};

#[tokio::test]
async fn reference_example_with_width_five() -> Result<()> {
    let (segments, report) = run_lines(config_with_width(5), &["a++b\n", "c\n", "STOP\n"]).await?;

    assert_eq!(segments, vec!["a^b c", " "]);
    assert_eq!(report.lines_forwarded, 2);
    assert_eq!(report.segments_emitted, 2);
    assert_eq!(report.chars_emitted, 6);
    Ok(())
}

#[tokio::test]
async fn sentinel_stops_input_even_with_more_lines_queued() -> Result<()> {
    let lines = ["one\n", "two\n", "STOP\n", "never\n", "seen\n"];
    let (segments, report) = run_lines(config_with_width(80), &lines).await?;

    assert_eq!(segments.concat(), "one two ");
    assert_eq!(report.lines_forwarded, 2);
    Ok(())
}

#[tokio::test]
async fn sentinel_must_match_exactly() -> Result<()> {
    let lines = ["STOP now\n", " STOP\n", "stop\n", "STOP\r\n", "after\n"];
    let (segments, report) = run_lines(config_with_width(80), &lines).await?;

    assert_eq!(segments.concat(), "STOP now  STOP stop ");
    assert_eq!(report.lines_forwarded, 3);
    Ok(())
}

#[tokio::test]
async fn exhausted_source_without_sentinel_still_terminates() -> Result<()> {
    let lines = ["no sentinel\n", "here"];
    let (segments, report) = run_lines(config_with_width(4), &lines).await?;

    assert_eq!(segments, vec!["no s", "enti", "nel ", "here"]);
    assert_eq!(report.lines_forwarded, 2);
    Ok(())
}

#[tokio::test]
async fn empty_input_emits_nothing() -> Result<()> {
    let (segments, report) = run_lines(config_with_width(80), &["STOP\n"]).await?;
    assert!(segments.is_empty());
    assert_eq!(report, Default::default());
    Ok(())
}

#[tokio::test]
async fn final_partial_segment_is_flushed_exactly_once() -> Result<()> {
    let line = "x".repeat(170);
    let input = format!("{line}\n");
    let (segments, report) = run_lines(config_with_width(80), &[input.as_str()]).await?;

    // 170 chars + 1 space = 171 = 80 + 80 + 11
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].chars().count(), 80);
    assert_eq!(segments[1].chars().count(), 80);
    assert_eq!(segments[2].chars().count(), 11);
    assert_eq!(report.chars_emitted, 171);
    Ok(())
}

#[tokio::test]
async fn more_lines_than_any_fixed_loop_bound() -> Result<()> {
    let owned: Vec<String> = (0..500).map(|i| format!("line {i} ++\n")).collect();
    let lines: Vec<&str> = owned.iter().map(String::as_str).collect();

    let config = PipelineConfig {
        segment_width: 80,
        capacity: 2,
        ..PipelineConfig::default()
    };
    let (segments, report) = run_lines(config, &lines).await?;

    let expected = expected_stream(&lines);
    assert_eq!(segments.concat(), expected);
    assert_eq!(report.lines_forwarded, 500);
    assert_eq!(report.chars_emitted, expected.chars().count());
    assert!(segments[..segments.len() - 1]
        .iter()
        .all(|s| s.chars().count() == 80));
    Ok(())
}

#[tokio::test]
async fn capacity_one_everywhere_does_not_deadlock() -> Result<()> {
    let owned: Vec<String> = (0..200).map(|i| format!("{i}++\r\n")).collect();
    let lines: Vec<&str> = owned.iter().map(String::as_str).collect();

    let config = PipelineConfig {
        segment_width: 7,
        capacity: 1,
        ..PipelineConfig::default()
    };

    let (segments, _report) = tokio::time::timeout(Duration::from_secs(5), run_lines(config, &lines))
        .await
        .expect("pipeline deadlocked")?;
    assert_eq!(segments.concat(), expected_stream(&lines));
    Ok(())
}

#[tokio::test]
async fn custom_sentinel_token_and_marker() -> Result<()> {
    let config = PipelineConfig {
        segment_width: 80,
        sentinel: "END".to_string(),
        token: "**".to_string(),
        marker: "#".to_string(),
        ..PipelineConfig::default()
    };
    let (segments, _) = run_lines(config, &["a**b++\n", "STOP\n", "END\n", "x\n"]).await?;
    assert_eq!(segments.concat(), "a#b++ STOP ");
    Ok(())
}

#[tokio::test]
async fn spawned_pipeline_reports_after_wait() -> Result<()> {
    let emitter = CollectEmitter::new();
    let pipeline = TextPipeline::new(config_with_width(3))?;
    let running = pipeline.spawn(VecLineSource::new(["abc\n", "de"]), emitter.clone())?;

    let report = running.wait().await?;
    assert_eq!(emitter.segments(), vec!["abc", " de"]);
    assert_eq!(report.segments_emitted, 2);
    assert_eq!(report.chars_emitted, 6);
    Ok(())
}

#[tokio::test]
async fn invalid_config_is_rejected_before_spawning() {
    let config = PipelineConfig {
        segment_width: 0,
        ..PipelineConfig::default()
    };
    assert!(TextPipeline::new(config).is_err());
}
