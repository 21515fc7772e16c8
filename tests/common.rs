#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use textpipe::config::PipelineConfig;
use textpipe::error::{Error, Result};
use textpipe::pipeline::cancel::CancelToken;
use textpipe::pipeline::channel::StageChannel;
use textpipe::pipeline::pipe::{deliver, Delivery, Pipe};
use textpipe::sink::CollectEmitter;
use textpipe::source::{LineSource, VecLineSource};
use textpipe::text::{normalize_separators, replace_token, PipelineReport, TextPipeline};

/// Pushes a fixed list of items once started.
#[derive(Clone)]
pub struct VecSource<T> {
    items: Vec<T>,
}

impl<T> VecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl<T> Pipe<(), T> for VecSource<T>
where
    T: Send + Sync + Clone + 'static,
{
    async fn process(
        &self,
        input: StageChannel<()>,
        output: StageChannel<T>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = input.pop() => {}
        }

        for item in self.items.clone() {
            if deliver(&output, item, &cancel, "vec_source").await? == Delivery::Stopped {
                break;
            }
        }
        output.close();
        Ok(())
    }
}

pub struct CollectSink<T> {
    out: Arc<Mutex<Vec<T>>>,
}

impl<T> CollectSink<T> {
    pub fn new(out: Arc<Mutex<Vec<T>>>) -> Self {
        Self { out }
    }
}

#[async_trait]
impl<T> Pipe<T, ()> for CollectSink<T>
where
    T: Send + Sync + 'static,
{
    async fn process(
        &self,
        input: StageChannel<T>,
        output: StageChannel<()>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                msg = input.pop() => {
                    let Ok(v) = msg else { break; };
                    self.out.lock().expect("mutex poisoned").push(v);
                }
            }
        }
        output.close();
        Ok(())
    }
}

/// A line source that never produces a line, like an idle console.
pub struct PendingLineSource;

#[async_trait]
impl LineSource for PendingLineSource {
    async fn read_line(&mut self) -> Result<Option<String>> {
        std::future::pending::<()>().await;
        Ok(None)
    }
}

/// Yields its lines, then fails with an I/O error.
pub struct FailingLineSource {
    lines: VecLineSource,
}

impl FailingLineSource {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: VecLineSource::new(lines.iter().copied()),
        }
    }
}

#[async_trait]
impl LineSource for FailingLineSource {
    async fn read_line(&mut self) -> Result<Option<String>> {
        match self.lines.read_line().await? {
            Some(line) => Ok(Some(line)),
            None => Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "console went away"))),
        }
    }
}

/// The stream the sink should reassemble for `lines` (sentinel excluded).
pub fn expected_stream(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| replace_token(&normalize_separators(line)))
        .collect()
}

pub fn config_with_width(width: usize) -> PipelineConfig {
    PipelineConfig {
        segment_width: width,
        ..PipelineConfig::default()
    }
}

pub async fn run_lines(
    config: PipelineConfig,
    lines: &[&str],
) -> Result<(Vec<String>, PipelineReport)> {
    let emitter = CollectEmitter::new();
    let report = TextPipeline::new(config)?
        .run(VecLineSource::new(lines.iter().copied()), emitter.clone())
        .await?;
    Ok((emitter.segments(), report))
}
