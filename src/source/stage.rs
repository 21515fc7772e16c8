use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::channel::StageChannel;
use crate::pipeline::pipe::{deliver, Delivery, Pipe};
use crate::source::lines::LineSource;

pub const DEFAULT_SENTINEL: &str = "STOP";
pub const DEFAULT_MAX_LINE_LEN: usize = 999;

/// What to do with a line longer than the configured maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlongPolicy {
    /// Keep the first `max_line_len` characters and the terminator.
    #[default]
    Truncate,
    /// Drop the line.
    Reject,
}

/// Counters kept by the source stage.
#[derive(Debug, Default)]
pub struct SourceStats {
    forwarded: AtomicUsize,
    truncated: AtomicUsize,
    rejected: AtomicUsize,
}

impl SourceStats {
    pub fn forwarded(&self) -> usize {
        self.forwarded.load(Ordering::Relaxed)
    }

    pub fn truncated(&self) -> usize {
        self.truncated.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }
}

enum ReadOutcome {
    Line(String),
    Sentinel,
    Exhausted,
    Cancelled,
}

/// First stage: pulls lines from a [`LineSource`] until the sentinel line or
/// the end of input, then closes its output.
///
/// Waits for a start trigger on its input channel first: either a pushed
/// `()` or the trigger channel being closed.
pub struct SourceStage<S> {
    source: Mutex<S>,
    sentinel: String,
    max_line_len: usize,
    overlong: OverlongPolicy,
    stats: Arc<SourceStats>,
}

impl<S> SourceStage<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Mutex::new(source),
            sentinel: DEFAULT_SENTINEL.to_owned(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            overlong: OverlongPolicy::default(),
            stats: Arc::new(SourceStats::default()),
        }
    }

    pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Longest accepted line, in characters, terminator excluded.
    pub fn max_line_len(mut self, n: usize) -> Self {
        self.max_line_len = n.max(1);
        self
    }

    pub fn overlong(mut self, policy: OverlongPolicy) -> Self {
        self.overlong = policy;
        self
    }

    pub fn stats(&self) -> Arc<SourceStats> {
        self.stats.clone()
    }

    /// Apply the length bound. `None` means the line was rejected.
    fn admit(&self, line: String) -> Option<String> {
        let body = strip_terminator(&line);
        let len = body.chars().count();
        if len <= self.max_line_len {
            return Some(line);
        }

        match self.overlong {
            OverlongPolicy::Reject => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::WARN, event = "textpipe.source.rejected", len = len, max = self.max_line_len, "textpipe.source.rejected");
                None
            }
            OverlongPolicy::Truncate => {
                let cut = body
                    .char_indices()
                    .nth(self.max_line_len)
                    .map_or(body.len(), |(idx, _)| idx);
                let terminator = &line[body.len()..];
                let mut kept = String::with_capacity(cut + terminator.len());
                kept.push_str(&body[..cut]);
                kept.push_str(terminator);
                self.stats.truncated.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::WARN, event = "textpipe.source.truncated", len = len, max = self.max_line_len, "textpipe.source.truncated");
                Some(kept)
            }
        }
    }
}

impl<S: LineSource> SourceStage<S> {
    async fn next_line(&self, source: &mut S, cancel: &CancelToken) -> Result<ReadOutcome> {
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => return Ok(ReadOutcome::Cancelled),
                line = source.read_line() => line?,
            };

            let Some(line) = line else {
                return Ok(ReadOutcome::Exhausted);
            };
            if strip_terminator(&line) == self.sentinel {
                return Ok(ReadOutcome::Sentinel);
            }
            if let Some(line) = self.admit(line) {
                return Ok(ReadOutcome::Line(line));
            }
        }
    }
}

#[async_trait]
impl<S> Pipe<(), String> for SourceStage<S>
where
    S: LineSource + 'static,
{
    fn stage_name(&self) -> &'static str {
        "source"
    }

    async fn process(
        &self,
        input: StageChannel<()>,
        output: StageChannel<String>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let stage = self.stage_name();

        tokio::select! {
            _ = cancel.cancelled() => {
                output.close();
                return Ok(());
            },
            _ = input.pop() => {}
        }

        let mut source = self.source.lock().await;
        loop {
            match self.next_line(&mut source, &cancel).await? {
                ReadOutcome::Line(line) => {
                    if deliver(&output, line, &cancel, stage).await? == Delivery::Stopped {
                        break;
                    }
                    self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                }
                ReadOutcome::Sentinel => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "textpipe.source.sentinel", stage = stage, forwarded = self.stats.forwarded(), "textpipe.source.sentinel");
                    break;
                }
                ReadOutcome::Exhausted => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "textpipe.source.exhausted", stage = stage, forwarded = self.stats.forwarded(), "textpipe.source.exhausted");
                    break;
                }
                ReadOutcome::Cancelled => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "textpipe.cancelled", stage = stage, where_ = "read", "textpipe.cancelled");
                    break;
                }
            }
        }

        output.close();
        Ok(())
    }
}

/// The line without its trailing `"\r\n"` or `"\n"`.
pub fn strip_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line)
}
