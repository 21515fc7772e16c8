use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::channel::StageChannel;
use crate::pipeline::pipe::Pipe;
use crate::sink::emit::SegmentEmitter;

pub const DEFAULT_SEGMENT_WIDTH: usize = 80;

/// Re-chunks a stream of text into segments of exactly `width` characters.
///
/// Text that does not yet fill a segment stays pending until more arrives or
/// [`Segmenter::finish`] hands it out as a final, shorter segment.
#[derive(Debug, Clone)]
pub struct Segmenter {
    width: usize,
    pending: String,
    pending_chars: usize,
}

impl Segmenter {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            pending: String::new(),
            pending_chars: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Characters received but not yet emitted.
    pub fn pending_chars(&self) -> usize {
        self.pending_chars
    }

    /// Append `text` and return every segment it completes.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);
        self.pending_chars += text.chars().count();

        let mut full = Vec::new();
        while self.pending_chars >= self.width {
            let split = self
                .pending
                .char_indices()
                .nth(self.width)
                .map_or(self.pending.len(), |(idx, _)| idx);
            let rest = self.pending.split_off(split);
            full.push(std::mem::replace(&mut self.pending, rest));
            self.pending_chars -= self.width;
        }
        full
    }

    /// Take the pending remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending_chars = 0;
        Some(std::mem::take(&mut self.pending))
    }
}

/// Counters kept by the sink stage.
#[derive(Debug, Default)]
pub struct SinkStats {
    segments: AtomicUsize,
    chars: AtomicUsize,
}

impl SinkStats {
    pub fn segments(&self) -> usize {
        self.segments.load(Ordering::Relaxed)
    }

    pub fn chars(&self) -> usize {
        self.chars.load(Ordering::Relaxed)
    }
}

/// Last stage: reassembles the item stream and emits fixed-width segments.
pub struct SegmentSink<E> {
    width: usize,
    emitter: E,
    stats: Arc<SinkStats>,
}

impl<E> SegmentSink<E> {
    pub fn new(width: usize, emitter: E) -> Self {
        Self {
            width: width.max(1),
            emitter,
            stats: Arc::new(SinkStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<SinkStats> {
        self.stats.clone()
    }
}

impl<E: SegmentEmitter> SegmentSink<E> {
    fn emit(&self, segment: String) {
        self.stats.segments.fetch_add(1, Ordering::Relaxed);
        self.stats
            .chars
            .fetch_add(segment.chars().count(), Ordering::Relaxed);
        self.emitter.emit_segment(segment);
    }
}

#[async_trait]
impl<E> Pipe<String, ()> for SegmentSink<E>
where
    E: SegmentEmitter + 'static,
{
    fn stage_name(&self) -> &'static str {
        "segment_sink"
    }

    async fn process(
        &self,
        input: StageChannel<String>,
        output: StageChannel<()>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        let stage = self.stage_name();

        let mut segmenter = Segmenter::new(self.width);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "textpipe.cancelled", stage = stage, where_ = "pop", pending = segmenter.pending_chars(), "textpipe.cancelled");
                    break
                },
                msg = input.pop() => {
                    let Ok(item) = msg else { break; };
                    for segment in segmenter.push(&item) {
                        self.emit(segment);
                    }
                }
            }
        }

        if let Some(rest) = segmenter.finish() {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "textpipe.sink.flush", stage = stage, chars = rest.chars().count(), "textpipe.sink.flush");
            self.emit(rest);
        }

        output.close();
        Ok(())
    }
}
