use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::chain::PipeExt;
use crate::pipeline::runtime::Runtime;
use crate::sink::emit::SegmentEmitter;
use crate::sink::segment::{SegmentSink, SinkStats};
use crate::source::lines::LineSource;
use crate::source::stage::{SourceStage, SourceStats};
use crate::text::normalize::normalize_stage;
use crate::text::token::TokenReplacer;

/// What a finished run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub lines_forwarded: usize,
    pub lines_truncated: usize,
    pub lines_rejected: usize,
    pub segments_emitted: usize,
    pub chars_emitted: usize,
}

/// `source → normalize → replace_token → segment_sink`, each stage on its
/// own task, joined by bounded channels.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    config: PipelineConfig,
}

impl TextPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start all four stages. Must be called within a tokio runtime.
    pub fn spawn<S, E>(&self, source: S, emitter: E) -> Result<RunningPipeline>
    where
        S: LineSource + 'static,
        E: SegmentEmitter + 'static,
    {
        let config = &self.config;

        let source = SourceStage::new(source)
            .sentinel(config.sentinel.clone())
            .max_line_len(config.max_line_len)
            .overlong(config.overlong);
        let source_stats = source.stats();

        let replacer = TokenReplacer::new(config.token.clone(), config.marker.clone())?;

        let sink = SegmentSink::new(config.segment_width, emitter);
        let sink_stats = sink.stats();

        let pipe = source
            .pipe::<String, _>(normalize_stage())
            .pipe::<String, _>(replacer.into_stage())
            .pipe::<(), _>(sink);

        let rt = Runtime::new()
            .buffer(config.capacity)
            .buffer_stages(config.stage_capacity.clone());
        let (start, cancel, handle) = rt.spawn_sink::<(), _>(pipe);
        // Closing the trigger channel is the source's start signal.
        start.close();

        Ok(RunningPipeline {
            cancel,
            handle,
            source_stats,
            sink_stats,
        })
    }

    /// Run to completion and report what happened.
    pub async fn run<S, E>(&self, source: S, emitter: E) -> Result<PipelineReport>
    where
        S: LineSource + 'static,
        E: SegmentEmitter + 'static,
    {
        self.spawn(source, emitter)?.wait().await
    }
}

/// Handle to a spawned [`TextPipeline`].
pub struct RunningPipeline {
    cancel: CancelToken,
    handle: JoinHandle<Result<()>>,
    source_stats: Arc<SourceStats>,
    sink_stats: Arc<SinkStats>,
}

impl RunningPipeline {
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ask every stage to stop. Stages close their outputs on the way out,
    /// so the sink still flushes what it has received.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn report(&self) -> PipelineReport {
        PipelineReport {
            lines_forwarded: self.source_stats.forwarded(),
            lines_truncated: self.source_stats.truncated(),
            lines_rejected: self.source_stats.rejected(),
            segments_emitted: self.sink_stats.segments(),
            chars_emitted: self.sink_stats.chars(),
        }
    }

    /// Wait for every stage to exit.
    pub async fn wait(mut self) -> Result<PipelineReport> {
        (&mut self.handle).await??;
        let report = self.report();

        #[cfg(feature = "tracing")]
        tracing::event!(
            tracing::Level::INFO,
            event = "textpipe.finished",
            lines = report.lines_forwarded,
            truncated = report.lines_truncated,
            rejected = report.lines_rejected,
            segments = report.segments_emitted,
            chars = report.chars_emitted,
            "textpipe.finished"
        );

        Ok(report)
    }
}
