use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::channel::StageChannel;
use crate::pipeline::config::{StageConfig, STAGE_CONFIG};
use crate::pipeline::pipe::Pipe;

pub struct Runtime {
    buffer: usize,
    stage_buffers: HashMap<String, usize>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            buffer: 128,
            stage_buffers: HashMap::new(),
        }
    }

    /// Capacity of every channel without a stage-specific override.
    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Capacity of the channel the stage named `stage` pushes into.
    pub fn buffer_stage(mut self, stage: impl Into<String>, buffer: usize) -> Self {
        self.stage_buffers.insert(stage.into(), buffer.max(1));
        self
    }

    pub fn buffer_stages<K, It>(mut self, overrides: It) -> Self
    where
        K: Into<String>,
        It: IntoIterator<Item = (K, usize)>,
    {
        for (stage, buffer) in overrides {
            self.stage_buffers.insert(stage.into(), buffer.max(1));
        }
        self
    }

    fn stage_config(&self) -> StageConfig {
        StageConfig {
            buffers: Arc::new(self.stage_buffers.clone()),
        }
    }

    /// Spawn `pipe` and return its input channel, output channel, cancel
    /// token and join handle.
    pub fn spawn<I, O, P>(
        &self,
        pipe: P,
    ) -> (
        StageChannel<I>,
        StageChannel<O>,
        CancelToken,
        JoinHandle<Result<()>>,
    )
    where
        I: Send + 'static,
        O: Send + 'static,
        P: Pipe<I, O> + 'static,
    {
        let config = self.stage_config();
        let input = StageChannel::<I>::new(self.buffer);
        let output =
            StageChannel::<O>::new(config.buffer_for(pipe.stage_name(), self.buffer));
        let cancel = CancelToken::default();

        let handle = spawn_stage(
            Arc::new(pipe),
            input.clone(),
            output.clone(),
            self.buffer,
            cancel.clone(),
            config,
        );

        (input, output, cancel, handle)
    }

    /// Spawn a pipeline that ends in a sink; nothing has to drain its output.
    pub fn spawn_sink<I, P>(
        &self,
        pipe: P,
    ) -> (StageChannel<I>, CancelToken, JoinHandle<Result<()>>)
    where
        I: Send + 'static,
        P: Pipe<I, ()> + 'static,
    {
        let (input, _output, cancel, handle) = self.spawn(pipe);
        (input, cancel, handle)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one stage on its own task.
///
/// When the stage exits, whatever the outcome, its output is closed so
/// downstream drains and unwinds, and its input is abandoned so an upstream
/// producer stops at its next push instead of blocking forever.
pub(crate) fn spawn_stage<I, O, P>(
    pipe: Arc<P>,
    input: StageChannel<I>,
    output: StageChannel<O>,
    buffer: usize,
    cancel: CancelToken,
    config: StageConfig,
) -> JoinHandle<Result<()>>
where
    I: Send + 'static,
    O: Send + 'static,
    P: Pipe<I, O> + 'static,
{
    #[cfg(feature = "tracing")]
    let stage = pipe.stage_name();

    let task = STAGE_CONFIG.scope(config, async move {
        let res = pipe
            .process(input.clone(), output.clone(), buffer, cancel)
            .await;
        output.close();
        input.abandon();
        res
    });

    #[cfg(feature = "tracing")]
    let handle = {
        use tracing::Instrument;
        let span = tracing::info_span!("textpipe.stage", stage = stage, buffer = buffer);
        tokio::spawn(task.instrument(span))
    };

    #[cfg(not(feature = "tracing"))]
    let handle = tokio::spawn(task);

    handle
}
