use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::channel::StageChannel;
use crate::pipeline::pipe::{deliver, Delivery, Pipe};

/// Applies a pure function to every item: `I -> N`, one output per input.
pub struct TransformStage<F> {
    stage: &'static str,
    f: F,
}

impl<F> TransformStage<F> {
    pub fn new(stage: &'static str, f: F) -> Self {
        Self { stage, f }
    }
}

#[async_trait]
impl<I, N, F> Pipe<I, N> for TransformStage<F>
where
    I: Send + 'static,
    N: Send + 'static,
    F: Fn(I) -> N + Send + Sync + 'static,
{
    fn stage_name(&self) -> &'static str {
        self.stage
    }

    async fn process(
        &self,
        input: StageChannel<I>,
        output: StageChannel<N>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let stage = self.stage_name();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "textpipe.cancelled", stage = stage, where_ = "pop", "textpipe.cancelled");
                    break
                },
                msg = input.pop() => {
                    let Ok(item) = msg else { break; };
                    if deliver(&output, (self.f)(item), &cancel, stage).await? == Delivery::Stopped {
                        break;
                    }
                }
            }
        }

        output.close();
        Ok(())
    }
}
