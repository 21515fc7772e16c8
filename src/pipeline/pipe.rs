use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::channel::StageChannel;

/// One processing step of a pipeline.
///
/// A stage is the only consumer of `input` and the only producer on
/// `output`. It must close `output` as its final act; the runtime closes it
/// again (idempotently) when `process` returns, whatever the outcome.
#[async_trait]
pub trait Pipe<I: Send + 'static, O: Send + 'static>: Send + Sync {
    fn stage_name(&self) -> &'static str {
        "pipe"
    }

    async fn process(
        &self,
        input: StageChannel<I>,
        output: StageChannel<O>,
        buffer: usize,
        cancel: CancelToken,
    ) -> Result<()>;
}

/// Outcome of handing one item to the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Stopped,
}

/// Push `item` downstream, giving up when the pipeline is cancelled.
///
/// A closed downstream channel is an invariant violation unless the
/// pipeline is shutting down or the consumer already exited and abandoned
/// the channel. In those cases the stage just stops.
pub async fn deliver<T: Send>(
    output: &StageChannel<T>,
    item: T,
    cancel: &CancelToken,
    stage: &'static str,
) -> Result<Delivery> {
    tokio::select! {
        _ = cancel.cancelled() => {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "textpipe.cancelled", stage = stage, where_ = "push", "textpipe.cancelled");
            Ok(Delivery::Stopped)
        }
        res = output.push(item) => match res {
            Ok(()) => Ok(Delivery::Delivered),
            Err(_) if cancel.is_cancelled() => Ok(Delivery::Stopped),
            Err(_) if output.is_abandoned() => {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::DEBUG, event = "textpipe.downstream.gone", stage = stage, "textpipe.downstream.gone");
                Ok(Delivery::Stopped)
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::ERROR, event = "textpipe.downstream.closed", stage = stage, "textpipe.downstream.closed");
                Err(Error::Closed { stage })
            }
        }
    }
}
