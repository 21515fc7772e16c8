use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::channel::StageChannel;
use crate::pipeline::config::StageConfig;
use crate::pipeline::pipe::Pipe;
use crate::pipeline::runtime::spawn_stage;
use crate::pipeline::transform::TransformStage;

/// Two pipes joined by an intermediate [`StageChannel`].
///
/// Each side runs on its own task. A failing side does not touch the cancel
/// token: its output is closed, so the right side drains what was already
/// queued and stops at [`EndOfStream`](crate::pipeline::channel::EndOfStream),
/// and its input is abandoned, so the left side stops at its next push. The
/// error that happened first is returned once both sides have exited.
pub struct Chain<A, B, M> {
    a: Arc<A>,
    b: Arc<B>,
    _m: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a: Arc::new(a),
            b: Arc::new(b),
            _m: PhantomData,
        }
    }
}

fn flatten(res: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    res.map_err(Error::from).and_then(|inner| inner)
}

#[async_trait]
impl<I, M, O, A, B> Pipe<I, O> for Chain<A, B, M>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
    A: Pipe<I, M> + 'static,
    B: Pipe<M, O> + 'static,
{
    fn stage_name(&self) -> &'static str {
        self.b.stage_name()
    }

    async fn process(
        &self,
        input: StageChannel<I>,
        output: StageChannel<O>,
        buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        let config = StageConfig::current();
        let mid = StageChannel::<M>::new(config.buffer_for(self.a.stage_name(), buffer));

        let mut left = spawn_stage(
            self.a.clone(),
            input,
            mid.clone(),
            buffer,
            cancel.clone(),
            config.clone(),
        );
        let mut right = spawn_stage(self.b.clone(), mid, output, buffer, cancel, config);

        let mut left_done = false;
        let mut right_done = false;
        let mut first_err: Option<Error> = None;

        while !(left_done && right_done) {
            let res = tokio::select! {
                res = &mut left, if !left_done => {
                    left_done = true;
                    flatten(res)
                }
                res = &mut right, if !right_done => {
                    right_done = true;
                    flatten(res)
                }
            };

            if let Err(err) = res {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub trait PipeExt<I, O>: Pipe<I, O> + Sized + 'static
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn pipe<N, P2>(self, next: P2) -> Chain<Self, P2, O>
    where
        N: Send + 'static,
        P2: Pipe<O, N> + 'static,
    {
        Chain::new(self, next)
    }

    /// Append a [`TransformStage`] named `stage` that maps every item with `f`.
    fn map<N, F>(self, stage: &'static str, f: F) -> Chain<Self, TransformStage<F>, O>
    where
        N: Send + 'static,
        F: Fn(O) -> N + Send + Sync + 'static,
    {
        Chain::new(self, TransformStage::new(stage, f))
    }
}

impl<I, O, P> PipeExt<I, O> for P
where
    I: Send + 'static,
    O: Send + 'static,
    P: Pipe<I, O> + Sized + 'static,
{
}
