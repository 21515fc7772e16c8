//! # textpipe
//!
//! **A bounded, cancellable four-stage text pipeline.**
//!
//! `textpipe` reads lines, collapses line separators into spaces, rewrites the
//! reserved token `++` into `^`, and re-emits the resulting character stream
//! as fixed-width segments. Every stage runs on its own task and hands work
//! to the next one through a bounded [`StageChannel`].
//!
//! ---
//!
//! ## Core Model
//!
//! ```text
//! Source → ch1 → Normalize → ch2 → ReplaceToken → ch3 → SegmentSink
//! ```
//!
//! Each stage implements the [`Pipe`] trait. Stages are composed with
//! [`PipeExt::pipe`] and launched through a [`Runtime`].
//!
//! - A producer waits while its output channel is full.
//! - A consumer waits while its input channel is empty.
//! - "No more data" is a channel state, not a special item: a stage closes
//!   its output exactly once, after its input reported [`EndOfStream`] (or
//!   its line source ran dry, or it saw the sentinel line `STOP`).
//! - Closed channels still drain, so nothing queued is lost.
//!
//! ---
//!
//! ## Example
//!
//! ```no_run
//! use textpipe::config::PipelineConfig;
//! use textpipe::sink::CollectEmitter;
//! use textpipe::source::VecLineSource;
//! use textpipe::text::TextPipeline;
//!
//! #[tokio::main]
//! async fn main() -> textpipe::error::Result<()> {
//!     let config = PipelineConfig {
//!         segment_width: 5,
//!         ..PipelineConfig::default()
//!     };
//!     let emitter = CollectEmitter::new();
//!
//!     let report = TextPipeline::new(config)?
//!         .run(VecLineSource::new(["a++b\n", "c\n", "STOP\n"]), emitter.clone())
//!         .await?;
//!
//!     assert_eq!(emitter.segments(), vec!["a^b c", " "]);
//!     assert_eq!(report.chars_emitted, 6);
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Custom Chains
//!
//! The building blocks are public, so other transforms can be slotted in:
//!
//! ```no_run
//! use textpipe::pipeline::chain::PipeExt;
//! use textpipe::pipeline::runtime::Runtime;
//! use textpipe::sink::{SegmentSink, StdoutEmitter};
//! use textpipe::source::{ReaderLineSource, SourceStage};
//! use textpipe::text::normalize_stage;
//!
//! # async fn demo() -> textpipe::error::Result<()> {
//! let pipe = SourceStage::new(ReaderLineSource::stdin())
//!     .pipe::<String, _>(normalize_stage())
//!     .map("shout", |line: String| line.to_uppercase())
//!     .pipe::<(), _>(SegmentSink::new(80, StdoutEmitter));
//!
//! let (start, _cancel, handle) = Runtime::new().buffer(16).spawn_sink::<(), _>(pipe);
//! start.close();
//! handle.await??;
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! ## Cancellation
//!
//! A [`CancelToken`] is shared by every stage. Cancelling it makes each
//! stage stop waiting, close its output and exit; the sink flushes whatever
//! partial segment it holds. Segments already emitted stay emitted.
//!
//! ---
//!
//! ## Error Contract
//!
//! - [`EndOfStream`] is not an error: it is how a stage learns to stop.
//! - Pushing into a closed channel outside of a shutdown is an invariant
//!   violation, surfaced as [`Error::Closed`](error::Error::Closed).
//! - A failing stage ends only itself. Its output is closed, so downstream
//!   stages drain what was already queued and finish normally. Its input is
//!   abandoned, so upstream stages stop at their next push. The first error
//!   is returned through the join handle.
//! - Over-long input lines are truncated (or rejected) and counted; they
//!   never stop the source.
//!
//! ---
//!
//! ## Observability
//!
//! With the default `tracing` feature every stage runs inside a
//! `textpipe.stage` span and emits structured events such as
//! `textpipe.cancelled`, `textpipe.downstream.closed`,
//! `textpipe.source.sentinel`, `textpipe.source.truncated` and
//! `textpipe.sink.flush`.
//!
//! ## Feature Flags
//!
//! - `tracing` *(default)*: tracing spans and events.
//! - `cli` *(default)*: the `textpipe` binary.
//!
//! [`Pipe`]: pipeline::pipe::Pipe
//! [`PipeExt::pipe`]: pipeline::chain::PipeExt::pipe
//! [`Runtime`]: pipeline::runtime::Runtime
//! [`StageChannel`]: pipeline::channel::StageChannel
//! [`EndOfStream`]: pipeline::channel::EndOfStream
//! [`CancelToken`]: pipeline::cancel::CancelToken

pub mod config;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod text;

pub mod prelude {
    //! Convenient imports for most `textpipe` users.

    pub use crate::config::PipelineConfig;
    pub use crate::pipeline::cancel::CancelToken;
    pub use crate::pipeline::chain::PipeExt;
    pub use crate::pipeline::channel::{ClosedError, EndOfStream, StageChannel};
    pub use crate::pipeline::runtime::Runtime;
    pub use crate::text::TextPipeline;
}
