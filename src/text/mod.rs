//! The text rules applied between reading and segmenting, and the assembled
//! four-stage pipeline.

pub mod normalize;
pub mod pipeline;
pub mod token;

pub use normalize::{normalize_separators, normalize_stage};
pub use pipeline::{PipelineReport, RunningPipeline, TextPipeline};
pub use token::{replace_token, TokenReplacer};
