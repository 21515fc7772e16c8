pub mod lines;
pub mod stage;

pub use lines::{LineSource, ReaderLineSource, VecLineSource};
pub use stage::{strip_terminator, OverlongPolicy, SourceStage, SourceStats};
