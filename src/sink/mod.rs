pub mod emit;
pub mod segment;

pub use emit::{CollectEmitter, SegmentEmitter, StdoutEmitter};
pub use segment::{SegmentSink, Segmenter, SinkStats};
