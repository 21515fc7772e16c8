use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Receives finished segments from the sink stage.
///
/// Called from the sink's task; must not block for long.
pub trait SegmentEmitter: Send + Sync {
    fn emit_segment(&self, segment: String);
}

/// Prints each segment on its own line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutEmitter;

impl SegmentEmitter for StdoutEmitter {
    fn emit_segment(&self, segment: String) {
        let mut out = std::io::stdout().lock();
        if let Err(_err) = writeln!(out, "{segment}").and_then(|()| out.flush()) {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::WARN, event = "textpipe.sink.write_failed", error = %_err, "textpipe.sink.write_failed");
        }
    }
}

/// Keeps every segment in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectEmitter {
    segments: Arc<Mutex<Vec<String>>>,
}

impl CollectEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the segments emitted so far.
    pub fn segments(&self) -> Vec<String> {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SegmentEmitter for CollectEmitter {
    fn emit_segment(&self, segment: String) {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(segment);
    }
}

impl<E: SegmentEmitter + ?Sized> SegmentEmitter for Arc<E> {
    fn emit_segment(&self, segment: String) {
        (**self).emit_segment(segment)
    }
}
