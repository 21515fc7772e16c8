use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Process exit code for a clean run.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code for I/O, configuration and other ordinary failures.
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code when a stage pushed into a channel that was already closed.
pub const EXIT_INVARIANT: i32 = 2;

#[derive(Error, Debug)]
pub enum Error {
    /// Failure raised by a caller-defined stage plugged in with
    /// [`PipeExt::pipe`](crate::pipeline::chain::PipeExt::pipe).
    #[error("pipeline error: {context}")]
    Pipeline { context: &'static str },

    #[error("stage `{stage}` pushed into a closed channel")]
    Closed { stage: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Closed { .. } => EXIT_INVARIANT,
            _ => EXIT_FAILURE,
        }
    }
}
