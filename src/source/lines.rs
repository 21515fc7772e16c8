use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

use crate::error::Result;

/// Where the source stage gets its lines from.
#[async_trait]
pub trait LineSource: Send {
    /// The next line, terminator included when the input had one.
    /// `Ok(None)` means the input is exhausted.
    async fn read_line(&mut self) -> Result<Option<String>>;
}

/// Newline-delimited lines from any async reader (stdin, a file, a socket).
pub struct ReaderLineSource<R> {
    reader: R,
    prompt: Option<String>,
}

impl<R> ReaderLineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
        }
    }

    /// Write `prompt` to stderr before every read, for interactive use.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

impl ReaderLineSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl ReaderLineSource<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

#[async_trait]
impl<R> LineSource for ReaderLineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<Option<String>> {
        if let Some(prompt) = &self.prompt {
            let mut stderr = tokio::io::stderr();
            stderr.write_all(prompt.as_bytes()).await?;
            stderr.flush().await?;
        }

        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes).await? == 0 {
            return Ok(None);
        }

        match String::from_utf8(bytes) {
            Ok(line) => Ok(Some(line)),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::event!(
                    tracing::Level::WARN,
                    event = "textpipe.source.malformed",
                    valid_up_to = err.utf8_error().valid_up_to(),
                    "textpipe.source.malformed"
                );
                Ok(Some(String::from_utf8_lossy(err.as_bytes()).into_owned()))
            }
        }
    }
}

/// Lines held in memory.
#[derive(Debug, Clone, Default)]
pub struct VecLineSource {
    lines: VecDeque<String>,
}

impl VecLineSource {
    pub fn new<L, It>(lines: It) -> Self
    where
        L: Into<String>,
        It: IntoIterator<Item = L>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for VecLineSource {
    async fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
