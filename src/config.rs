use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sink::segment::DEFAULT_SEGMENT_WIDTH;
use crate::source::stage::{OverlongPolicy, DEFAULT_MAX_LINE_LEN, DEFAULT_SENTINEL};
use crate::text::token::{DEFAULT_MARKER, DEFAULT_TOKEN};

pub const DEFAULT_CAPACITY: usize = 128;

/// Settings for a [`TextPipeline`](crate::text::TextPipeline).
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Characters per emitted segment.
    pub segment_width: usize,
    /// Items each inter-stage channel holds before the producer waits.
    pub capacity: usize,
    /// Capacity of the channel a named stage pushes into, overriding `capacity`.
    pub stage_capacity: HashMap<String, usize>,
    /// Longest accepted line in characters, terminator excluded.
    pub max_line_len: usize,
    pub overlong: OverlongPolicy,
    /// Input line that ends the stream.
    pub sentinel: String,
    pub token: String,
    pub marker: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_width: DEFAULT_SEGMENT_WIDTH,
            capacity: DEFAULT_CAPACITY,
            stage_capacity: HashMap::new(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            overlong: OverlongPolicy::default(),
            sentinel: DEFAULT_SENTINEL.to_owned(),
            token: DEFAULT_TOKEN.to_owned(),
            marker: DEFAULT_MARKER.to_owned(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.segment_width == 0 {
            return Err(Error::config("segment_width must be at least 1"));
        }
        if self.capacity == 0 {
            return Err(Error::config("capacity must be at least 1"));
        }
        if let Some((stage, _)) = self.stage_capacity.iter().find(|(_, n)| **n == 0) {
            return Err(Error::config(format!(
                "stage_capacity for `{stage}` must be at least 1"
            )));
        }
        if self.max_line_len == 0 {
            return Err(Error::config("max_line_len must be at least 1"));
        }
        if self.token.is_empty() {
            return Err(Error::config("token must not be empty"));
        }
        Ok(())
    }
}
