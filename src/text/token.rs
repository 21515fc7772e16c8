use crate::error::{Error, Result};
use crate::pipeline::transform::TransformStage;

pub const DEFAULT_TOKEN: &str = "++";
pub const DEFAULT_MARKER: &str = "^";

/// Rewrites a reserved token into a marker.
///
/// Occurrences are found left to right and never overlap: after a match the
/// scan resumes right after the consumed token, so `"+++"` becomes `"^+"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReplacer {
    token: String,
    marker: String,
}

impl TokenReplacer {
    pub fn new(token: impl Into<String>, marker: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("replacement token must not be empty"));
        }
        Ok(Self {
            token,
            marker: marker.into(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn replace(&self, text: &str) -> String {
        text.replace(self.token.as_str(), &self.marker)
    }

    fn replace_owned(&self, item: String) -> String {
        if item.contains(self.token.as_str()) {
            self.replace(&item)
        } else {
            item
        }
    }

    /// The `replace_token` stage.
    pub fn into_stage(self) -> TransformStage<impl Fn(String) -> String + Send + Sync + 'static> {
        TransformStage::new("replace_token", move |item: String| self.replace_owned(item))
    }
}

impl Default for TokenReplacer {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN.to_owned(),
            marker: DEFAULT_MARKER.to_owned(),
        }
    }
}

/// Replace every non-overlapping `"++"` with `"^"`.
pub fn replace_token(text: &str) -> String {
    text.replace(DEFAULT_TOKEN, DEFAULT_MARKER)
}
