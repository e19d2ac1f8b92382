use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ClientError, ClientResult};

/// Message used when the user has not entered a URL or video ID
pub const MISSING_REFERENCE: &str = "missing reference";

/// A trimmed, non-empty YouTube URL or bare video ID.
///
/// No URL parsing happens on the client; telling a watch URL apart from a bare
/// ID is left to the transcript service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim the raw input and reject it when nothing is left
pub fn normalize(raw: &str) -> ClientResult<VideoReference> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::validation(MISSING_REFERENCE));
    }
    Ok(VideoReference(trimmed.to_string()))
}
