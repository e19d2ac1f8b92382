//! Transcript Downloader - A Rust CLI client for a YouTube transcript API service
//!
//! This library discovers the transcript languages available for a video, previews
//! transcript text and exports transcripts as txt, pdf or docx files. All of the
//! request orchestration lives in an explicit state store driven by a [`Session`].

pub mod api;
pub mod cli;
pub mod config;
pub mod output;
pub mod reference;
pub mod services;
pub mod session;
pub mod sink;
pub mod store;
pub mod utils;

pub use api::{
    DiscoveryResult, ExportOptions, FileFormat, HttpTranscriptApi, PreviewResult, Snippet,
    TranscriptApi, TranscriptDescriptor,
};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use reference::VideoReference;
pub use services::export::{ArtifactSink, DownloadedArtifact};
pub use session::Session;
pub use store::{InteractionStateStore, Notice, Operation, Phase};

/// Result type used throughout the binary
pub type Result<T> = anyhow::Result<T>;

/// Result type returned by the client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Error types surfaced by the transcript client
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Could not save file: {0}")]
    Save(String),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    /// True for errors detected before any request was issued
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}
