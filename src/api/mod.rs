use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod http;

pub use http::HttpTranscriptApi;

use crate::reference::VideoReference;
use crate::{ClientError, ClientResult};

/// The three request categories the client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Discovery,
    Preview,
    Download,
}

impl Operation {
    /// Message shown when the service fails without a `detail`
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Discovery => "Unable to fetch transcript list",
            Operation::Preview | Operation::Download => "Something went wrong",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Discovery => write!(f, "discovery"),
            Operation::Preview => write!(f, "preview"),
            Operation::Download => write!(f, "download"),
        }
    }
}

/// A language the transcript can be machine-translated into.
///
/// The service has sent both bare codes and `{language, language_code}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationLanguage {
    Code(String),
    Named {
        language: String,
        language_code: String,
    },
}

impl TranslationLanguage {
    pub fn code(&self) -> &str {
        match self {
            TranslationLanguage::Code(code) => code,
            TranslationLanguage::Named { language_code, .. } => language_code,
        }
    }
}

/// Metadata about one available transcript language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptDescriptor {
    /// Human readable language name
    pub language: String,

    /// Language code, unique within one discovery result
    pub language_code: String,

    /// Whether the transcript was generated automatically
    pub is_generated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_translatable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_languages: Option<Vec<TranslationLanguage>>,
}

impl TranscriptDescriptor {
    pub fn new(language: impl Into<String>, language_code: impl Into<String>, is_generated: bool) -> Self {
        Self {
            language: language.into(),
            language_code: language_code.into(),
            is_generated,
            is_translatable: None,
            translation_languages: None,
        }
    }

    /// An absent flag means the transcript cannot be translated
    pub fn is_translatable(&self) -> bool {
        self.is_translatable.unwrap_or(false)
    }

    /// An absent list counts as no translation targets
    pub fn translation_count(&self) -> usize {
        self.translation_languages.as_ref().map_or(0, Vec::len)
    }
}

/// Languages discovered for one reference, in the order the service returned them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    reference: VideoReference,
    transcripts: Vec<TranscriptDescriptor>,
}

impl DiscoveryResult {
    /// Build a result, keeping the first descriptor for each language code
    pub fn new(reference: VideoReference, transcripts: Vec<TranscriptDescriptor>) -> Self {
        let mut unique: Vec<TranscriptDescriptor> = Vec::with_capacity(transcripts.len());
        for descriptor in transcripts {
            if unique.iter().any(|d| d.language_code == descriptor.language_code) {
                tracing::warn!(
                    "Dropping duplicate transcript language code '{}' for {}",
                    descriptor.language_code,
                    reference
                );
                continue;
            }
            unique.push(descriptor);
        }

        Self {
            reference,
            transcripts: unique,
        }
    }

    pub fn reference(&self) -> &VideoReference {
        &self.reference
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptDescriptor> {
        self.transcripts.iter()
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn first(&self) -> Option<&TranscriptDescriptor> {
        self.transcripts.first()
    }

    pub fn contains(&self, language_code: &str) -> bool {
        self.get(language_code).is_some()
    }

    pub fn get(&self, language_code: &str) -> Option<&TranscriptDescriptor> {
        self.transcripts
            .iter()
            .find(|d| d.language_code == language_code)
    }
}

/// One line of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Start time in seconds
    pub start: f64,

    pub text: String,

    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// A possibly truncated transcript preview.
///
/// `total_snippets` counts the whole transcript while `snippets` holds only what
/// the service chose to send; neither is derived from the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub language: String,

    pub total_snippets: u64,

    #[serde(default)]
    pub snippets: Vec<Snippet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_generated: Option<bool>,
}

impl PreviewResult {
    /// True when the service sent fewer snippets than the transcript holds
    pub fn is_truncated(&self) -> bool {
        (self.snippets.len() as u64) < self.total_snippets
    }
}

/// File formats the service can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Plain text
    #[default]
    Txt,
    /// Portable Document Format
    Pdf,
    /// Microsoft Word
    Docx,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Txt => "txt",
            FileFormat::Pdf => "pdf",
            FileFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(FileFormat::Txt),
            "pdf" => Ok(FileFormat::Pdf),
            "docx" | "doc" => Ok(FileFormat::Docx),
            other => Err(ClientError::validation(format!(
                "unsupported file format: {}",
                other
            ))),
        }
    }
}

/// Options for one export request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Language codes in priority order; the service uses the first one available
    pub languages: Vec<String>,
    pub file_format: FileFormat,
    pub include_timestamps: bool,
    pub preserve_formatting: bool,
}

impl ExportOptions {
    /// Blank and repeated codes are dropped, the first occurrence keeps its position
    pub fn new<I, S>(languages: I, file_format: FileFormat) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for code in languages {
            let code = code.into().trim().to_string();
            if !code.is_empty() && !unique.contains(&code) {
                unique.push(code);
            }
        }

        Self {
            languages: unique,
            file_format,
            include_timestamps: true,
            preserve_formatting: false,
        }
    }

    pub fn include_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }

    pub fn preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRequest {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRequest {
    pub url: String,
    pub languages: Vec<String>,
    pub preserve_formatting: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub languages: Vec<String>,
    pub preserve_formatting: bool,
    pub file_format: FileFormat,
    pub include_timestamps: bool,
}

impl DownloadRequest {
    pub fn new(reference: &VideoReference, options: &ExportOptions) -> Self {
        Self {
            url: reference.to_string(),
            languages: options.languages.clone(),
            preserve_formatting: options.preserve_formatting,
            file_format: options.file_format,
            include_timestamps: options.include_timestamps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub transcripts: Vec<TranscriptDescriptor>,

    #[serde(default)]
    pub video_id: Option<String>,
}

/// Binary download body plus the headers the client cares about
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDownload {
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,

    #[serde(default)]
    pub timestamp: Option<String>,
}

/// The remote transcript service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    /// List the transcript languages available for a video
    async fn list_transcripts(&self, request: &ListRequest) -> ClientResult<ListResponse>;

    /// Fetch a bounded preview of one transcript
    async fn fetch_preview(&self, request: &PreviewRequest) -> ClientResult<PreviewResult>;

    /// Render a transcript file on the service and return its bytes
    async fn download(&self, request: &DownloadRequest) -> ClientResult<RawDownload>;

    /// Check that the service is up
    async fn health(&self) -> ClientResult<HealthStatus>;
}
