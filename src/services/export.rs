use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::api::{DownloadRequest, ExportOptions, FileFormat, TranscriptApi};
use crate::reference;
use crate::utils::safe_file_name;
use crate::{ClientError, ClientResult};

/// Message used when an export is requested without any language
pub const NO_LANGUAGE_SELECTED: &str = "no language selected";

/// An exported file held in memory until it is handed to a sink
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// An artifact after the sink has stored it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedArtifact {
    /// Name derived from the response
    pub filename: String,
    /// Where the sink actually put it
    pub path: PathBuf,
    pub size: u64,
}

/// Where exported artifacts end up.
///
/// Implementations must release any staging resource they acquire before
/// returning, whether or not the save succeeded.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactSink: Send + Sync {
    /// Store the bytes under the suggested filename and return the final location
    fn persist_artifact(&self, bytes: &[u8], filename: &str) -> ClientResult<PathBuf>;
}

/// Request a transcript file from the service and name it
pub async fn export_file<A>(
    api: &A,
    raw_reference: &str,
    options: &ExportOptions,
) -> ClientResult<DownloadedArtifact>
where
    A: TranscriptApi + ?Sized,
{
    let reference = reference::normalize(raw_reference)?;
    if options.languages.is_empty() {
        return Err(ClientError::validation(NO_LANGUAGE_SELECTED));
    }

    tracing::info!(
        "Exporting {} transcript ({}) for: {}",
        options.file_format,
        options.languages.join(", "),
        reference
    );
    let download = api
        .download(&DownloadRequest::new(&reference, options))
        .await?;

    let filename = derive_filename(download.content_disposition.as_deref(), options.file_format);

    Ok(DownloadedArtifact {
        bytes: download.bytes,
        filename,
    })
}

/// Hand an artifact to the sink; the in-memory copy is dropped afterwards
pub fn persist<S>(sink: &S, artifact: DownloadedArtifact) -> ClientResult<SavedArtifact>
where
    S: ArtifactSink + ?Sized,
{
    let size = artifact.bytes.len() as u64;
    let path = sink.persist_artifact(&artifact.bytes, &artifact.filename)?;
    tracing::info!("Saved {} ({} bytes)", path.display(), size);

    Ok(SavedArtifact {
        size,
        filename: artifact.filename,
        path,
    })
}

/// The suggested filename, or `transcript.<format>` when there is no usable hint.
///
/// Only path components and characters no filesystem accepts are removed from
/// the suggestion; a name that is empty afterwards gets the fallback too.
pub fn derive_filename(content_disposition: Option<&str>, file_format: FileFormat) -> String {
    let fallback = || format!("transcript.{}", file_format.extension());

    let Some(header) = content_disposition else {
        return fallback();
    };
    match filename_from_disposition(header) {
        Ok(name) => safe_file_name(&name).unwrap_or_else(|| {
            tracing::debug!("Suggested filename '{}' is unusable; using fallback", name);
            fallback()
        }),
        Err(err) => {
            tracing::debug!("{}; using fallback filename", err);
            fallback()
        }
    }
}

fn extended_filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)filename\*\s*=\s*([A-Za-z0-9_-]*)'[^']*'([^;\s]+)"#)
            .expect("extended filename pattern is valid")
    })
}

fn filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;]*))"#)
            .expect("filename pattern is valid")
    })
}

/// Extract the filename from a `Content-Disposition` value.
///
/// `filename*=UTF-8''…` wins over `filename=…`; quotes around the plain form
/// are optional.
pub fn filename_from_disposition(header: &str) -> ClientResult<String> {
    if let Some(caps) = extended_filename_regex().captures(header) {
        let charset = caps.get(1).map_or("", |m| m.as_str());
        let encoded = &caps[2];
        if let Some(name) = decode_extended(charset, encoded).filter(|n| !n.is_empty()) {
            return Ok(name);
        }
        tracing::debug!("Could not decode extended filename '{}'", encoded);
    }

    let caps = filename_regex().captures(header).ok_or_else(|| {
        ClientError::Parse(format!("no filename in Content-Disposition '{}'", header))
    })?;

    let name = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim().trim_matches('"'))
        .unwrap_or_default();

    if name.is_empty() {
        return Err(ClientError::Parse(format!(
            "empty filename in Content-Disposition '{}'",
            header
        )));
    }

    Ok(name.to_string())
}

fn decode_extended(charset: &str, encoded: &str) -> Option<String> {
    if charset.eq_ignore_ascii_case("iso-8859-1") {
        let bytes = urlencoding::decode_binary(encoded.as_bytes());
        return Some(bytes.iter().map(|&b| b as char).collect());
    }
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}
