//! Single owner of the interaction state.
//!
//! Every request is issued through a `begin_*` call that hands out a [`Ticket`]
//! and resolved through the matching `resolve_*` call. A ticket is honoured only
//! while its epoch is current and it is still the latest request of its
//! category; anything else is dropped without touching the state.

use serde::Serialize;

use crate::api::{DiscoveryResult, ExportOptions, FileFormat, PreviewResult};
use crate::reference::{self, VideoReference};
use crate::services::discovery::{Discovery, Selection};
use crate::services::export::SavedArtifact;
use crate::ClientResult;

pub use crate::api::Operation;

/// Language selected before anything has been discovered
pub const DEFAULT_LANGUAGE: &str = "en";

/// What the store is currently waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Discovering,
    PreviewLoading,
    Downloading,
}

/// The single user-visible message; an error and a success never coexist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notice {
    Error(String),
    Success(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Error(msg) | Notice::Success(msg) => msg,
        }
    }
}

/// Tag captured when a request is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    pub epoch: u64,
    pub seq: u64,
}

/// Whether a resolution changed the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingDiscovery {
    pub ticket: Ticket,
    pub reference: VideoReference,
    pub selected_language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingPreview {
    pub ticket: Ticket,
    pub reference: VideoReference,
    pub language: String,
    pub preserve_formatting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingDownload {
    pub ticket: Ticket,
    pub reference: VideoReference,
    pub options: ExportOptions,
}

/// Initial option values, usually taken from the config file
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDefaults {
    pub language: String,
    pub file_format: FileFormat,
    pub include_timestamps: bool,
    pub preserve_formatting: bool,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            file_format: FileFormat::Txt,
            include_timestamps: true,
            preserve_formatting: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct InFlight {
    discovery: Option<u64>,
    preview: Option<u64>,
    download: Option<u64>,
}

impl InFlight {
    fn slot(&mut self, operation: Operation) -> &mut Option<u64> {
        match operation {
            Operation::Discovery => &mut self.discovery,
            Operation::Preview => &mut self.preview,
            Operation::Download => &mut self.download,
        }
    }

    fn get(&self, operation: Operation) -> Option<u64> {
        match operation {
            Operation::Discovery => self.discovery,
            Operation::Preview => self.preview,
            Operation::Download => self.download,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionStateStore {
    input: String,
    epoch: u64,
    next_seq: u64,
    in_flight: InFlight,

    languages: Option<DiscoveryResult>,
    selected_language: String,
    extra_languages: Vec<String>,
    preview: Option<PreviewResult>,
    last_saved: Option<SavedArtifact>,

    file_format: FileFormat,
    include_timestamps: bool,
    preserve_formatting: bool,

    notice: Option<Notice>,
    default_language: String,
}

impl Default for InteractionStateStore {
    fn default() -> Self {
        Self::new(StoreDefaults::default())
    }
}

impl InteractionStateStore {
    pub fn new(defaults: StoreDefaults) -> Self {
        Self {
            input: String::new(),
            epoch: 0,
            next_seq: 0,
            in_flight: InFlight::default(),
            languages: None,
            selected_language: defaults.language.clone(),
            extra_languages: Vec::new(),
            preview: None,
            last_saved: None,
            file_format: defaults.file_format,
            include_timestamps: defaults.include_timestamps,
            preserve_formatting: defaults.preserve_formatting,
            notice: None,
            default_language: defaults.language,
        }
    }

    // ---- reference ----

    /// Replace the raw input. A different value starts a new epoch and drops
    /// everything derived from the old one; requests still in flight for the
    /// old value are left to resolve and be discarded.
    pub fn set_reference(&mut self, raw: &str) -> bool {
        if raw == self.input {
            return false;
        }

        self.input = raw.to_string();
        self.epoch += 1;
        self.in_flight = InFlight::default();
        self.languages = None;
        self.selected_language = self.default_language.clone();
        self.preview = None;
        self.last_saved = None;
        self.notice = None;

        tracing::debug!("Reference changed, epoch {}", self.epoch);
        true
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn reference(&self) -> ClientResult<VideoReference> {
        reference::normalize(&self.input)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // ---- options ----

    pub fn select_language(&mut self, language_code: &str) {
        self.selected_language = language_code.trim().to_string();
    }

    pub fn selected_language(&self) -> &str {
        &self.selected_language
    }

    /// Add a lower-priority export language after the selected one
    pub fn add_export_language(&mut self, language_code: &str) {
        let code = language_code.trim().to_string();
        if !code.is_empty() && !self.extra_languages.contains(&code) {
            self.extra_languages.push(code);
        }
    }

    pub fn remove_export_language(&mut self, language_code: &str) {
        self.extra_languages.retain(|c| c != language_code.trim());
    }

    pub fn set_file_format(&mut self, file_format: FileFormat) {
        self.file_format = file_format;
    }

    pub fn set_include_timestamps(&mut self, include: bool) {
        self.include_timestamps = include;
    }

    pub fn set_preserve_formatting(&mut self, preserve: bool) {
        self.preserve_formatting = preserve;
    }

    /// Export options built from the current selection
    pub fn export_options(&self) -> ExportOptions {
        let languages = std::iter::once(self.selected_language.clone())
            .chain(self.extra_languages.iter().cloned());

        ExportOptions::new(languages, self.file_format)
            .include_timestamps(self.include_timestamps)
            .preserve_formatting(self.preserve_formatting)
    }

    // ---- read side ----

    pub fn languages(&self) -> Option<&DiscoveryResult> {
        self.languages.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewResult> {
        self.preview.as_ref()
    }

    pub fn last_saved(&self) -> Option<&SavedArtifact> {
        self.last_saved.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight.download.is_some() {
            Phase::Downloading
        } else if self.in_flight.preview.is_some() {
            Phase::PreviewLoading
        } else if self.in_flight.discovery.is_some() {
            Phase::Discovering
        } else {
            Phase::Idle
        }
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        self.in_flight.get(operation).is_some()
    }

    /// Whether the control that starts `operation` should be enabled
    pub fn can_start(&self, operation: Operation) -> bool {
        if self.is_busy(operation) || self.input.trim().is_empty() {
            return false;
        }
        match operation {
            Operation::Discovery => self.languages.is_none(),
            Operation::Preview => true,
            Operation::Download => !self.export_options().languages.is_empty(),
        }
    }

    /// True while `ticket` would still be honoured on resolution
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch && self.in_flight.get(ticket.operation) == Some(ticket.seq)
    }

    // ---- transitions ----

    fn issue(&mut self, operation: Operation) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;
        *self.in_flight.slot(operation) = Some(seq);

        Ticket {
            operation,
            epoch: self.epoch,
            seq,
        }
    }

    /// Take the in-flight slot for `ticket`, or report it stale
    fn settle(&mut self, ticket: &Ticket) -> Applied {
        if !self.is_current(ticket) {
            tracing::debug!(
                "Discarding stale {} result (epoch {}, seq {}; current epoch {})",
                ticket.operation,
                ticket.epoch,
                ticket.seq,
                self.epoch
            );
            return Applied::Discarded;
        }
        *self.in_flight.slot(ticket.operation) = None;
        Applied::Applied
    }

    fn validated_reference(&mut self) -> ClientResult<VideoReference> {
        self.reference().map_err(|err| {
            self.notice = Some(Notice::Error(err.to_string()));
            err
        })
    }

    fn clear_error(&mut self) {
        if self.notice.as_ref().is_some_and(Notice::is_error) {
            self.notice = None;
        }
    }

    /// Start a discovery unless one is running or a result is cached
    pub fn begin_discovery(&mut self) -> ClientResult<Option<PendingDiscovery>> {
        if self.is_busy(Operation::Discovery) || self.languages.is_some() {
            return Ok(None);
        }
        let reference = self.validated_reference()?;

        self.clear_error();
        let ticket = self.issue(Operation::Discovery);

        Ok(Some(PendingDiscovery {
            ticket,
            reference,
            selected_language: self.selected_language.clone(),
        }))
    }

    /// The language control gained focus; discover lazily if there is
    /// something to discover for
    pub fn on_language_control_focused(&mut self) -> Option<PendingDiscovery> {
        if self.input.trim().is_empty() {
            return None;
        }
        self.begin_discovery().ok().flatten()
    }

    pub fn resolve_discovery(&mut self, ticket: Ticket, outcome: ClientResult<Discovery>) -> Applied {
        if self.settle(&ticket) == Applied::Discarded {
            return Applied::Discarded;
        }

        match outcome {
            Ok(Discovery { result, selection }) => {
                if let Selection::Fallback(code) = selection {
                    tracing::info!("Selected language not available, using '{}'", code);
                    self.selected_language = code;
                }
                self.languages = Some(result);
            }
            Err(err) => {
                self.languages = None;
                self.notice = Some(Notice::Error(err.to_string()));
            }
        }
        Applied::Applied
    }

    pub fn begin_preview(&mut self) -> ClientResult<Option<PendingPreview>> {
        if self.is_busy(Operation::Preview) {
            return Ok(None);
        }
        let reference = self.validated_reference()?;

        self.notice = None;
        let ticket = self.issue(Operation::Preview);

        Ok(Some(PendingPreview {
            ticket,
            reference,
            language: self.selected_language.clone(),
            preserve_formatting: self.preserve_formatting,
        }))
    }

    pub fn resolve_preview(&mut self, ticket: Ticket, outcome: ClientResult<PreviewResult>) -> Applied {
        if self.settle(&ticket) == Applied::Discarded {
            return Applied::Discarded;
        }

        match outcome {
            Ok(preview) => {
                self.preview = Some(preview);
                self.notice = Some(Notice::Success("Transcript loaded".to_string()));
            }
            Err(err) => {
                self.preview = None;
                self.notice = Some(Notice::Error(err.to_string()));
            }
        }
        Applied::Applied
    }

    pub fn begin_download(&mut self) -> ClientResult<Option<PendingDownload>> {
        if self.is_busy(Operation::Download) {
            return Ok(None);
        }
        let reference = self.validated_reference()?;

        let options = self.export_options();
        if options.languages.is_empty() {
            let err = crate::ClientError::validation(crate::services::export::NO_LANGUAGE_SELECTED);
            self.notice = Some(Notice::Error(err.to_string()));
            return Err(err);
        }

        self.notice = None;
        let ticket = self.issue(Operation::Download);

        Ok(Some(PendingDownload {
            ticket,
            reference,
            options,
        }))
    }

    pub fn resolve_download(&mut self, ticket: Ticket, outcome: ClientResult<SavedArtifact>) -> Applied {
        if self.settle(&ticket) == Applied::Discarded {
            return Applied::Discarded;
        }

        match outcome {
            Ok(saved) => {
                // The sink may have renamed the file to avoid a collision
                let on_disk = saved
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| saved.filename.clone());
                self.notice = Some(Notice::Success(format!("Downloaded {}", on_disk)));
                self.last_saved = Some(saved);
            }
            Err(err) => {
                self.notice = Some(Notice::Error(err.to_string()));
            }
        }
        Applied::Applied
    }
}
