use crate::api::TranscriptApi;
use crate::services::{self, export::ArtifactSink};
use crate::store::{Applied, InteractionStateStore, Notice};
use crate::ClientResult;

/// Drives the state store against a transcript service and an artifact sink.
///
/// Each operation is begin → request → resolve. `Ok(None)` means the store
/// declined to start (same operation already running, or nothing to do); a
/// local validation failure is returned as `Err` and also recorded as the
/// store's notice.
pub struct Session<A, S> {
    store: InteractionStateStore,
    api: A,
    sink: S,
}

impl<A, S> Session<A, S>
where
    A: TranscriptApi,
    S: ArtifactSink,
{
    pub fn new(store: InteractionStateStore, api: A, sink: S) -> Self {
        Self { store, api, sink }
    }

    pub fn store(&self) -> &InteractionStateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut InteractionStateStore {
        &mut self.store
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.store.notice()
    }

    pub fn set_reference(&mut self, raw: &str) -> bool {
        self.store.set_reference(raw)
    }

    /// Lazily discover languages the first time the language control is focused
    pub async fn focus_language_control(&mut self) -> Option<Applied> {
        let pending = self.store.on_language_control_focused()?;

        let outcome =
            services::discover(&self.api, pending.reference.as_str(), &pending.selected_language)
                .await;
        Some(self.store.resolve_discovery(pending.ticket, outcome))
    }

    pub async fn discover(&mut self) -> ClientResult<Option<Applied>> {
        let Some(pending) = self.store.begin_discovery()? else {
            return Ok(None);
        };

        let outcome =
            services::discover(&self.api, pending.reference.as_str(), &pending.selected_language)
                .await;
        Ok(Some(self.store.resolve_discovery(pending.ticket, outcome)))
    }

    pub async fn preview(&mut self) -> ClientResult<Option<Applied>> {
        let Some(pending) = self.store.begin_preview()? else {
            return Ok(None);
        };

        let outcome = services::preview(
            &self.api,
            pending.reference.as_str(),
            &pending.language,
            pending.preserve_formatting,
        )
        .await;
        Ok(Some(self.store.resolve_preview(pending.ticket, outcome)))
    }

    /// Export with the store's current options and hand the file to the sink.
    ///
    /// A result that went stale while the request was in flight is never saved.
    pub async fn export(&mut self) -> ClientResult<Option<Applied>> {
        let Some(pending) = self.store.begin_download()? else {
            return Ok(None);
        };

        let result =
            services::export_file(&self.api, pending.reference.as_str(), &pending.options).await;

        if !self.store.is_current(&pending.ticket) {
            tracing::debug!("Reference changed during download, not saving");
            return Ok(Some(Applied::Discarded));
        }

        let outcome = result.and_then(|artifact| services::persist(&self.sink, artifact));
        Ok(Some(self.store.resolve_download(pending.ticket, outcome)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        FileFormat, ListResponse, MockTranscriptApi, PreviewResult, RawDownload, Snippet,
        TranscriptDescriptor,
    };
    use crate::services::export::MockArtifactSink;
    use crate::sink::FileSink;
    use crate::store::Phase;
    use crate::ClientError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const WATCH_URL: &str = "https://www.youtube.com/watch?v=abc123";

    fn english_only() -> ListResponse {
        ListResponse {
            transcripts: vec![TranscriptDescriptor::new("English", "en", false)],
            video_id: Some("abc123".to_string()),
        }
    }

    fn idle_sink() -> MockArtifactSink {
        let mut sink = MockArtifactSink::new();
        sink.expect_persist_artifact().times(0);
        sink
    }

    #[tokio::test]
    async fn test_discover_then_export_txt() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts()
            .withf(|req| req.url == WATCH_URL)
            .times(1)
            .returning(|_| Ok(english_only()));
        api.expect_download()
            .withf(|req| {
                req.languages == vec!["en"]
                    && req.file_format == FileFormat::Txt
                    && req.include_timestamps
                    && !req.preserve_formatting
            })
            .times(1)
            .returning(|_| {
                Ok(RawDownload {
                    bytes: b"[0:00] hello".to_vec(),
                    content_disposition: None,
                    content_type: Some("text/plain".to_string()),
                })
            });

        let dir = TempDir::new().unwrap();
        let mut session = Session::new(
            InteractionStateStore::default(),
            api,
            FileSink::new(dir.path()),
        );

        session.set_reference(WATCH_URL);
        assert_eq!(session.focus_language_control().await, Some(Applied::Applied));
        assert_eq!(session.store().selected_language(), "en");

        session.store_mut().set_file_format(FileFormat::Txt);
        session.store_mut().set_include_timestamps(true);
        session.store_mut().set_preserve_formatting(false);
        assert_eq!(session.export().await.unwrap(), Some(Applied::Applied));

        let saved = session.store().last_saved().unwrap();
        assert_eq!(saved.filename, "transcript.txt");
        assert_eq!(saved.path, dir.path().join("transcript.txt"));
        assert_eq!(fs_err::read(&saved.path).unwrap(), b"[0:00] hello");
        assert_eq!(
            session.notice(),
            Some(&Notice::Success("Downloaded transcript.txt".to_string()))
        );
    }

    #[tokio::test]
    async fn test_focus_discovers_only_once() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts()
            .times(1)
            .returning(|_| Ok(english_only()));

        let mut session = Session::new(InteractionStateStore::default(), api, idle_sink());
        session.set_reference("abc123");

        assert!(session.focus_language_control().await.is_some());
        assert!(session.focus_language_control().await.is_none());
        assert_eq!(session.discover().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_reference_never_reaches_the_api() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts().times(0);
        api.expect_fetch_preview().times(0);
        api.expect_download().times(0);

        let mut session = Session::new(InteractionStateStore::default(), api, idle_sink());
        session.set_reference(" \t ");

        assert!(session.focus_language_control().await.is_none());
        assert!(session.discover().await.unwrap_err().is_local());
        assert!(session.preview().await.unwrap_err().is_local());
        assert!(session.export().await.unwrap_err().is_local());
        assert_eq!(session.store().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_empty_language_set_never_reaches_the_api() {
        let mut api = MockTranscriptApi::new();
        api.expect_download().times(0);

        let mut session = Session::new(InteractionStateStore::default(), api, idle_sink());
        session.set_reference("abc123");
        session.store_mut().select_language("");
        session.store_mut().set_file_format(FileFormat::Pdf);

        let err = session.export().await.unwrap_err();
        assert_eq!(err, ClientError::Validation("no language selected".to_string()));
    }

    #[tokio::test]
    async fn test_preview_uses_selected_language() {
        let mut api = MockTranscriptApi::new();
        api.expect_fetch_preview()
            .withf(|req| req.languages == vec!["th"] && req.preserve_formatting)
            .times(1)
            .returning(|_| {
                Ok(PreviewResult {
                    language: "Thai".to_string(),
                    total_snippets: 80,
                    snippets: vec![Snippet {
                        start: 0.5,
                        text: "สวัสดี".to_string(),
                        duration: Some(2.0),
                    }],
                    video_id: Some("abc123".to_string()),
                    language_code: Some("th".to_string()),
                    is_generated: Some(true),
                })
            });

        let mut session = Session::new(InteractionStateStore::default(), api, idle_sink());
        session.set_reference("abc123");
        session.store_mut().select_language("th");
        session.store_mut().set_preserve_formatting(true);

        session.preview().await.unwrap();
        let preview = session.store().preview().unwrap();
        assert_eq!(preview.total_snippets, 80);
        assert_eq!(preview.snippets.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_error_becomes_notice() {
        let mut api = MockTranscriptApi::new();
        api.expect_download().returning(|_| {
            Err(ClientError::Remote {
                status: 404,
                message: "No transcript for this video".to_string(),
            })
        });

        let mut session = Session::new(InteractionStateStore::default(), api, idle_sink());
        session.set_reference("abc123");

        assert_eq!(session.export().await.unwrap(), Some(Applied::Applied));
        assert_eq!(
            session.notice(),
            Some(&Notice::Error("No transcript for this video".to_string()))
        );
        assert!(session.store().last_saved().is_none());
    }

    #[tokio::test]
    async fn test_sink_failure_becomes_notice() {
        let mut api = MockTranscriptApi::new();
        api.expect_download().returning(|_| {
            Ok(RawDownload {
                bytes: b"x".to_vec(),
                content_disposition: Some(r#"attachment; filename="abc123_en.txt""#.to_string()),
                content_type: None,
            })
        });
        let mut sink = MockArtifactSink::new();
        sink.expect_persist_artifact()
            .withf(|_, name| name == "abc123_en.txt")
            .returning(|_, _| Err(ClientError::Save("disk full".to_string())));

        let mut session = Session::new(InteractionStateStore::default(), api, sink);
        session.set_reference("abc123");
        session.export().await.unwrap();

        assert_eq!(
            session.notice(),
            Some(&Notice::Error("Could not save file: disk full".to_string()))
        );
        assert_eq!(session.store().last_saved().map(|s| s.path.clone()), None::<PathBuf>);
    }
}
