use crate::api::{DiscoveryResult, ListRequest, TranscriptApi};
use crate::reference;
use crate::ClientResult;

/// What the store should do with its selected language after a discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The current selection is available (or nothing was found)
    Keep,
    /// The current selection is unavailable; use this code instead
    Fallback(String),
}

/// A successful discovery plus the selection it implies
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub result: DiscoveryResult,
    pub selection: Selection,
}

/// List the transcript languages available for a reference
pub async fn discover<A>(api: &A, raw_reference: &str, selected: &str) -> ClientResult<Discovery>
where
    A: TranscriptApi + ?Sized,
{
    let reference = reference::normalize(raw_reference)?;

    tracing::info!("Discovering transcript languages for: {}", reference);
    let response = api
        .list_transcripts(&ListRequest {
            url: reference.to_string(),
        })
        .await?;

    let result = DiscoveryResult::new(reference, response.transcripts);
    let selection = selection_for(&result, selected);

    tracing::debug!(
        "Found {} transcript(s), selection {:?}",
        result.len(),
        selection
    );

    Ok(Discovery { result, selection })
}

/// Fall back to the first descriptor when the selected code is not offered
pub fn selection_for(result: &DiscoveryResult, selected: &str) -> Selection {
    match result.first() {
        Some(first) if !result.contains(selected) => Selection::Fallback(first.language_code.clone()),
        _ => Selection::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ListResponse, MockTranscriptApi, Operation, TranscriptDescriptor};
    use crate::ClientError;

    fn listing(codes: &[(&str, &str)]) -> ListResponse {
        ListResponse {
            transcripts: codes
                .iter()
                .map(|(name, code)| TranscriptDescriptor::new(*name, *code, false))
                .collect(),
            video_id: None,
        }
    }

    #[tokio::test]
    async fn test_blank_reference_makes_no_request() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts().times(0);

        let err = discover(&api, "   ", "en").await.unwrap_err();
        assert!(err.is_local());
    }

    #[tokio::test]
    async fn test_sends_trimmed_reference() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts()
            .withf(|req| req.url == "https://www.youtube.com/watch?v=abc123")
            .times(1)
            .returning(|_| Ok(listing(&[("English", "en")])));

        let discovery = discover(&api, "  https://www.youtube.com/watch?v=abc123  ", "en")
            .await
            .unwrap();
        assert_eq!(discovery.result.len(), 1);
        assert_eq!(discovery.selection, Selection::Keep);
    }

    #[tokio::test]
    async fn test_missing_selection_falls_back_to_first() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts()
            .returning(|_| Ok(listing(&[("Thai", "th"), ("Japanese", "ja")])));

        let discovery = discover(&api, "abc123", "en").await.unwrap();
        assert_eq!(discovery.selection, Selection::Fallback("th".to_string()));
    }

    #[tokio::test]
    async fn test_empty_result_keeps_selection() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts().returning(|_| Ok(listing(&[])));

        let discovery = discover(&api, "abc123", "en").await.unwrap();
        assert!(discovery.result.is_empty());
        assert_eq!(discovery.selection, Selection::Keep);
    }

    #[tokio::test]
    async fn test_remote_failure_is_returned() {
        let mut api = MockTranscriptApi::new();
        api.expect_list_transcripts().returning(|_| {
            Err(ClientError::Remote {
                status: 400,
                message: Operation::Discovery.fallback_message().to_string(),
            })
        });

        let err = discover(&api, "abc123", "en").await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to fetch transcript list");
    }
}
