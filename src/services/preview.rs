use crate::api::{PreviewRequest, PreviewResult, TranscriptApi};
use crate::reference;
use crate::ClientResult;

/// Fetch a preview of one transcript.
///
/// The language code is sent as-is; it does not have to come from a discovery.
pub async fn preview<A>(
    api: &A,
    raw_reference: &str,
    language_code: &str,
    preserve_formatting: bool,
) -> ClientResult<PreviewResult>
where
    A: TranscriptApi + ?Sized,
{
    let reference = reference::normalize(raw_reference)?;

    tracing::info!("Fetching {} preview for: {}", language_code, reference);
    let result = api
        .fetch_preview(&PreviewRequest {
            url: reference.to_string(),
            languages: vec![language_code.to_string()],
            preserve_formatting,
        })
        .await?;

    if result.is_truncated() {
        tracing::debug!(
            "Preview holds {} of {} snippets",
            result.snippets.len(),
            result.total_snippets
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockTranscriptApi, Snippet};

    fn sample(language: &str, total: u64) -> PreviewResult {
        PreviewResult {
            language: language.to_string(),
            total_snippets: total,
            snippets: vec![Snippet {
                start: 61.2,
                text: "hello there".to_string(),
                duration: None,
            }],
            video_id: None,
            language_code: None,
            is_generated: None,
        }
    }

    #[tokio::test]
    async fn test_blank_reference_makes_no_request() {
        let mut api = MockTranscriptApi::new();
        api.expect_fetch_preview().times(0);

        tokio_test::assert_err!(preview(&api, "", "en", false).await);
    }

    #[tokio::test]
    async fn test_request_carries_language_and_formatting() {
        let mut api = MockTranscriptApi::new();
        api.expect_fetch_preview()
            .withf(|req| req.url == "abc123" && req.languages == vec!["ja"] && req.preserve_formatting)
            .times(1)
            .returning(|_| Ok(sample("Japanese", 1)));

        let result = preview(&api, "abc123", "ja", true).await.unwrap();
        assert_eq!(result.language, "Japanese");
        assert!(!result.is_truncated());
    }

    #[tokio::test]
    async fn test_total_count_kept_when_truncated() {
        let mut api = MockTranscriptApi::new();
        api.expect_fetch_preview()
            .returning(|_| Ok(sample("English", 500)));

        let result = preview(&api, "abc123", "en", false).await.unwrap();
        assert_eq!(result.total_snippets, 500);
        assert_eq!(result.snippets.len(), 1);
    }
}
