//! Direct export-endpoint retrieval for Google Docs and Sheets.
//!
//! No browser needed: both products expose deterministic export URLs
//! keyed by document id. Sheets export as CSV, documents as plain text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::FetchError;

static DOC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("valid regex"));

/// Derive the export URL for a source document URL, or `None` when no
/// document id can be extracted.
pub fn derive_export_url(base: &str, url: &str) -> Option<String> {
    let doc_id = DOC_ID_RE.captures(url).map(|c| c[1].to_string())?;

    Some(if url.contains("spreadsheets") {
        format!("{base}/spreadsheets/d/{doc_id}/export?format=csv")
    } else {
        format!("{base}/document/d/{doc_id}/export?format=txt")
    })
}

/// Fetch a document through its export endpoint.
///
/// The body is decoded lossily: invalid bytes become replacement
/// characters rather than failing the item.
pub(crate) async fn fetch(
    client: &reqwest::Client,
    base: &str,
    url: &str,
) -> Result<String, FetchError> {
    let export_url = derive_export_url(base, url)
        .ok_or_else(|| FetchError::Transport("could not extract document id".into()))?;

    debug!(%export_url, "fetching export");

    let response = client
        .get(&export_url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status();
    if status.as_u16() == 403 {
        return Err(FetchError::AccessDenied);
    }
    if !status.is_success() {
        return Err(FetchError::HttpError(status.as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[test]
    fn document_urls_export_as_text() {
        let url = "https://docs.google.com/document/d/abc123/edit";
        let export = derive_export_url("https://docs.google.com", url).unwrap();
        assert_eq!(
            export,
            "https://docs.google.com/document/d/abc123/export?format=txt"
        );
    }

    #[test]
    fn spreadsheet_urls_export_as_csv() {
        let url = "https://docs.google.com/spreadsheets/d/abc123/edit#gid=0";
        let export = derive_export_url("https://docs.google.com", url).unwrap();
        assert_eq!(
            export,
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }

    #[test]
    fn missing_doc_id_yields_none() {
        assert!(derive_export_url("https://docs.google.com", "https://docs.google.com/start").is_none());
    }

    #[tokio::test]
    async fn success_returns_decoded_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/document/d/doc1/export"))
            .and(query_param("format", "txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("exported text"))
            .mount(&server)
            .await;

        let url = "https://docs.google.com/document/d/doc1/edit";
        let body = fetch(&http(), &server.uri(), url).await.unwrap();
        assert_eq!(body, "exported text");
    }

    #[tokio::test]
    async fn status_403_maps_to_access_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let url = "https://docs.google.com/document/d/locked/edit";
        let err = fetch(&http(), &server.uri(), url).await.unwrap_err();
        assert!(matches!(err, FetchError::AccessDenied));
    }

    #[tokio::test]
    async fn status_500_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = "https://docs.google.com/document/d/broken/edit";
        let err = fetch(&http(), &server.uri(), url).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpError(500)));
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(vec![b'o', b'k', 0xFF, b'!']),
            )
            .mount(&server)
            .await;

        let url = "https://docs.google.com/document/d/weird/edit";
        let body = fetch(&http(), &server.uri(), url).await.unwrap();
        assert!(body.starts_with("ok"));
        assert!(body.ends_with('!'));
    }

    #[tokio::test]
    async fn connection_failure_maps_to_transport() {
        let url = "https://docs.google.com/document/d/x/edit";
        // Port 1 refuses connections.
        let err = fetch(&http(), "http://127.0.0.1:1", url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
