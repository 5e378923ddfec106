//! Document corpus REST client.
//!
//! The corpus exposes a PostgREST-style API. The pipeline reads post
//! documents to discover resource references, reads published Notion assets
//! for the re-capture mode, and (re-capture only) writes refreshed content
//! back to a document by id.

use std::time::Duration;

use tracing::debug;

use resourcesync_shared::{
    CorpusCredentials, NotionAsset, PostDocument, ResourceSyncError, Result,
};

/// Asset classifications whose published pages get re-captured.
const RECAPTURE_ASSET_TYPES: &str = "promptkit,guide";

/// Read/write handle to the document corpus.
pub struct CorpusClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    query_limit: u32,
}

impl CorpusClient {
    pub fn new(creds: &CorpusCredentials, query_limit: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ResourceSyncError::Corpus(format!("build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: creds.base_url.clone(),
            service_key: creds.service_key.clone(),
            query_limit,
        })
    }

    /// List post documents whose content is scanned for resource URLs.
    pub async fn list_posts(&self) -> Result<Vec<PostDocument>> {
        let url = format!(
            "{}/rest/v1/project_assets?asset_type=eq.post\
             &select=id,project_id,asset_id,name,content&limit={}",
            self.base_url, self.query_limit
        );

        let posts: Vec<PostDocument> = self.get_json(&url).await?;
        debug!(count = posts.len(), "listed corpus posts");
        Ok(posts)
    }

    /// List published Notion assets for the re-capture mode.
    pub async fn list_notion_assets(&self) -> Result<Vec<NotionAsset>> {
        let url = format!(
            "{}/rest/v1/project_assets?asset_type=in.({})\
             &platform=eq.notion&select=id,name,published_url,content&limit={}",
            self.base_url, RECAPTURE_ASSET_TYPES, self.query_limit
        );

        let assets: Vec<NotionAsset> = self.get_json(&url).await?;
        debug!(count = assets.len(), "listed notion assets");
        Ok(assets)
    }

    /// Replace a document's stored content (re-capture mode only).
    pub async fn update_asset_content(&self, asset_id: &str, content: &str) -> Result<()> {
        let url = format!(
            "{}/rest/v1/project_assets?id=eq.{asset_id}",
            self.base_url
        );

        let response = self
            .http
            .patch(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(|e| ResourceSyncError::Corpus(format!("PATCH {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(ResourceSyncError::Corpus(format!(
                "PATCH {url}: HTTP {}",
                response.status()
            )));
        }

        debug!(asset_id, "asset content updated");
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| ResourceSyncError::Corpus(format!("GET {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(ResourceSyncError::Corpus(format!(
                "GET {url}: HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ResourceSyncError::Corpus(format!("GET {url}: bad body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resourcesync_shared::CorpusCredentials;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds(server: &MockServer) -> CorpusCredentials {
        CorpusCredentials {
            base_url: server.uri(),
            service_key: "test-key".into(),
        }
    }

    #[tokio::test]
    async fn list_posts_parses_documents() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            {
                "id": "1",
                "project_id": "p1",
                "asset_id": "a1",
                "name": "Post One",
                "content": "see https://notion.so/x"
            },
            {
                "id": "2",
                "project_id": "p1",
                "asset_id": "a2",
                "name": "Post Two",
                "content": null
            }
        ]);

        Mock::given(method("GET"))
            .and(path("/rest/v1/project_assets"))
            .and(header("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = CorpusClient::new(&creds(&server), 500).unwrap();
        let posts = client.list_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].name, "Post One");
        assert!(posts[1].content.is_none());
    }

    #[tokio::test]
    async fn list_notion_assets_parses() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            {
                "id": "a1",
                "name": "Guide",
                "published_url": "https://notion.site/g-0123456789abcdef0123456789abcdef",
                "content": "old"
            }
        ]);

        Mock::given(method("GET"))
            .and(path("/rest/v1/project_assets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = CorpusClient::new(&creds(&server), 500).unwrap();
        let assets = client.list_notion_assets().await.unwrap();
        assert_eq!(assets.len(), 1);
        assert!(assets[0].published_url.as_deref().unwrap().contains("notion.site"));
    }

    #[tokio::test]
    async fn update_asset_content_patches() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/project_assets"))
            .and(header("Prefer", "return=minimal"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = CorpusClient::new(&creds(&server), 500).unwrap();
        client.update_asset_content("a1", "new content").await.unwrap();
    }

    #[tokio::test]
    async fn http_error_surfaces_as_corpus_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CorpusClient::new(&creds(&server), 500).unwrap();
        let err = client.list_posts().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }
}
