//! HTTP persistence and upload backends.
//!
//! Talks to the LMS web API: tests live under `/api/tests`, files are posted
//! to `/api/upload` as multipart form data.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::instrument;

use quiztree_core::draft::TestDraft;
use quiztree_core::traits::{FileUploader, TestRepository};

use crate::error::ClientError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Shared client plumbing for both backends.
#[derive(Clone)]
struct ApiClient {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl ApiClient {
    fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout_secs,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/api/tests/{id}` with `id` encoded as a single path segment.
    fn test_url(&self, id: &str) -> Result<reqwest::Url, ClientError> {
        if id.is_empty() {
            return Err(ClientError::NotFound(id.to_string()));
        }
        let mut url = reqwest::Url::parse(&self.url("/api/tests"))
            .map_err(|e| ClientError::Network(format!("invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Network(format!("invalid API URL: {}", self.base_url)))?
            .push(id);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and map failure statuses to [`ClientError`].
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<reqwest::Response, ClientError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout_secs)
            } else {
                ClientError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Unauthorized(body));
        }
        if status == 404 {
            return Err(ClientError::NotFound(resource.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ClientError::Api { status, message });
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        response.json().await.map_err(|e| ClientError::Api {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }
}

/// Stores tests through the LMS web API.
pub struct HttpTestRepository {
    api: ApiClient,
}

impl HttpTestRepository {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, token, timeout_secs)?,
        })
    }
}

#[async_trait]
impl TestRepository for HttpTestRepository {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, draft), fields(title = %draft.metadata.title))]
    async fn create_test(&self, draft: &TestDraft) -> anyhow::Result<String> {
        let request = self.api.client.post(self.api.url("/api/tests")).json(draft);
        let response = self.api.send(request, "new test").await?;
        let created: CreatedResponse = ApiClient::decode(response).await?;
        Ok(created.id)
    }

    #[instrument(skip(self, draft))]
    async fn update_test(&self, id: &str, draft: &TestDraft) -> anyhow::Result<()> {
        let request = self.api.client.put(self.api.test_url(id)?).json(draft);
        self.api.send(request, id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_test(&self, id: &str) -> anyhow::Result<TestDraft> {
        let request = self.api.client.get(self.api.test_url(id)?);
        let response = self.api.send(request, id).await?;
        Ok(ApiClient::decode(response).await?)
    }
}

/// Uploads files through the LMS web API.
pub struct HttpUploader {
    api: ApiClient,
}

impl HttpUploader {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url, token, timeout_secs)?,
        })
    }
}

#[async_trait]
impl FileUploader for HttpUploader {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let request = self.api.client.post(self.api.url("/api/upload")).multipart(form);
        let response = self.api.send(request, file_name).await?;
        let uploaded: UploadResponse = ApiClient::decode(response).await?;
        Ok(uploaded.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiztree_core::draft::TestMetadata;
    use quiztree_core::model::QuestionType;
    use quiztree_core::store::{QuestionStore, QuestionUpdate};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn draft() -> TestDraft {
        let mut store = QuestionStore::new();
        let id = store.add_question(None).unwrap();
        store.update_question(&id, QuestionUpdate::Question("Explain ownership".into()));
        store.update_question(&id, QuestionUpdate::Type(QuestionType::Essay));
        TestDraft::from_store(
            TestMetadata {
                title: "Rust basics".into(),
                ..Default::default()
            },
            &store,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_posts_draft_and_returns_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/tests"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({"title": "Rust basics"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "t-42"})))
            .mount(&server)
            .await;

        let repo = HttpTestRepository::new(&server.uri(), Some("secret".into()), 5).unwrap();
        let id = repo.create_test(&draft()).await.unwrap();
        assert_eq!(id, "t-42");
    }

    #[tokio::test]
    async fn load_round_trips_draft() {
        let server = MockServer::start().await;
        let stored = draft();

        Mock::given(method("GET"))
            .and(path("/api/tests/t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
            .mount(&server)
            .await;

        let repo = HttpTestRepository::new(&server.uri(), None, 5).unwrap();
        let loaded = repo.load_test("t-1").await.unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn missing_test_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/tests/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let repo = HttpTestRepository::new(&server.uri(), None, 5).unwrap();
        let err = repo.update_test("gone", &draft()).await.unwrap_err();
        let client_err = err.downcast_ref::<ClientError>().unwrap();
        assert!(matches!(client_err, ClientError::NotFound(_)));
        assert!(client_err.is_permanent());
    }

    #[tokio::test]
    async fn test_id_is_one_path_segment() {
        let server = MockServer::start().await;
        let stored = draft();

        Mock::given(method("GET"))
            .and(path("/api/tests/a%2F..%2Fb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
            .mount(&server)
            .await;

        let repo = HttpTestRepository::new(&server.uri(), None, 5).unwrap();
        assert_eq!(repo.load_test("a/../b").await.unwrap(), stored);

        let err = repo.load_test("").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn api_error_message_is_extracted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/tests"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"error": "due date is in the past"})),
            )
            .mount(&server)
            .await;

        let repo = HttpTestRepository::new(&server.uri(), None, 5).unwrap();
        let err = repo.create_test(&draft()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 422"));
        assert!(err.to_string().contains("due date is in the past"));
    }

    #[tokio::test]
    async fn unauthorized_upload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_string("no session"))
            .mount(&server)
            .await;

        let uploader = HttpUploader::new(&server.uri(), None, 5).unwrap();
        let err = uploader.upload("a.png", vec![1, 2, 3]).await.unwrap_err();
        assert!(err.to_string().contains("authentication"));
    }

    #[tokio::test]
    async fn upload_returns_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"url": "https://cdn.example/a.png"})),
            )
            .mount(&server)
            .await;

        let uploader = HttpUploader::new(&format!("{}/", server.uri()), None, 5).unwrap();
        let url = uploader.upload("a.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(url, "https://cdn.example/a.png");
    }
}
