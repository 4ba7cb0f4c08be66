use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::api::CommentApi;
use crate::model::{Comment, CommentEdit, NewComment};
use crate::{CommentId, Error, ProjectId, Result};

/// [`CommentApi`] over the research tracker's REST endpoints.
pub struct HttpCommentApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpCommentApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let invalid = |message: String| Error::InvalidBaseUrl {
            url: base_url.to_string(),
            message,
        };
        let parsed = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot have path segments".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::network(format!("failed to build HTTP client: {err}")))?;

        log::debug!("comment API at {}", parsed);
        Ok(Self {
            client,
            base_url: parsed,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidBaseUrl {
                url: self.base_url.to_string(),
                message: "URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send().await.map_err(|err| {
            log::error!("comment API request failed: {}", err);
            Error::network(err.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        log::error!("comment API rejected request ({}): {}", status, message);
        Err(Error::rejected(Some(status.as_u16()), message))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| Error::Decode {
                message: err.to_string(),
            })
    }
}

/// Prefers the `message` field of a JSON error body, then the raw body.
fn rejection_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string));
    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}

#[async_trait::async_trait]
impl CommentApi for HttpCommentApi {
    async fn list_comments(&self, project_id: &ProjectId) -> Result<Vec<Comment>> {
        let url = self.endpoint(&["comments", "project", project_id.as_str()])?;
        self.fetch(self.client.get(url)).await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let url = self.endpoint(&["comments"])?;
        self.fetch(self.client.post(url).json(comment)).await
    }

    async fn like_comment(&self, comment_id: &CommentId) -> Result<Comment> {
        let url = self.endpoint(&["comments", comment_id.as_str(), "like"])?;
        self.fetch(self.client.post(url)).await
    }

    async fn unlike_comment(&self, comment_id: &CommentId) -> Result<Comment> {
        let url = self.endpoint(&["comments", comment_id.as_str(), "unlike"])?;
        self.fetch(self.client.post(url)).await
    }

    async fn update_comment(&self, edit: &CommentEdit) -> Result<Comment> {
        let url = self.endpoint(&["comments", edit.comment_id.as_str()])?;
        let body = serde_json::json!({ "content": edit.content });
        self.fetch(self.client.patch(url).json(&body)).await
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> Result<()> {
        let url = self.endpoint(&["comments", comment_id.as_str()])?;
        self.execute(self.client.delete(url)).await.map(|_| ())
    }
}
