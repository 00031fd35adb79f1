//! REST client for the community backend.
//!
//! [`Backend`] is the seam the rest of the core talks to; [`HttpBackend`] is
//! the reqwest implementation. Every call except sign-in carries the bearer
//! credential.

use std::future::Future;

use reqwest::multipart::Form;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use store::ClientConfig;

use crate::error::ApiError;
use crate::models::{ApiResponse, Comment, CommentId, PostId};

/// The backend endpoints this client consumes.
///
/// Futures are not required to be `Send`: the client runs on one cooperative
/// thread.
pub trait Backend {
    /// `POST /Authentication/sign-in`. On success `data` is the credential.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ApiResponse<String>, ApiError>>;

    /// `POST /Community/Add-Post-Like`. The server toggles the viewer's like.
    fn add_post_like(
        &self,
        token: &str,
        post_id: PostId,
    ) -> impl Future<Output = Result<ApiResponse<Value>, ApiError>>;

    /// `POST /Community/Add-Comment`. `data`, when present, is the stored comment.
    fn add_comment(
        &self,
        token: &str,
        post_id: PostId,
        content: &str,
    ) -> impl Future<Output = Result<ApiResponse<Value>, ApiError>>;

    /// `GET /Community/{postId}/comments`
    fn get_comments(
        &self,
        token: &str,
        post_id: PostId,
    ) -> impl Future<Output = Result<ApiResponse<Vec<Comment>>, ApiError>>;

    /// `DELETE /Community/DeleteComment?CommentId=...`
    fn delete_comment(
        &self,
        token: &str,
        comment_id: CommentId,
    ) -> impl Future<Output = Result<ApiResponse<Value>, ApiError>>;
}

/// [`Backend`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(&config.api.base_url, Client::new())
    }

    pub fn with_client(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Backend for HttpBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ApiResponse<String>, ApiError> {
        let form = Form::new()
            .text("Email", email.to_string())
            .text("Password", password.to_string());

        let response = self
            .http
            .post(self.url("/Authentication/sign-in"))
            .multipart(form)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn add_post_like(
        &self,
        token: &str,
        post_id: PostId,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let form = Form::new().text("PostId", post_id.to_string());

        let response = self
            .http
            .post(self.url("/Community/Add-Post-Like"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn add_comment(
        &self,
        token: &str,
        post_id: PostId,
        content: &str,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let form = Form::new()
            .text("PostId", post_id.to_string())
            .text("Content", content.to_string());

        let response = self
            .http
            .post(self.url("/Community/Add-Comment"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn get_comments(
        &self,
        token: &str,
        post_id: PostId,
    ) -> Result<ApiResponse<Vec<Comment>>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/Community/{post_id}/comments")))
            .bearer_auth(token)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn delete_comment(
        &self,
        token: &str,
        comment_id: CommentId,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let response = self
            .http
            .delete(self.url("/Community/DeleteComment"))
            .bearer_auth(token)
            .query(&[("CommentId", comment_id)])
            .send()
            .await?;
        read_envelope(response).await
    }
}

/// Parse the `{ succeeded, data, message }` envelope.
///
/// The backend answers validation failures with a 4xx *and* an envelope, so
/// the body is read whatever the status. Only an unparseable body falls back
/// to the status code.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<ApiResponse<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if status == StatusCode::UNAUTHORIZED => Err(ApiError::Unauthenticated),
        Err(e) if status.is_success() => Err(ApiError::Decode(e.to_string())),
        Err(_) => Err(ApiError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = HttpBackend::new(&ClientConfig::new("https://clinic.test/api/"));
        assert_eq!(backend.base_url(), "https://clinic.test/api");
        assert_eq!(
            backend.url("/Community/42/comments"),
            "https://clinic.test/api/Community/42/comments"
        );
    }
}
