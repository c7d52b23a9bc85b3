//! HTTP transport for backend API calls.
//!
//! Thin wrapper over reqwest: base-URL joining, optional bearer auth and
//! uniform response handling. Error bodies are the backend's
//! `{"error": "..."}` shape; the message is extracted and surfaced
//! verbatim, falling back to `"Request failed"` when the body is opaque.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for making requests to the POS backend.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Creates a new HTTP client from configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Sets the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_header() {
            Some(auth) => request.header(reqwest::header::AUTHORIZATION, auth),
            None => request,
        }
    }

    /// Makes a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        debug!(path, "GET");
        let request = self.apply_auth(self.client.get(self.url(path)));
        Self::handle_response(request.send().await?).await
    }

    /// Makes a GET request with query parameters (properly encoded).
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        debug!(path, "GET (query)");
        let request = self.apply_auth(self.client.get(self.url(path)).query(query));
        Self::handle_response(request.send().await?).await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        debug!(path, "POST");
        let request = self.apply_auth(self.client.post(self.url(path)).json(body));
        Self::handle_response(request.send().await?).await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        debug!(path, "PUT");
        let request = self.apply_auth(self.client.put(self.url(path)).json(body));
        Self::handle_response(request.send().await?).await
    }

    /// Makes a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        debug!(path, "DELETE");
        let request = self.apply_auth(self.client.delete(self.url(path)));
        Self::handle_response(request.send().await?).await
    }

    /// Handles the HTTP response, mapping error statuses onto
    /// [`ClientError`] with the backend's message preserved.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| {
                    if text.trim().is_empty() {
                        "Request failed".to_string()
                    } else {
                        text.clone()
                    }
                });

            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
                s if s.is_client_error() => Err(ClientError::Rejected(message)),
                _ => Err(ClientError::Backend(message)),
            };
        }

        response.json().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = HttpClient::new(&ClientConfig::new("http://localhost:4000")).unwrap();
        assert_eq!(client.url("/products"), "http://localhost:4000/products");
        assert_eq!(client.url("products"), "http://localhost:4000/products");
    }

    #[test]
    fn test_error_body_shape() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Out of stock"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("Out of stock"));

        let body: ErrorBody = serde_json::from_str(r#"{"message":"other shape"}"#).unwrap();
        assert!(body.error.is_none());
    }
}
