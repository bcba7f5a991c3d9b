//! HTTP plumbing shared by the backend clients.
//!
//! `ApiClient` owns the reqwest client, the base URL, and the
//! authorization injector: before each request the token is read from the
//! persistent session store (not from in-memory session state) and
//! attached as `Authorization: Token <tok>`. A store failure downgrades
//! the request to unauthenticated; attaching auth can never fail a call.

pub mod auth;
pub mod chat;
pub mod profile;

use std::time::Duration;

use parley_core::session::store::SessionStore;
use parley_types::error::ApiError;
use reqwest::StatusCode;
use reqwest::header;
use serde::Serialize;
use tracing::warn;

/// Fallback when an error body carries nothing usable.
const GENERIC_ERROR: &str = "Request failed. Please try again.";

/// Shared HTTP client for the chat backend.
///
/// Cheap to clone; the underlying reqwest client is reference-counted and
/// the store is a path handle.
#[derive(Clone)]
pub struct ApiClient<S: SessionStore> {
    http: reqwest::Client,
    base_url: String,
    store: S,
}

impl<S: SessionStore> ApiClient<S> {
    /// Create a client for the backend at `base_url`, reading tokens from
    /// the given store.
    pub fn new(base_url: &str, store: S) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authorization header value from the persistent store.
    ///
    /// Read per request, so a just-finished login (or an external change
    /// to the stored session) is picked up without replumbing.
    async fn authorization(&self) -> Option<String> {
        match self.store.load_token().await {
            Ok(Some(token)) => Some(format!("Token {token}")),
            Ok(None) => None,
            Err(error) => {
                warn!(error = %error, "Failed to read stored token, sending request unauthenticated");
                None
            }
        }
    }

    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.get(self.url(path));
        if let Some(value) = self.authorization().await {
            request = request.header(header::AUTHORIZATION, value);
        }
        request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))
    }

    pub(crate) async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(value) = self.authorization().await {
            request = request.header(header::AUTHORIZATION, value);
        }
        request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))
    }

    pub(crate) async fn post_empty(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.post(self.url(path));
        if let Some(value) = self.authorization().await {
            request = request.header(header::AUTHORIZATION, value);
        }
        request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))
    }
}

/// Resolve a response into success or a typed error.
///
/// 401 is its own class and always escalates to a forced logout upstream;
/// every other failure status gets a human-readable detail derived from
/// the body.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: detail_from_body(&body),
    })
}

/// Decode a JSON success body.
pub(crate) async fn expect_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

/// Derive a human-readable message from a DRF-style error body.
///
/// Prefers the top-level `detail` string, then the first message of the
/// first field error list, then a generic fallback.
pub(crate) fn detail_from_body(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return GENERIC_ERROR.to_string();
    };
    if let Some(detail) = value.get("detail").and_then(|detail| detail.as_str()) {
        return detail.to_string();
    }
    if let Some(fields) = value.as_object() {
        for errors in fields.values() {
            match errors {
                serde_json::Value::Array(list) => {
                    if let Some(first) = list.iter().find_map(|entry| entry.as_str()) {
                        return first.to_string();
                    }
                }
                serde_json::Value::String(message) => return message.clone(),
                _ => {}
            }
        }
    }
    GENERIC_ERROR.to_string()
}
