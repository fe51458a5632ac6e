//! Bearer-authenticated JSON client shared by the debrid transports.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::BackendError;

/// Thin wrapper over `reqwest::Client` bound to one API base URL.
#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub(crate) fn new(base_url: String, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        credential: &str,
        endpoint: &str,
    ) -> Result<T, BackendError> {
        let body = self
            .send(self.client.get(self.url(endpoint)).bearer_auth(credential))
            .await?;
        parse_json(&body)
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        credential: &str,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        let body = self.post_form_raw(credential, endpoint, params).await?;
        parse_json(&body)
    }

    /// POST a form and return the raw body (some endpoints reply 204).
    pub(crate) async fn post_form_raw(
        &self,
        credential: &str,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, BackendError> {
        self.send(
            self.client
                .post(self.url(endpoint))
                .bearer_auth(credential)
                .form(params),
        )
        .await
    }

    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        credential: &str,
        endpoint: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let body = self.post_json_raw(credential, endpoint, body).await?;
        parse_json(&body)
    }

    pub(crate) async fn post_json_raw<B: Serialize + ?Sized>(
        &self,
        credential: &str,
        endpoint: &str,
        body: &B,
    ) -> Result<String, BackendError> {
        self.send(
            self.client
                .post(self.url(endpoint))
                .bearer_auth(credential)
                .json(body),
        )
        .await
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::ConnectionFailed(e.to_string())
    } else if e.is_decode() {
        BackendError::Parse(e.to_string())
    } else {
        BackendError::ConnectionFailed(e.to_string())
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Pull a readable message out of an error body.
///
/// Vendors report errors as `{"error": "..."}`, `{"error": {"message": ...}}`
/// or `{"detail": "..."}`; anything else is truncated raw text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidate = value
            .get("error")
            .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(|m| m.as_str())))
            .or_else(|| value.get("detail").and_then(|d| d.as_str()))
            .or_else(|| value.get("message").and_then(|m| m.as_str()));
        if let Some(message) = candidate {
            return message.to_string();
        }
    }
    body.chars().take(100).collect()
}

/// Response body that may or may not be wrapped in `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// Identifier that vendors send either as a number or a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Int(n) => n.to_string(),
    })
}
