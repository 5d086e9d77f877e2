use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("network support is disabled in this build")]
    Disabled,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid JSON response: {0}")]
    Decode(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

/// Thin blocking JSON client shared by the generation, speech and document
/// store clients.
#[derive(Clone)]
pub struct HttpClient {
    #[cfg(feature = "network")]
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    #[cfg(feature = "network")]
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { inner })
    }

    #[cfg(not(feature = "network"))]
    pub fn new(_timeout: Duration) -> Result<Self, HttpError> {
        Ok(Self {})
    }

    /// Send a request and decode the JSON reply. A 404 maps to `Ok(None)`.
    #[cfg(feature = "network")]
    pub fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, HttpError> {
        let mut request = match method {
            Method::Get => self.inner.get(url),
            Method::Post => self.inner.post(url),
            Method::Patch => self.inner.patch(url),
        };
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| HttpError::Decode(e.to_string()))
    }

    #[cfg(not(feature = "network"))]
    pub fn send(
        &self,
        _method: Method,
        _url: &str,
        _headers: &[(&str, String)],
        _body: Option<&Value>,
    ) -> Result<Option<Value>, HttpError> {
        Err(HttpError::Disabled)
    }
}
