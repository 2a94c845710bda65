//! reqwest implementation of [`RestApi`].

use super::{ApiRequest, ApiResponse, Method, RestApi};
use crate::error::ApiError;
use async_trait::async_trait;
use mergeflow_core::Config;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl HttpApi {
    /// Build a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidRequest`] for an unusable base URL and
    /// [`ApiError::Transport`] when the underlying client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let normalized = normalize_base_url(base_url);
        let base = Url::parse(&normalized)
            .map_err(|err| ApiError::InvalidRequest(format!("Invalid API URL '{}': {}", base_url, err)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "API URL '{}' cannot be used as a base",
                base_url
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    /// Build from the API URL and timeout in `config`.
    ///
    /// # Errors
    /// See [`HttpApi::new`].
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `request`, percent-encoding each segment.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidRequest`] when the base cannot take segments.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ApiError::InvalidRequest("API URL cannot be used as a base".to_string())
            })?;
            path.pop_if_empty();
            for segment in &request.segments {
                path.push(segment);
            }
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl RestApi for HttpApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request)?;
        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await.map_err(|err| self.map_error(err))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| self.map_error(err))?;
        debug!(method = %request.method, path = %request.path(), status, "api response");
        Ok(ApiResponse::new(status, parse_body(&text)))
    }
}

impl HttpApi {
    fn map_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ApiError::from(err)
        }
    }
}

/// JSON body when parseable, the raw text otherwise, `null` when empty.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Strip trailing slashes and pin plain-http `localhost` to `127.0.0.1`.
pub(crate) fn normalize_base_url(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(mut url) = Url::parse(raw) {
        let pin_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if pin_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return raw.to_string();
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_matrix() {
        let cases = [
            ("http://localhost:8080/api", "http://127.0.0.1:8080/api"),
            ("https://localhost:8443/api/", "https://localhost:8443/api"),
            ("http://api.example.com/", "http://api.example.com"),
            ("not a url", "not a url"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_base_url(input), expected);
        }
    }

    #[test]
    fn url_for_appends_encoded_segments_and_query() {
        let api = HttpApi::new("http://127.0.0.1:9/api", Duration::from_secs(1)).expect("api");
        let request = ApiRequest::delete(["documents", "id/with?reserved"]).with_query("teamId", "t 1");
        let url = api.url_for(&request).expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/api/documents/id%2Fwith%3Freserved?teamId=t+1"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(HttpApi::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
        assert!(HttpApi::new("::::", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn parse_body_keeps_text_fallback() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"ok\":true}")["ok"], true);
        assert_eq!(parse_body("plain"), Value::String("plain".to_string()));
    }
}
