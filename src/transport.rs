use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{Result, WeightsError};

const API_KEY_HEADER: &str = "x-api-key";

/// One call to the Weights API.
///
/// For `GET` the payload object becomes the query string; for every other
/// method it is sent as the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub payload: Option<Value>,
    /// Overrides the transport's default timeout for this call.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            payload: None,
            timeout: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            payload: None,
            timeout: None,
        }
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Sends a single request and returns the decoded response body.
///
/// Implementations must report a non-success status as
/// [`WeightsError::Http`] and connection problems as
/// [`WeightsError::Transport`]. A transport is shared by every clone of a
/// client, so it must be safe to call from many tasks at once.
///
/// # Example
///
/// ```
/// use weights_client::{ApiRequest, Result, Transport};
/// use serde_json::{json, Value};
///
/// struct AlwaysHealthy;
///
/// impl Transport for AlwaysHealthy {
///     async fn send(&self, _request: ApiRequest) -> Result<Value> {
///         Ok(json!({"status": "OK"}))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<Value>> + Send;
}

/// Flatten a JSON object into query pairs. `null` members are skipped and
/// non-string scalars are rendered with their JSON text.
pub(crate) fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    let Some(obj) = payload.as_object() else {
        return Vec::new();
    };
    obj.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

/// Decode a response body. Empty bodies become `null`; bodies that are not
/// JSON are kept as a JSON string.
pub(crate) fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
///
/// Opened once per [`WeightsClient`](crate::WeightsClient); the connection
/// pool is released when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build the HTTP client with the fixed `Content-Type` and `x-api-key`
    /// headers.
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            WeightsError::InvalidConfig("API key contains characters not allowed in a header".into())
        })?;
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WeightsError::transport("Failed to build HTTP client", e))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = format!("{}{}", self.endpoint, request.path);
        tracing::debug!(method = %request.method, path = %request.path, "Weights API request");

        let mut builder = self.http.request(request.method.clone(), &url);
        if let Some(payload) = &request.payload {
            builder = if request.method == Method::GET {
                builder.query(&query_pairs(payload))
            } else {
                builder.json(payload)
            };
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| {
            WeightsError::transport(
                format!(
                    "Cannot connect to Weights API at {} \u{2014} is the service running?",
                    self.endpoint
                ),
                e,
            )
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            WeightsError::transport(format!("Failed to read response from {}", request.path), e)
        })?;

        if !status.is_success() {
            return Err(WeightsError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(decode_body(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs_skip_null() {
        let pairs = query_pairs(&json!({"prompt": "a lighthouse at dusk", "loraName": null}));
        assert_eq!(pairs, vec![("prompt".to_string(), "a lighthouse at dusk".to_string())]);
    }

    #[test]
    fn test_query_pairs_stringify_scalars() {
        let mut pairs = query_pairs(&json!({"limit": 5, "nsfw": false}));
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("limit".to_string(), "5".to_string()),
                ("nsfw".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_non_object() {
        assert!(query_pairs(&json!("loose")).is_empty());
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(String::new()), Value::Null);
        assert_eq!(decode_body(r#"{"status":"OK"}"#.into()), json!({"status": "OK"}));
        assert_eq!(decode_body("12 credits left".into()), json!("12 credits left"));
    }

    #[test]
    fn test_open_rejects_bad_api_key() {
        let config = ClientConfig::new("bad\nkey");
        let err = HttpTransport::open(&config).unwrap_err();
        assert!(matches!(err, WeightsError::InvalidConfig(_)));
    }

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::get("/search-loras").payload(json!({"query": "anime"}));
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/search-loras");
        assert_eq!(req.payload, Some(json!({"query": "anime"})));
        assert!(req.timeout.is_none());

        let post = ApiRequest::post("/generateImage").timeout(Duration::from_secs(3));
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.timeout, Some(Duration::from_secs(3)));
    }
}
