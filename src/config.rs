use std::time::Duration;

/// Environment variable that overrides the default endpoint.
pub const ENDPOINT_ENV_VAR: &str = "WEIGHTS_UNOFFICIAL_ENDPOINT";

/// Endpoint used when neither the caller nor the environment provides one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

/// Delay between consecutive status queries of one job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Configuration for a [`WeightsClient`](crate::WeightsClient).
///
/// Resolve the environment once with [`ClientConfig::from_env`], then
/// override what the caller supplied explicitly:
///
/// ```
/// use weights_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("my-key")
///     .endpoint("http://weights.internal:3000/")
///     .request_timeout(Duration::from_secs(10));
/// assert_eq!(config.endpoint, "http://weights.internal:3000");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Value sent in the `x-api-key` header of every request.
    pub api_key: String,
    /// Base URL of the service, without a trailing slash.
    pub endpoint: String,
    /// Timeout for every call except the health check (default: 30s)
    pub request_timeout: Duration,
    /// Timeout for the health check (default: 5s)
    pub health_timeout: Duration,
    /// Fixed delay between status polls (default: 100ms)
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            health_timeout: Duration::from_secs(5),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Create a config with the given API key and default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create a config whose endpoint comes from `WEIGHTS_UNOFFICIAL_ENDPOINT`
    /// when that variable is set and non-empty.
    pub fn from_env(api_key: impl Into<String>) -> Self {
        let config = Self::new(api_key);
        match std::env::var(ENDPOINT_ENV_VAR) {
            Ok(endpoint) if !endpoint.trim().is_empty() => config.endpoint(endpoint),
            _ => config,
        }
    }

    /// Set the service endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = normalize(endpoint.into());
        self
    }

    /// Set the timeout applied to regular requests.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the timeout applied to the health check.
    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Set the delay between status polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
