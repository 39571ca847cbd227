//! Service client configuration types
//!
//! Shared request parameters live in [`ServiceConfig`] and are merged with
//! the per-call [`RequestParams`] on every request.

use crate::error::Result;
use crate::types::{BackoffType, JsonValue, StringMap};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Content type set on bodies sent with `send_as_json`
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

// ============================================================================
// Auth
// ============================================================================

/// Credentials attached to every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Auth {
    /// HTTP Basic authentication
    Basic {
        username: String,
        #[serde(default)]
        password: Option<String>,
    },
    /// Bearer token authentication
    Bearer { token: String },
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Who the request authenticates as, safe to log
    pub fn principal(&self) -> &str {
        match self {
            Self::Basic { username, .. } => username,
            Self::Bearer { .. } => "bearer token",
        }
    }
}

// ============================================================================
// Client Identity
// ============================================================================

/// Identifies the calling client through the `User-Agent` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub name: String,
    #[serde(default = "default_client_version")]
    pub version: String,
    #[serde(default = "default_app_name")]
    pub app: String,
}

fn default_client_version() -> String {
    "x.y.z".to_string()
}

fn default_app_name() -> String {
    "unknown".to_string()
}

impl ClientIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_client_version(),
            app: default_app_name(),
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    /// `"{name} {version} - {app}"`
    pub fn user_agent(&self) -> String {
        format!("{} {} - {}", self.name, self.version, self.app)
    }
}

// ============================================================================
// Request Params
// ============================================================================

/// Parameters for a request
///
/// Used both for the shared defaults of a client and for a single call.
/// Merging keeps map entries from both sides and lets the call's values
/// win; scalar fields are replaced when the call sets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestParams {
    /// Request headers
    pub headers: StringMap,
    /// Query parameters
    pub query: StringMap,
    /// Cookies, sent in a single `Cookie` header
    pub cookies: StringMap,
    /// Credentials
    pub auth: Option<Auth>,
    /// Request body; objects are form encoded unless sent as JSON
    pub data: Option<JsonValue>,
    /// Encode `data` as JSON and set the JSON content type
    pub send_as_json: Option<bool>,
    /// Non-2xx status codes accepted as success
    pub expected_response_codes: Option<Vec<u16>>,
    /// Socket-level retries (connect errors and timeouts)
    pub max_retries: Option<u32>,
    /// Per-request timeout override, in seconds
    pub timeout_secs: Option<u64>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set a body sent as-is (objects are form encoded)
    #[must_use]
    pub fn data(mut self, data: impl Into<JsonValue>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a body sent as JSON
    #[must_use]
    pub fn json(mut self, data: impl Into<JsonValue>) -> Self {
        self.data = Some(data.into());
        self.send_as_json = Some(true);
        self
    }

    #[must_use]
    pub fn expect(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.expected_response_codes = Some(codes.into_iter().collect());
        self
    }

    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Overlay `overrides` on top of these params
    pub fn merged(&self, overrides: RequestParams) -> RequestParams {
        let mut merged = self.clone();
        merged.headers.extend(overrides.headers);
        merged.query.extend(overrides.query);
        merged.cookies.extend(overrides.cookies);

        if overrides.auth.is_some() {
            merged.auth = overrides.auth;
        }
        if overrides.data.is_some() {
            merged.data = overrides.data;
        }
        if overrides.send_as_json.is_some() {
            merged.send_as_json = overrides.send_as_json;
        }
        if overrides.expected_response_codes.is_some() {
            merged.expected_response_codes = overrides.expected_response_codes;
        }
        if overrides.max_retries.is_some() {
            merged.max_retries = overrides.max_retries;
        }
        if overrides.timeout_secs.is_some() {
            merged.timeout_secs = overrides.timeout_secs;
        }
        merged
    }

    /// Whether `status` satisfies the success demand
    pub fn is_success(&self, status: u16) -> bool {
        status < 300
            || self
                .expected_response_codes
                .as_ref()
                .is_some_and(|codes| codes.contains(&status))
    }

    /// A copy without credentials, for logging
    pub fn redacted(&self) -> RequestParams {
        RequestParams {
            auth: None,
            ..self.clone()
        }
    }

    pub(crate) fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

// ============================================================================
// Service Config
// ============================================================================

/// Configuration of an [`HttpServiceClient`](super::HttpServiceClient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL every request path is joined to
    pub url: String,

    /// Name used in error logs
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Sets the `User-Agent` header
    #[serde(default)]
    pub client: Option<ClientIdentity>,

    /// Default request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verify TLS certificates
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Backoff between socket-level retries
    #[serde(default)]
    pub backoff_type: BackoffType,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Parameters shared by every request
    #[serde(flatten)]
    pub params: RequestParams,
}

fn default_service_name() -> String {
    "HttpServiceClient".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_verify_ssl() -> bool {
    true
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: default_service_name(),
            client: None,
            timeout_secs: default_timeout_secs(),
            verify_ssl: default_verify_ssl(),
            backoff_type: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            params: RequestParams::default(),
        }
    }

    /// Load a config from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn client(mut self, identity: ClientIdentity) -> Self {
        self.client = Some(identity);
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff_type = backoff_type;
        self.initial_backoff_ms = initial.as_millis() as u64;
        self.max_backoff_ms = max.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
