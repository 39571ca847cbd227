//! HTTP service client
//!
//! Wraps a `reqwest::Client` with:
//! - Shared request parameters merged into every call
//! - Socket-level retries with configurable backoff
//! - A success demand: non-2xx responses fail unless explicitly expected
//! - Request/response hooks for service-specific clients

use super::config::{Auth, RequestParams, ServiceConfig, JSON_CONTENT_TYPE};
use crate::error::{Error, Result};
use crate::pagination::{paginate_stream, FetchArgs, PageRequest, PaginationOptions};
use crate::types::{BackoffType, JsonValue, Method};
use async_trait::async_trait;
use futures::Stream;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use url::Url;

/// Extension points for service-specific clients
///
/// Both hooks default to doing nothing. The success demand runs after
/// `post_send` regardless of what the hooks do.
#[async_trait]
pub trait RequestHooks: Send + Sync {
    /// Adjust the merged parameters before the request is built
    async fn pre_send(&self, _params: &mut RequestParams) -> Result<()> {
        Ok(())
    }

    /// Inspect the response before the success demand is checked
    async fn post_send(&self, _response: &Response, _params: &RequestParams) -> Result<()> {
        Ok(())
    }
}

/// Base client for an HTTP service
pub struct HttpServiceClient {
    client: Client,
    config: ServiceConfig,
    hooks: Option<Arc<dyn RequestHooks>>,
}

impl HttpServiceClient {
    /// Create a client for the service at `config.url`
    pub fn new(mut config: ServiceConfig) -> Result<Self> {
        Url::parse(&config.url)?;

        if let Some(identity) = &config.client {
            config
                .params
                .headers
                .insert("User-Agent".to_string(), identity.user_agent());
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("demands/{}", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self {
            client,
            config,
            hooks: None,
        })
    }

    /// Create a client from a base URL with default settings
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::new(ServiceConfig::new(url))
    }

    /// Attach request hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn RequestHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Base URL of the service
    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Join a request path onto the base URL
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.config.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Shared parameters with `overrides` merged on top
    pub fn request_params(&self, overrides: RequestParams) -> RequestParams {
        self.config.params.merged(overrides)
    }

    pub async fn get(&self, path: &str, params: RequestParams) -> Result<Response> {
        self.request(Method::GET, path, params).await
    }

    pub async fn post(&self, path: &str, params: RequestParams) -> Result<Response> {
        self.request(Method::POST, path, params).await
    }

    pub async fn put(&self, path: &str, params: RequestParams) -> Result<Response> {
        self.request(Method::PUT, path, params).await
    }

    pub async fn patch(&self, path: &str, params: RequestParams) -> Result<Response> {
        self.request(Method::PATCH, path, params).await
    }

    pub async fn delete(&self, path: &str, params: RequestParams) -> Result<Response> {
        self.request(Method::DELETE, path, params).await
    }

    pub async fn head(&self, path: &str, params: RequestParams) -> Result<Response> {
        self.request(Method::HEAD, path, params).await
    }

    pub async fn options(&self, path: &str, params: RequestParams) -> Result<Response> {
        self.request(Method::OPTIONS, path, params).await
    }

    /// Send a request and demand a successful response
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: RequestParams,
    ) -> Result<Response> {
        let url = self.build_url(path);
        let mut params = self.request_params(params);

        if let Some(hooks) = &self.hooks {
            hooks.pre_send(&mut params).await?;
        }

        let started = Instant::now();
        let response = self.send(method, &url, &params).await?;

        debug!(
            "{} HTTP [{}] call to \"{}\" {:.2}ms",
            response.status().as_u16(),
            method,
            response.url(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        debug!("HTTP request params: {:?}", params.redacted());
        if let Some(auth) = &params.auth {
            debug!("Authentication via HTTP auth as \"{}\"", auth.principal());
        }

        if let Some(hooks) = &self.hooks {
            hooks.post_send(&response, &params).await?;
        }

        self.demand_success(response, &params).await
    }

    /// Send a GET request and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: RequestParams,
    ) -> Result<T> {
        let response = self.get(path, params).await?;
        let json: T = response.json().await.map_err(Error::Http)?;
        Ok(json)
    }

    /// Stream every item of a paged JSON endpoint
    ///
    /// Each page is a GET of `path` whose query carries the page and page
    /// size parameters named in `options`.
    pub fn paginate<'a, T>(
        &'a self,
        path: &'a str,
        params: RequestParams,
        options: PaginationOptions,
    ) -> impl Stream<Item = Result<T>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        let fetch = move |request: PageRequest| {
            let mut page_params = params.clone();
            page_params.query.extend(request.query_pairs());
            async move { self.get_json::<JsonValue>(path, page_params).await }
        };
        paginate_stream(fetch, FetchArgs::new(), options)
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.config.initial_backoff_ms);
        let delay = match self.config.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => initial.saturating_mul(2u32.saturating_pow(attempt)),
        };

        std::cmp::min(delay, Duration::from_millis(self.config.max_backoff_ms))
    }

    async fn send(&self, method: Method, url: &str, params: &RequestParams) -> Result<Response> {
        let max_retries = params.max_retries.unwrap_or(0);
        let timeout = params
            .timeout_secs
            .map_or_else(|| self.config.timeout(), Duration::from_secs);
        let mut attempt = 0;

        loop {
            let req = self.build_request(method, url, params, timeout)?;

            match req.send().await {
                Ok(response) => return Ok(response),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "Request to {} failed ({}), attempt {}/{}, retrying in {:?}",
                        url,
                        e,
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_timeout() => {
                    return Err(Error::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    })
                }
                Err(e) => return Err(Error::Http(e)),
            }
        }
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        params: &RequestParams,
        timeout: Duration,
    ) -> Result<RequestBuilder> {
        let mut req = self.client.request(method.into(), url).timeout(timeout);

        for (key, value) in &params.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(cookies) = params.cookie_header() {
            req = req.header(COOKIE, cookies);
        }

        if !params.query.is_empty() {
            req = req.query(&params.query);
        }

        req = match &params.auth {
            Some(Auth::Basic { username, password }) => req.basic_auth(username, password.as_ref()),
            Some(Auth::Bearer { token }) => req.bearer_auth(token),
            None => req,
        };

        if let Some(data) = &params.data {
            req = if params.send_as_json.unwrap_or(false) {
                req.header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                    .body(serde_json::to_string(data)?)
            } else {
                match data {
                    JsonValue::String(text) => req.body(text.clone()),
                    JsonValue::Object(_) => req.form(data),
                    other => req.body(other.to_string()),
                }
            };
        }

        Ok(req)
    }

    async fn demand_success(&self, response: Response, params: &RequestParams) -> Result<Response> {
        let status = response.status().as_u16();
        if params.is_success(status) {
            return Ok(response);
        }

        let url = response.url().to_string();
        let text = response.text().await.unwrap_or_default();
        let details = serde_json::from_str::<JsonValue>(&text)
            .map(|json| json.to_string())
            .unwrap_or(text);

        error!(
            "Unexpected response from {}: url: {}, code: {}, details: {}",
            self.config.name, url, status, details
        );
        Err(Error::http_service(status, url, details))
    }
}

impl std::fmt::Debug for HttpServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServiceClient")
            .field("url", &self.config.url)
            .field("name", &self.config.name)
            .field("has_hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}
