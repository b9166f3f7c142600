//! HTTP network adapter for the cache controller.
//!
//! ### Semantics
//! - Any HTTP status is a response: 404 and 500 come back as `Ok`
//! - Transport failures map to `NETWORK_ERROR`, timeouts to `FETCH_TIMEOUT`
//! - Bodies are decoded (gzip, brotli, deflate) and capped at `max_bytes`
//! - Max redirects: 5
//!
//! Because bodies are stored decoded, `content-encoding` and `content-length`
//! are dropped from the response headers.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};

use wahlinfo_core::request::{Method, Request, Response};
use wahlinfo_core::worker::Network;
use wahlinfo_core::{AppConfig, Error};

/// Headers that describe the wire encoding rather than the stored body.
const STRIPPED_HEADERS: [header::HeaderName; 3] =
    [header::CONTENT_ENCODING, header::CONTENT_LENGTH, header::TRANSFER_ENCODING];

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "wahlinfo-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

impl FetchConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
        }
    }
}

/// reqwest-backed [`Network`].
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn map_send_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(url.to_string())
    } else {
        Error::Network(format!("{url}: {err}"))
    }
}

fn too_large(len: usize, max: usize) -> Error {
    Error::FetchTooLarge(format!("{len} bytes exceeds {max}"))
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Perform the request and buffer the decoded body.
    async fn send(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let url = request.url.as_str();

        let mut builder = self.http.request(reqwest_method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.send().await.map_err(|e| map_send_error(url, e))?;
        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(too_large(len as usize, self.config.max_bytes));
        }

        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !STRIPPED_HEADERS.contains(name))
            .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| map_send_error(url, e))? {
            if body.len() + chunk.len() > self.config.max_bytes {
                return Err(too_large(body.len() + chunk.len(), self.config.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            method = %request.method,
            url,
            status,
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(Response::new(status, headers, body))
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.send(request).await
    }
}
