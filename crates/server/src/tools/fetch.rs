//! sw_fetch tool implementation.
//!
//! Routes one request through the active controller, the way a page's fetch
//! would be intercepted.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;
use wahlinfo_core::classify::RequestClass;
use wahlinfo_core::request::{Destination, Method, Request, RequestMode, Response, canonicalize};
use wahlinfo_core::worker::{Intercept, Network, Registration};

use super::{HostWorker, json_result};

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode; "navigate" for top-level page loads (default: cors).
    #[serde(default)]
    pub mode: RequestMode,

    /// Request destination, e.g. "image" or "script" (default: empty).
    #[serde(default)]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".into()
}

/// How the request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Answered by the controller.
    Respond,
    /// Not intercepted; performed directly against the network.
    PassThrough,
    /// Controller answered with a network error.
    NetworkError,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    /// Class assigned by the active controller, if any is active.
    pub class: Option<RequestClass>,
    pub outcome: FetchOutcome,
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: Option<String>,
    pub body_bytes: usize,
    pub error: Option<String>,
}

impl SwFetchOutput {
    fn new(request: &Request, class: Option<RequestClass>, outcome: FetchOutcome) -> Self {
        Self {
            url: request.url.to_string(),
            class,
            outcome,
            status: None,
            headers: Vec::new(),
            body: None,
            body_bytes: 0,
            error: None,
        }
    }

    fn with_response(mut self, response: Response) -> Self {
        self.status = Some(response.status);
        self.body_bytes = response.body.len();
        self.body = Some(String::from_utf8_lossy(&response.body).into_owned());
        self.headers = response.headers;
        self
    }

    fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<N: Network>(
    registration: &Registration<HostWorker<N>>, network: &N, origin: &Url, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let method: Method = params.method.parse()?;
    let url = canonicalize(&params.url, Some(origin))?;
    let request = Request::new(method, url)
        .with_mode(params.mode)
        .with_destination(params.destination);

    let class = registration.active().await.map(|worker| worker.classify(&request));

    let output = match registration.route(&request).await {
        Intercept::Respond(response) => {
            SwFetchOutput::new(&request, class, FetchOutcome::Respond).with_response(response)
        }
        Intercept::NetworkError(error) => {
            SwFetchOutput::new(&request, class, FetchOutcome::NetworkError).with_error(error)
        }
        Intercept::PassThrough => {
            let output = SwFetchOutput::new(&request, class, FetchOutcome::PassThrough);
            match network.fetch(&request).await {
                Ok(response) => output.with_response(response),
                Err(e) => output.with_error(e.to_string()),
            }
        }
    };

    tracing::debug!(url = %output.url, outcome = ?output.outcome, status = ?output.status, "sw_fetch");
    json_result(&output)
}
