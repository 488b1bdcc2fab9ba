//! Network access for the offline cache
//!
//! Requests and responses are plain values so they can be stored and compared.
//! The `Network` trait is the seam between the cache manager and whatever
//! actually reaches the origin; `HttpNetwork` does it over HTTP with ureq.

use crate::error::{ShellError, ShellResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Whether the request may be served from or written to the cache
    pub fn is_get(&self) -> bool {
        matches!(self, Self::Get)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ShellError::InvalidMethod(s.to_string())),
        }
    }
}

/// An outgoing resource request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Absolute URL or origin-relative path
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: vec![],
            body: vec![],
        }
    }

    /// Shorthand for a bodiless GET
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// A response as returned by the network and as stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(with = "hex::serde")]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![],
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 2xx range
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Anything that can carry a request to the origin
///
/// A returned `Err` means the fetch failed at the transport level (refused,
/// timed out, offline). Any HTTP status, including 4xx/5xx, is an `Ok`.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> ShellResult<Response>;

    /// Canonical URL for a request, used as the cache identity
    fn resolve(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Blocking ureq agent driven from the tokio blocking pool
#[derive(Clone)]
pub struct HttpNetwork {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpNetwork {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }
}

fn resolve_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_blocking(agent: &ureq::Agent, url: &str, request: &Request) -> ShellResult<Response> {
    let headers = &request.headers;
    let body = request.body.as_slice();

    let result = match request.method {
        Method::Get => with_headers(agent.get(url), headers).call(),
        Method::Head => with_headers(agent.head(url), headers).call(),
        Method::Delete => with_headers(agent.delete(url), headers).call(),
        Method::Options => with_headers(agent.options(url), headers).call(),
        Method::Post => with_headers(agent.post(url), headers).send(body),
        Method::Put => with_headers(agent.put(url), headers).send(body),
        Method::Patch => with_headers(agent.patch(url), headers).send(body),
    };

    let mut response = result.map_err(|e| ShellError::network(url, e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| ShellError::network(url, format!("reading body: {}", e)))?;

    Ok(Response {
        status,
        headers,
        body,
    })
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> ShellResult<Response> {
        let url = self.resolve(&request.url);
        debug!("{} {}", request.method, url);

        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || send_blocking(&agent, &url, &request))
            .await
            .map_err(|e| ShellError::Internal(format!("fetch task failed: {}", e)))?
    }

    fn resolve(&self, url: &str) -> String {
        resolve_url(&self.base_url, url)
    }
}
