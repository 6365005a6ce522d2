// # HTTP IP Source
//
// This crate provides IPv4 discovery for the DDNS agent.
//
// ## Architecture
//
// Issues one GET against a "what is my IP" echo service per call and scans
// the body for the first dotted-quad. The body is treated as opaque text:
// echo services answer with HTML, JSON or plain text, so no structure is
// assumed.
//
// ## Outcomes
//
// - Transport failure (DNS, connect, timeout, body read) → `Err`
// - Body without a dotted-quad → `Ok(DiscoveredAddress::NotFound)`
// - Otherwise → `Ok(DiscoveredAddress::Found(first match))`
//
// Matches are not range-checked (`999.1.1.1` is returned as-is); the echo
// service is trusted to report a real address.

use ddns_core::config::DdnsConfig;
use ddns_core::traits::IpSource;
use ddns_core::{AddressFamily, DiscoveredAddress, Error, Result};

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use reqwest::header::USER_AGENT;

// ASCII digits only; `\d` would also accept other Unicode digits.
// Constant pattern, compiled once; test_pattern_compiles covers it.
static DOTTED_QUAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}")
        .expect("dotted-quad pattern is valid")
});

/// Return the first dotted-quad substring of `body`, in document order
pub fn extract_ipv4(body: &str) -> Option<&str> {
    DOTTED_QUAD_RE.find(body).map(|m| m.as_str())
}

/// HTTP echo-service IPv4 source
pub struct HttpIpSource {
    /// Echo service URL
    url: Url,

    /// User-Agent sent with every request
    user_agent: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: Echo service URL (e.g., "https://ddns.oray.com/checkip")
    /// - `user_agent`: User-Agent header value
    /// - `timeout`: Per-request timeout
    pub fn new(url: Url, user_agent: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            user_agent: user_agent.into(),
            client,
        })
    }

    /// Create from the agent configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(
            config.ipv4_echo_url.clone(),
            config.user_agent.clone(),
            config.http_timeout,
        )
    }

    /// Fetch the echo service body
    async fn fetch_body(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", self.url, e)))?;

        tracing::debug!(url = %self.url, status = %response.status(), "Echo service responded");

        response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read echo response: {}", e)))
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<DiscoveredAddress> {
        let body = self.fetch_body().await?;

        Ok(extract_ipv4(&body)
            .map(str::to_string)
            .into())
    }

    fn family(&self) -> AddressFamily {
        AddressFamily::V4
    }
}
