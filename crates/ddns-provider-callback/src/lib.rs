// # Callback DNS Provider
//
// This crate provides the DNS updater for the DDNS agent: a single HTTP GET
// against the provider's update endpoint.
//
// ## Wire Format
//
// ```http
// GET {API_URL}?domain={DOMAIN}&token={TOKEN}&addr={address}
// ```
//
// Each query value is percent-encoded. Query pairs already present in
// `API_URL` are preserved and the three pairs are appended after them.
//
// The response body is expected to be:
//
// ```json
// {"success": true, "message": "updated"}
// ```
//
// The body is parsed whatever the HTTP status; providers of this kind
// report logical failures in the body, not in the status line.
//
// ## Behaviour
//
// - One request per call, no retry, no backoff, no caching
// - Transport failure → `Error::Http`
// - Undecodable body → `Error::Json`
// - Missing `success` / `message` decode as `false` / `""`
// - `success: false` is a normal `Ok` answer, reported by the engine
//
// ## Security Requirements
//
// - The token NEVER appears in logs; the full request URL is never logged
// - The Debug implementation redacts the token

use async_trait::async_trait;
use ddns_core::config::{DdnsConfig, UpdateCredential};
use ddns_core::traits::{DnsProvider, UpdateResponse};
use ddns_core::{Error, Result};
use reqwest::Url;
use std::time::Duration;

/// Build the update URL for `address`
///
/// Appends `domain`, `token` and `addr` (in that order) to the endpoint's
/// query string, percent-encoding each value.
pub fn build_update_url(credential: &UpdateCredential, address: &str) -> Url {
    let mut url = credential.api_url.clone();
    url.query_pairs_mut()
        .append_pair("domain", &credential.domain)
        .append_pair("token", &credential.token)
        .append_pair("addr", address);
    url
}

/// Decode a provider response body
pub fn parse_response(body: &str) -> Result<UpdateResponse> {
    Ok(serde_json::from_str(body)?)
}

/// HTTP GET callback provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider builds the request and logs the
/// intended update but sends nothing, answering with a synthetic success.
pub struct CallbackProvider {
    /// Domain, token and endpoint
    /// ⚠️ NEVER log the token
    credential: UpdateCredential,

    /// HTTP client for update requests
    client: reqwest::Client,

    /// Dry-run mode: if true, skip the request
    dry_run: bool,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for CallbackProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackProvider")
            .field("domain", &self.credential.domain)
            .field("token", &"<REDACTED>")
            .field("endpoint", &endpoint_without_query(&self.credential.api_url))
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CallbackProvider {
    /// Create a new callback provider
    ///
    /// # Parameters
    ///
    /// - `credential`: Domain, token and endpoint (validated at startup)
    /// - `timeout`: Per-request timeout
    /// - `dry_run`: If true, log the update instead of sending it
    pub fn new(credential: UpdateCredential, timeout: Duration, dry_run: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credential,
            client,
            dry_run,
        })
    }

    /// Create from the agent configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(
            config.credential.clone(),
            config.http_timeout,
            config.dry_run,
        )
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl DnsProvider for CallbackProvider {
    async fn update_record(&self, address: &str) -> Result<UpdateResponse> {
        let url = build_update_url(&self.credential, address);
        let endpoint = endpoint_without_query(&self.credential.api_url);

        if self.dry_run {
            tracing::info!(
                domain = %self.credential.domain,
                endpoint = %endpoint,
                "[DRY-RUN] Would update DNS record -> {}",
                address
            );
            return Ok(UpdateResponse {
                success: true,
                message: format!("dry run: {} not sent", address),
            });
        }

        tracing::debug!(
            domain = %self.credential.domain,
            endpoint = %endpoint,
            "Sending DNS update -> {}",
            address
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            // reqwest errors embed the URL, which carries the token
            Error::http(format!("Request to {} failed: {}", endpoint, e.without_url()))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e.without_url())))?;

        tracing::debug!(status = %status, "Provider responded");

        parse_response(&body)
    }

    fn provider_name(&self) -> &'static str {
        "callback"
    }
}

/// Endpoint rendered without its query string, safe to log
fn endpoint_without_query(url: &Url) -> String {
    let mut endpoint = url.clone();
    endpoint.set_query(None);
    endpoint.to_string()
}
