// # DNS Provider Trait
//
// Defines the interface for pushing an address to the DNS provider.
//
// ## Implementations
//
// - HTTP GET callback: `ddns-provider-callback` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let response = provider.update_record("203.0.113.5").await?;
//     println!("success={} message={}", response.success, response.message);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured answer of the provider endpoint
///
/// Wire format: `{"success": <bool>, "message": <string>}`. A missing field
/// decodes to `false` / `""`; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Whether the provider accepted the update
    #[serde(default)]
    pub success: bool,
    /// Human-readable message, surfaced verbatim
    #[serde(default)]
    pub message: String,
}

/// Trait for DNS provider implementations
///
/// The provider owns the credential (domain, token, endpoint); the engine
/// only hands it the address selected for this iteration.
///
/// # Single-shot
///
/// One call is one outbound request. Providers do not retry, back off or
/// cache: a failed call is reported by the engine and the next attempt
/// happens on the next scheduled iteration.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Submit `address` for the configured domain
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateResponse)`: the provider answered with a well-formed body,
    ///   whether it reports success or a logical failure
    /// - `Err(Error::Http)`: the request could not be completed
    /// - `Err(Error::Json)`: the body was not a JSON object of the response shape
    async fn update_record(&self, address: &str) -> Result<UpdateResponse, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
