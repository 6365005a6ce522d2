//! Configuration types for the DDNS agent
//!
//! Configuration is read from the process environment exactly once, at
//! startup, and then handed to the components by value. Nothing re-reads
//! or re-validates it afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

/// Required: domain name submitted on every update
pub const ENV_DOMAIN: &str = "DOMAIN";
/// Required: provider credential
pub const ENV_TOKEN: &str = "TOKEN";
/// Required: base URL of the provider's update endpoint
pub const ENV_API_URL: &str = "API_URL";

pub const ENV_INTERVAL_SECS: &str = "DDNS_INTERVAL_SECS";
pub const ENV_IPV6_PREFIX: &str = "DDNS_IPV6_PREFIX";
pub const ENV_IPV4_ECHO_URL: &str = "DDNS_IPV4_ECHO_URL";
pub const ENV_USER_AGENT: &str = "DDNS_USER_AGENT";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DDNS_HTTP_TIMEOUT_SECS";
pub const ENV_IPV4_ERROR_POLICY: &str = "DDNS_IPV4_ERROR_POLICY";
pub const ENV_DRY_RUN: &str = "DDNS_DRY_RUN";

/// Default interval between two iterations of the update loop
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default IPv6 textual prefix (the deploying ISP's global unicast block)
pub const DEFAULT_IPV6_PREFIX: &str = "240";

/// Default IPv4 echo service
pub const DEFAULT_IPV4_ECHO_URL: &str = "https://ddns.oray.com/checkip";

/// Browser User-Agent; some echo services refuse non-browser clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Ubuntu 20.04; x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

/// Default timeout applied to every outbound HTTP request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

const MAX_INTERVAL_SECS: u64 = 86_400;
const MAX_HTTP_TIMEOUT_SECS: u64 = 300;

/// Immutable credential triple submitted to the provider
///
/// The Debug implementation does NOT expose the token.
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateCredential {
    /// Domain name to update
    pub domain: String,
    /// Authentication token sent as the `token` query parameter
    /// ⚠️ NEVER log this value
    pub token: String,
    /// Provider endpoint base URL
    pub api_url: Url,
}

impl fmt::Debug for UpdateCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateCredential")
            .field("domain", &self.domain)
            .field("token", &"<REDACTED>")
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

/// What an IPv4 transport error means for address selection
///
/// An echo-service failure produces no address text at all, so it can
/// never be submitted by accident. The policy only decides whether the
/// failure also blocks the IPv6 path for that iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ipv4ErrorPolicy {
    /// The failed lookup counts as "no usable IPv4"; IPv6 is still used
    #[default]
    Unusable,
    /// The whole iteration is skipped, even if IPv6 was found
    SkipIteration,
}

impl FromStr for Ipv4ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unusable" => Ok(Ipv4ErrorPolicy::Unusable),
            "skip-iteration" | "skip_iteration" => Ok(Ipv4ErrorPolicy::SkipIteration),
            other => Err(Error::config(format!(
                "{} '{}' is not valid. Valid values: unusable, skip-iteration",
                ENV_IPV4_ERROR_POLICY, other
            ))),
        }
    }
}

/// Main DDNS configuration
#[derive(Debug, Clone)]
pub struct DdnsConfig {
    /// Provider credential (domain, token, endpoint)
    pub credential: UpdateCredential,

    /// Sleep between two iterations of the update loop
    pub interval: Duration,

    /// Textual prefix a local IPv6 address must start with.
    /// An empty prefix accepts every global unicast address.
    pub ipv6_prefix: String,

    /// IPv4 echo service URL
    pub ipv4_echo_url: Url,

    /// User-Agent header sent to the echo service
    pub user_agent: String,

    /// Timeout applied to each outbound HTTP request
    pub http_timeout: Duration,

    /// Selection behaviour after an IPv4 transport error
    pub ipv4_error_policy: Ipv4ErrorPolicy,

    /// Log updates instead of sending them
    pub dry_run: bool,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the credential
    pub fn new(credential: UpdateCredential) -> Self {
        Self {
            credential,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            ipv6_prefix: DEFAULT_IPV6_PREFIX.to_string(),
            ipv4_echo_url: DEFAULT_ECHO_URL.clone(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            ipv4_error_policy: Ipv4ErrorPolicy::default(),
            dry_run: false,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// `DOMAIN`, `TOKEN` and `API_URL` are checked in that order; the first
    /// one that is unset or empty is reported by name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let domain = required(&lookup, ENV_DOMAIN)?;
        let token = required(&lookup, ENV_TOKEN)?;
        let api_url = required(&lookup, ENV_API_URL)?;
        let api_url = parse_url(ENV_API_URL, &api_url)?;

        let mut config = Self::new(UpdateCredential {
            domain,
            token,
            api_url,
        });

        if let Some(secs) = optional(&lookup, ENV_INTERVAL_SECS) {
            config.interval = Duration::from_secs(parse_secs(
                ENV_INTERVAL_SECS,
                &secs,
                MAX_INTERVAL_SECS,
            )?);
        }

        // Unlike the other optionals, an explicitly empty prefix is meaningful
        if let Some(prefix) = lookup(ENV_IPV6_PREFIX) {
            config.ipv6_prefix = prefix.trim().to_string();
        }

        if let Some(url) = optional(&lookup, ENV_IPV4_ECHO_URL) {
            config.ipv4_echo_url = parse_url(ENV_IPV4_ECHO_URL, &url)?;
        }

        if let Some(user_agent) = optional(&lookup, ENV_USER_AGENT) {
            config.user_agent = user_agent;
        }

        if let Some(secs) = optional(&lookup, ENV_HTTP_TIMEOUT_SECS) {
            config.http_timeout = Duration::from_secs(parse_secs(
                ENV_HTTP_TIMEOUT_SECS,
                &secs,
                MAX_HTTP_TIMEOUT_SECS,
            )?);
        }

        if let Some(policy) = optional(&lookup, ENV_IPV4_ERROR_POLICY) {
            config.ipv4_error_policy = policy.parse()?;
        }

        if let Some(flag) = optional(&lookup, ENV_DRY_RUN) {
            config.dry_run = parse_bool(ENV_DRY_RUN, &flag)?;
        }

        Ok(config)
    }
}

/// A whitespace-only value counts as unset; any other value is kept as given
fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::config(format!("environment variable {} is not set", name)))
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| Error::config(format!("{} is not a valid URL: {}", name, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::config(format!(
            "{} must use the http or https scheme. Got: {}",
            name, scheme
        ))),
    }
}

fn parse_secs(name: &str, value: &str, max: u64) -> Result<u64> {
    let secs: u64 = value
        .parse()
        .map_err(|_| Error::config(format!("{} must be a number of seconds. Got: {}", name, value)))?;

    if !(1..=max).contains(&secs) {
        return Err(Error::config(format!(
            "{} must be between 1 and {} seconds. Got: {}",
            name, max, secs
        )));
    }

    Ok(secs)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{} must be true or false. Got: {}", name, value))),
    }
}

// Constant input, parsed once; test_default_echo_url_parses covers it
static DEFAULT_ECHO_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse(DEFAULT_IPV4_ECHO_URL).expect("default echo URL is valid")
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn required_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_DOMAIN, "home.example.com"),
            (ENV_TOKEN, "s3cr3t"),
            (ENV_API_URL, "https://dns.example.net/update"),
        ]
    }

    #[test]
    fn test_loads_required_with_defaults() {
        let config = DdnsConfig::from_lookup(lookup_from(&required_vars())).unwrap();

        assert_eq!(config.credential.domain, "home.example.com");
        assert_eq!(config.credential.token, "s3cr3t");
        assert_eq!(config.credential.api_url.as_str(), "https://dns.example.net/update");
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.ipv6_prefix, "240");
        assert_eq!(config.ipv4_echo_url.as_str(), DEFAULT_IPV4_ECHO_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.ipv4_error_policy, Ipv4ErrorPolicy::Unusable);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_missing_variable_is_named() {
        for missing in [ENV_DOMAIN, ENV_TOKEN, ENV_API_URL] {
            let vars: Vec<_> = required_vars()
                .into_iter()
                .filter(|(name, _)| *name != missing)
                .collect();

            let err = DdnsConfig::from_lookup(lookup_from(&vars)).unwrap_err();
            let text = err.to_string();
            assert!(matches!(err, Error::Config(_)));
            assert!(text.contains(missing), "{} should name {}", text, missing);
            for other in [ENV_DOMAIN, ENV_TOKEN, ENV_API_URL] {
                if other != missing {
                    assert!(!text.contains(&format!(" {} ", other)));
                }
            }
        }
    }

    #[test]
    fn test_empty_variable_counts_as_missing() {
        let mut vars = required_vars();
        vars[1] = (ENV_TOKEN, "  ");

        let err = DdnsConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: environment variable TOKEN is not set"
        );
    }

    #[test]
    fn test_required_values_kept_verbatim() {
        let mut vars = required_vars();
        vars[0] = (ENV_DOMAIN, "home.example.com ");
        vars[1] = (ENV_TOKEN, " tok ");

        let config = DdnsConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.credential.domain, "home.example.com ");
        assert_eq!(config.credential.token, " tok ");
    }

    #[test]
    fn test_default_echo_url_parses() {
        let url = LazyLock::force(&DEFAULT_ECHO_URL);
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.as_str(), DEFAULT_IPV4_ECHO_URL);
    }

    #[test]
    fn test_first_missing_variable_wins() {
        let err = DdnsConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("DOMAIN"));
    }

    #[test]
    fn test_invalid_api_url() {
        let mut vars = required_vars();
        vars[2] = (ENV_API_URL, "not a url");
        assert!(DdnsConfig::from_lookup(lookup_from(&vars)).is_err());

        vars[2] = (ENV_API_URL, "ftp://dns.example.net/update");
        assert!(DdnsConfig::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = required_vars();
        vars.extend([
            (ENV_INTERVAL_SECS, "300"),
            (ENV_IPV6_PREFIX, "2408"),
            (ENV_IPV4_ECHO_URL, "http://echo.example.org/ip"),
            (ENV_USER_AGENT, "curl/8.0"),
            (ENV_HTTP_TIMEOUT_SECS, "5"),
            (ENV_IPV4_ERROR_POLICY, "skip-iteration"),
            (ENV_DRY_RUN, "true"),
        ]);

        let config = DdnsConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.ipv6_prefix, "2408");
        assert_eq!(config.ipv4_echo_url.as_str(), "http://echo.example.org/ip");
        assert_eq!(config.user_agent, "curl/8.0");
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.ipv4_error_policy, Ipv4ErrorPolicy::SkipIteration);
        assert!(config.dry_run);
    }

    #[test]
    fn test_empty_prefix_disables_narrowing() {
        let mut vars = required_vars();
        vars.push((ENV_IPV6_PREFIX, ""));

        let config = DdnsConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.ipv6_prefix, "");
    }

    #[test]
    fn test_interval_out_of_range() {
        for bad in ["0", "86401", "sixty"] {
            let mut vars = required_vars();
            vars.push((ENV_INTERVAL_SECS, bad));
            assert!(DdnsConfig::from_lookup(lookup_from(&vars)).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_unknown_policy() {
        let mut vars = required_vars();
        vars.push((ENV_IPV4_ERROR_POLICY, "retry"));
        assert!(DdnsConfig::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let config = DdnsConfig::from_lookup(lookup_from(&required_vars())).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<REDACTED>"));
    }
}
