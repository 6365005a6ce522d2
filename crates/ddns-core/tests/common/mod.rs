//! Test doubles and common utilities for engine contract tests
//!
//! This module provides minimal test doubles that script discovery
//! outcomes and record provider calls.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, Ipv4ErrorPolicy, UpdateCredential};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource, UpdateResponse};
use ddns_core::{AddressFamily, DiscoveredAddress};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted outcome of one discovery call
#[derive(Debug, Clone)]
pub enum Scripted {
    Found(&'static str),
    NotFound,
    TransportError(&'static str),
}

/// An IpSource that always returns the same scripted outcome
pub struct ScriptedIpSource {
    family: AddressFamily,
    outcome: Scripted,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(family: AddressFamily, outcome: Scripted) -> Self {
        Self {
            family,
            outcome,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn v4(outcome: Scripted) -> Self {
        Self::new(AddressFamily::V4, outcome)
    }

    pub fn v6(outcome: Scripted) -> Self {
        Self::new(AddressFamily::V6, outcome)
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new source that shares its call counter with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            family: other.family,
            outcome: other.outcome.clone(),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<DiscoveredAddress> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            Scripted::Found(addr) => Ok(DiscoveredAddress::found(addr)),
            Scripted::NotFound => Ok(DiscoveredAddress::NotFound),
            Scripted::TransportError(msg) => Err(Error::http(msg)),
        }
    }

    fn family(&self) -> AddressFamily {
        self.family
    }
}

/// How the mock provider answers
#[derive(Debug, Clone)]
pub enum ProviderBehavior {
    Respond { success: bool, message: &'static str },
    MalformedBody,
    TransportError,
}

/// A mock DnsProvider that records submitted addresses
pub struct MockDnsProvider {
    behavior: ProviderBehavior,
    submitted: Arc<Mutex<Vec<String>>>,
    delay: Duration,
}

impl MockDnsProvider {
    pub fn new(behavior: ProviderBehavior) -> Self {
        Self {
            behavior,
            submitted: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    pub fn accepting() -> Self {
        Self::new(ProviderBehavior::Respond {
            success: true,
            message: "updated",
        })
    }

    /// Delay every update by `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Addresses passed to update_record(), in call order
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    /// Create a new MockDnsProvider that shares its log with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            behavior: other.behavior.clone(),
            submitted: Arc::clone(&other.submitted),
            delay: other.delay,
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_record(&self, address: &str) -> Result<UpdateResponse> {
        self.submitted.lock().unwrap().push(address.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            ProviderBehavior::Respond { success, message } => Ok(UpdateResponse {
                success: *success,
                message: message.to_string(),
            }),
            ProviderBehavior::MalformedBody => {
                let err = serde_json::from_str::<UpdateResponse>("<html>502</html>").unwrap_err();
                Err(err.into())
            }
            ProviderBehavior::TransportError => Err(Error::http("connection refused")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config() -> DdnsConfig {
    DdnsConfig::new(UpdateCredential {
        domain: "home.example.com".to_string(),
        token: "test-token".to_string(),
        api_url: "https://dns.example.net/update".parse().unwrap(),
    })
}

pub fn config_with_policy(policy: Ipv4ErrorPolicy) -> DdnsConfig {
    let mut config = minimal_config();
    config.ipv4_error_policy = policy;
    config
}
