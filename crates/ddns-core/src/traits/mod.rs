//! Core traits for the DDNS agent
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the host's current address for one family
//! - [`DnsProvider`]: Submit an address to the provider endpoint

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, UpdateResponse};
