//! Discovered address model
//!
//! A discovery attempt yields either an address literal or an explicit
//! "not found". Both are normal outcomes; transport failures travel
//! separately as [`crate::Error`].

use std::fmt;

/// Address family an [`crate::IpSource`] discovers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Outcome of a single discovery attempt
///
/// `Found` carries the textual address exactly as discovered. IPv4 text
/// comes from a pattern match on the echo service body and is not range
/// checked, so it is kept as a string rather than an `IpAddr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveredAddress {
    /// A usable address literal
    Found(String),
    /// No address matched
    NotFound,
}

impl DiscoveredAddress {
    /// Wrap an address literal
    pub fn found(address: impl Into<String>) -> Self {
        Self::Found(address.into())
    }

    /// The address text, if one was found
    pub fn as_found(&self) -> Option<&str> {
        match self {
            DiscoveredAddress::Found(address) => Some(address),
            DiscoveredAddress::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, DiscoveredAddress::Found(_))
    }
}

impl From<Option<String>> for DiscoveredAddress {
    fn from(value: Option<String>) -> Self {
        value.map_or(DiscoveredAddress::NotFound, DiscoveredAddress::Found)
    }
}

impl fmt::Display for DiscoveredAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveredAddress::Found(address) => f.write_str(address),
            DiscoveredAddress::NotFound => f.write_str("not found"),
        }
    }
}
