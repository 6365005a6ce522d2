// # Local Interface IP Source
//
// This crate provides IPv6 discovery for the DDNS agent by inspecting the
// host's own interface addresses. No external service is contacted: on an
// IPv6 network the address assigned to the interface is already public.
//
// ## Candidate Filter
//
// Each interface address must, in order:
// 1. not be loopback
// 2. not be IPv4 (IPv4-mapped IPv6 counts as IPv4)
// 3. be global unicast (not unspecified, multicast or link-local)
// 4. start with the configured textual prefix (default "240")
//
// The prefix narrows the result to the ISP's address block and deliberately
// excludes other routable prefixes (ULA, tunnels). An empty prefix accepts
// every global unicast address.
//
// ## Ordering
//
// The first qualifying address wins, in the order the platform enumerates
// interfaces. That order is platform-dependent and not guaranteed stable
// across runs.

use ddns_core::config::DdnsConfig;
use ddns_core::traits::IpSource;
use ddns_core::{AddressFamily, DiscoveredAddress, Result};

use std::net::{IpAddr, Ipv6Addr};

/// Whether `addr` is an IPv6 global unicast address
///
/// Rules out unspecified, loopback, multicast and link-local unicast
/// (`fe80::/10`). Unique-local and documentation ranges pass; the prefix
/// check is what narrows those out.
pub fn is_global_unicast(addr: &Ipv6Addr) -> bool {
    !addr.is_unspecified()
        && !addr.is_loopback()
        && !addr.is_multicast()
        && (addr.segments()[0] & 0xffc0) != 0xfe80
}

/// Pick the first address that passes the candidate filter
pub fn select_ipv6<I>(candidates: I, prefix: &str) -> Option<Ipv6Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    candidates
        .into_iter()
        .filter(|ip| !ip.is_loopback())
        .filter_map(|ip| match ip {
            IpAddr::V6(v6) if v6.to_ipv4_mapped().is_none() => Some(v6),
            _ => None,
        })
        .filter(is_global_unicast)
        .find(|v6| v6.to_string().starts_with(prefix))
}

/// IPv6 source backed by local interface enumeration
#[derive(Debug, Clone)]
pub struct LocalIpv6Source {
    /// Required textual prefix
    prefix: String,
}

impl LocalIpv6Source {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Create from the agent configuration
    pub fn from_config(config: &DdnsConfig) -> Self {
        Self::new(config.ipv6_prefix.clone())
    }

    /// Addresses of all local interfaces, loopback included
    ///
    /// `getifaddrs` is a blocking call, so it runs on the blocking pool.
    async fn interface_addresses() -> Vec<IpAddr> {
        match tokio::task::spawn_blocking(if_addrs::get_if_addrs).await {
            Ok(Ok(interfaces)) => interfaces.iter().map(|iface| iface.ip()).collect(),
            Ok(Err(e)) => {
                tracing::debug!("Failed to enumerate network interfaces: {}", e);
                Vec::new()
            }
            Err(e) => {
                tracing::debug!("Interface enumeration task failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl IpSource for LocalIpv6Source {
    /// Never fails: enumeration errors surface as `NotFound`
    async fn current(&self) -> Result<DiscoveredAddress> {
        let selected = select_ipv6(Self::interface_addresses().await, &self.prefix);

        Ok(selected.map(|v6| v6.to_string()).into())
    }

    fn family(&self) -> AddressFamily {
        AddressFamily::V6
    }
}
