// # IP Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP echo service (IPv4): `ddns-ip-http` crate
// - Local interface enumeration (IPv6): `ddns-ip-local` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DiscoveredAddress, IpSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     match source.current().await? {
//         DiscoveredAddress::Found(addr) => println!("{}: {}", source.family(), addr),
//         DiscoveredAddress::NotFound => println!("{}: not found", source.family()),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::address::{AddressFamily, DiscoveredAddress};

/// Trait for IP source implementations
///
/// A source answers one question: what is the host's address for this
/// family right now. It does not cache, poll or watch; the engine calls it
/// once per iteration.
///
/// # Outcomes
///
/// - `Ok(DiscoveredAddress::Found(_))`: an address was discovered
/// - `Ok(DiscoveredAddress::NotFound)`: discovery worked but nothing matched
/// - `Err(Error)`: discovery itself failed (network, DNS, timeout)
///
/// Sources that cannot fail at the transport level (local enumeration)
/// never return `Err`.
///
/// Implementations must be read-only and safe to call repeatedly and
/// concurrently.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Discover the current address
    async fn current(&self) -> Result<DiscoveredAddress, crate::Error>;

    /// The address family this source discovers
    fn family(&self) -> AddressFamily;
}
