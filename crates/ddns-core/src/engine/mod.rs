//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Discovering the current IPv4 and IPv6 addresses
//! - Selecting at most one address per iteration
//! - Submitting the selected address via DnsProvider
//! - Sleeping for the configured interval, then starting over
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ IpSource v4  │   │ IpSource v6  │
//! └──────────────┘   └──────────────┘
//!         │                  │
//!         └────────┬─────────┘
//!                  ▼
//!         ┌──────────────────┐
//!         │  select_address  │
//!         └──────────────────┘
//!                  │
//!         ┌────────┴─────────┐
//!         ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐
//! │ DnsProvider  │   │    Events    │
//! │ (update)     │   │   (notify)   │
//! └──────────────┘   └──────────────┘
//! ```
//!
//! ## Iteration Flow
//!
//! 1. Discover IPv4 (may fail) and report it
//! 2. Discover IPv6 (never fails) and report it
//! 3. Prefer IPv6, fall back to IPv4, otherwise skip
//! 4. Call DnsProvider::update_record() and report the outcome
//! 5. Sleep, unless shutdown was requested

use crate::address::{AddressFamily, DiscoveredAddress};
use crate::config::{DdnsConfig, Ipv4ErrorPolicy};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { interval: Duration },

    /// IPv4 discovery completed
    Ipv4Discovered { address: DiscoveredAddress },

    /// IPv4 discovery failed at the transport level
    Ipv4Failed { error: String },

    /// IPv6 discovery completed
    Ipv6Discovered { address: DiscoveredAddress },

    /// Neither family produced a usable address; no update was sent
    NoUsableAddress,

    /// The iteration was skipped by [`Ipv4ErrorPolicy::SkipIteration`]
    IterationSkipped { reason: String },

    /// Provider accepted the update
    UpdateSucceeded { address: String, message: String },

    /// Provider answered `success: false`
    UpdateRejected { address: String, message: String },

    /// Request or response parsing failed
    UpdateFailed { address: String, error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Which address, if any, an iteration submits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Submit this address
    Submit {
        address: String,
        family: AddressFamily,
    },
    /// Neither family found anything usable
    NoUsableAddress,
    /// An IPv4 transport error blocked the iteration
    Skipped,
}

/// Address-selection policy
///
/// IPv6 wins unconditionally when found. Otherwise IPv4 is used when found.
/// A failed IPv4 lookup carries no address and is never submitted; under
/// [`Ipv4ErrorPolicy::SkipIteration`] it also blocks the IPv6 path.
pub fn select_address(
    ipv4: &Result<DiscoveredAddress>,
    ipv6: &DiscoveredAddress,
    policy: Ipv4ErrorPolicy,
) -> Selection {
    if ipv4.is_err() && policy == Ipv4ErrorPolicy::SkipIteration {
        return Selection::Skipped;
    }

    if let Some(address) = ipv6.as_found() {
        return Selection::Submit {
            address: address.to_string(),
            family: AddressFamily::V6,
        };
    }

    match ipv4 {
        Ok(DiscoveredAddress::Found(address)) => Selection::Submit {
            address: address.clone(),
            family: AddressFamily::V4,
        },
        Ok(DiscoveredAddress::NotFound) | Err(_) => Selection::NoUsableAddress,
    }
}

/// Core DDNS engine
///
/// The engine runs a single sequential loop. There is no state shared
/// between iterations other than the immutable configuration, so each
/// iteration is independent and submitting the same address twice is
/// harmless.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`] or [`DdnsEngine::run_with_shutdown()`]
/// 3. Engine runs until the shutdown signal is received
pub struct DdnsEngine {
    /// IPv4 discovery
    ipv4_source: Box<dyn IpSource>,

    /// IPv6 discovery
    ipv6_source: Box<dyn IpSource>,

    /// DNS provider for updating the record
    provider: Box<dyn DnsProvider>,

    /// Sleep between iterations
    interval: Duration,

    /// Selection behaviour after an IPv4 transport error
    ipv4_error_policy: Ipv4ErrorPolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events.
    /// Fails if the sources are wired to the wrong address family.
    pub fn new(
        ipv4_source: Box<dyn IpSource>,
        ipv6_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        if ipv4_source.family() != AddressFamily::V4 {
            return Err(Error::config("IPv4 slot requires an IPv4 source"));
        }
        if ipv6_source.family() != AddressFamily::V6 {
            return Err(Error::config("IPv6 slot requires an IPv6 source"));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            ipv4_source,
            ipv6_source,
            provider,
            interval: config.interval,
            ipv4_error_policy: config.ipv4_error_policy,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until Ctrl-C
    ///
    /// The interrupt listener is registered before the first iteration, so a
    /// Ctrl-C that arrives while an update is in flight stops the engine at
    /// the following sleep.
    pub async fn run(&self) -> Result<()> {
        let mut interrupt = interrupt_listener()
            .map_err(|e| Error::Other(format!("Failed to listen for Ctrl-C: {}", e)))?;

        self.run_internal(
            async move {
                interrupt.recv().await;
            },
            "Ctrl-C",
        )
        .await
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// Shutdown is observed while sleeping; an iteration that has already
    /// started runs to completion first.
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_internal(
            async move {
                let _ = shutdown_rx.await;
            },
            "Shutdown signal",
        )
        .await
    }

    /// Loop until `shutdown` completes
    async fn run_internal<F>(&self, shutdown: F, reason: &str) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.emit_event(EngineEvent::Started {
            interval: self.interval,
        });

        loop {
            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => break,
            }
        }

        self.stop(reason);
        Ok(())
    }

    /// Run exactly one iteration
    ///
    /// # Returns
    ///
    /// The address submitted to the provider, or `None` if the update was skipped.
    pub async fn tick(&self) -> Option<String> {
        let ipv4 = self.ipv4_source.current().await;
        match &ipv4 {
            Ok(address) => {
                info!("Public IPv4 address: {}", address);
                self.emit_event(EngineEvent::Ipv4Discovered {
                    address: address.clone(),
                });
            }
            Err(e) => {
                error!("Failed to discover IPv4 address: {}", e);
                self.emit_event(EngineEvent::Ipv4Failed {
                    error: e.to_string(),
                });
            }
        }

        let ipv6 = self.ipv6_source.current().await.unwrap_or_else(|e| {
            debug!("IPv6 discovery failed, treating as not found: {}", e);
            DiscoveredAddress::NotFound
        });
        info!("Public IPv6 address: {}", ipv6);
        self.emit_event(EngineEvent::Ipv6Discovered {
            address: ipv6.clone(),
        });

        match select_address(&ipv4, &ipv6, self.ipv4_error_policy) {
            Selection::Submit { address, family } => {
                debug!("Submitting {} address {}", family, address);
                self.update(&address).await;
                Some(address)
            }
            Selection::NoUsableAddress => {
                warn!("No usable public IP address found, skipping DNS update");
                self.emit_event(EngineEvent::NoUsableAddress);
                None
            }
            Selection::Skipped => {
                warn!("IPv4 discovery failed, skipping DNS update for this iteration");
                self.emit_event(EngineEvent::IterationSkipped {
                    reason: "IPv4 discovery failed".to_string(),
                });
                None
            }
        }
    }

    /// Submit one address and report the outcome
    ///
    /// Nothing here changes the schedule: success, rejection and failure
    /// all fall through to the next sleep.
    async fn update(&self, address: &str) {
        match self.provider.update_record(address).await {
            Ok(response) if response.success => {
                info!("DNS update succeeded: {}", response.message);
                self.emit_event(EngineEvent::UpdateSucceeded {
                    address: address.to_string(),
                    message: response.message,
                });
            }
            Ok(response) => {
                warn!("DNS update failed: {}", response.message);
                self.emit_event(EngineEvent::UpdateRejected {
                    address: address.to_string(),
                    message: response.message,
                });
            }
            Err(e) => {
                if e.is_parse_error() {
                    error!(
                        provider = self.provider.provider_name(),
                        "Failed to parse DNS update response: {}", e
                    );
                } else {
                    error!(
                        provider = self.provider.provider_name(),
                        "DNS update request failed: {}", e
                    );
                }
                self.emit_event(EngineEvent::UpdateFailed {
                    address: address.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn stop(&self, reason: &str) {
        info!("Shutdown signal received, engine stopped");
        self.emit_event(EngineEvent::Stopped {
            reason: reason.to_string(),
        });
    }

    /// Emit an engine event
    ///
    /// Never blocks the loop. A full channel drops the event with a
    /// warning; a closed channel means nobody is listening.
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(unix)]
fn interrupt_listener() -> std::io::Result<tokio::signal::unix::Signal> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn interrupt_listener() -> std::io::Result<tokio::signal::windows::CtrlC> {
    tokio::signal::windows::ctrl_c()
}
