// # ddns-core
//
// Core library for the polling DDNS update agent.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for discovering the host's current public address
// - **DnsProvider**: Trait for submitting an address to the provider endpoint
// - **DdnsEngine**: Poll loop that runs discover → select → update → sleep
// - **DdnsConfig**: Immutable configuration read once at startup
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **No hidden state**: Every iteration is independent; nothing is persisted
// 3. **Explicit absence**: "not found" is a value, transport failure is an error
// 4. **Library-First**: The daemon is a thin wiring layer over this crate

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod address;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent};
pub use config::{DdnsConfig, UpdateCredential, Ipv4ErrorPolicy};
pub use address::{DiscoveredAddress, AddressFamily};
pub use error::{Error, Result};
