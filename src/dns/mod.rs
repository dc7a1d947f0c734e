//! Name Resolution Module
//!
//! Provides pluggable resolution of a host/service pair into an ordered
//! list of candidate endpoints:
//! - System resolver (`getaddrinfo` with family and socket-type hints)
//! - Hostname-to-address override mechanism
//!
//! # Architecture
//!
//! The `Resolve` trait is the core abstraction. The connector only ever sees
//! an [`AddressList`]; how it was produced (system call, overrides, a test
//! double) is the resolver's business.
//!
//! # Example
//!
//! ```rust,ignore
//! use dialnet::dns::{GaiResolver, Query, Resolve};
//!
//! let resolver = GaiResolver::new();
//! let candidates = resolver.resolve(&Query::new("example.com", "http"))?;
//! for candidate in &candidates {
//!     println!("Resolved: {}", candidate);
//! }
//! ```

mod endpoint;
mod gai;
mod resolve;

pub use endpoint::{AddressFamily, AddressList, CandidateEndpoint, Protocol, SocketType};
pub use gai::GaiResolver;
pub use resolve::{DnsResolverWithOverrides, Hints, Name, Query, Resolve, Service};
