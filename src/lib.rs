//! # dialnet
//!
//! Resolve a host/service pair and connect to the first reachable address.
//!
//! `dialnet` asks a resolver for an ordered list of candidate endpoints and
//! tries them one at a time with a blocking connect. The first candidate that
//! connects wins; every socket opened for a failed candidate is closed before
//! the next attempt, and the candidate list is released before the call
//! returns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dialnet::socket::connectjob::ConnectJob;
//! use std::io::{Read, Write};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut job = ConnectJob::system();
//!     let mut conn = job.connect("example.com", "http")?;
//!     conn.write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n")?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = conn.read(&mut buf)?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types, error context helpers, connect states
//! - [`dns`] - Candidate endpoints and resolvers
//! - [`socket`] - The connect job, transports and the connection handle

pub mod base;
pub mod dns;
pub mod socket;

pub use base::loadstate::ConnectState;
pub use base::neterror::{
    AttemptFailure, ConnectError, ConnectionError, FailureReason, ResolutionError,
};
pub use socket::connectjob::{connect_async, ConnectJob, ConnectOutcome};
pub use socket::options::ConnectOptions;
pub use socket::stream::Connection;
