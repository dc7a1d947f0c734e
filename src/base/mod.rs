//! Base types and error handling.
//!
//! Provides foundational types shared by the resolver and the connector:
//! - [`neterror`]: Resolution and connection errors, per-attempt failures
//! - [`context`]: Helpers that attach endpoint context to IO errors
//! - [`loadstate`]: States a connect job moves through

pub mod context;
pub mod loadstate;
pub mod neterror;
