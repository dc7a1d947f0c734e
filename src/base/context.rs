//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into per-attempt failures or resolution errors.

use crate::base::neterror::{AttemptFailure, FailureReason, ResolutionError};
use crate::dns::CandidateEndpoint;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Tag an IO error with the candidate and the step that failed.
    ///
    /// # Example
    /// ```ignore
    /// use dialnet::base::context::IoResultExt;
    ///
    /// let socket = transport.open(&endpoint)
    ///     .attempt_context(FailureReason::CannotCreateSocket, &endpoint)?;
    /// // Error: "Unable to open socket to 203.0.113.5:80: address family not supported"
    /// ```
    fn attempt_context(
        self,
        reason: FailureReason,
        endpoint: &CandidateEndpoint,
    ) -> Result<T, AttemptFailure>;

    /// Add resolution context to an IO error.
    fn resolution_context(self, host: &str, service: &str) -> Result<T, ResolutionError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn attempt_context(
        self,
        reason: FailureReason,
        endpoint: &CandidateEndpoint,
    ) -> Result<T, AttemptFailure> {
        self.map_err(|e| AttemptFailure::new(endpoint.clone(), reason, &e))
    }

    fn resolution_context(self, host: &str, service: &str) -> Result<T, ResolutionError> {
        self.map_err(|e| ResolutionError::new(host, service, e.to_string()))
    }
}
