//! Socket and connection management.
//!
//! - [`connectjob`]: Resolve -> sequential per-candidate connect flow
//! - [`transport`]: Local endpoint creation, connect and post-connect options
//! - [`stream`]: The byte-stream handle returned on success
//! - [`options`]: Deadlines, family hint and socket options

pub mod connectjob;
pub mod options;
pub mod stream;
pub mod transport;
