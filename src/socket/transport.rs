//! Local endpoint creation and connection.
//!
//! The connector drives a [`Transport`] through three steps per candidate:
//! `open` a local socket, `connect` it, then `configure` it. A socket that is
//! dropped is released, so every failed step after `open` closes the socket
//! before the next candidate is tried.

use super::options::ConnectOptions;
use crate::dns::CandidateEndpoint;
use socket2::{SockAddr, Socket};
use std::io;
use std::time::Duration;

/// Creates and connects local transport endpoints.
pub trait Transport {
    /// Local endpoint handle. Dropping it must release the endpoint.
    type Socket;

    /// Create a local endpoint matching the candidate's family, socket type
    /// and protocol.
    fn open(&self, endpoint: &CandidateEndpoint) -> io::Result<Self::Socket>;

    /// Connect `socket` to the candidate's address, blocking for at most
    /// `timeout` when one is given.
    fn connect(
        &self,
        socket: &Self::Socket,
        endpoint: &CandidateEndpoint,
        timeout: Option<Duration>,
    ) -> io::Result<()>;

    /// Apply post-connect options.
    fn configure(&self, _socket: &Self::Socket) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    type Socket = T::Socket;

    fn open(&self, endpoint: &CandidateEndpoint) -> io::Result<Self::Socket> {
        (**self).open(endpoint)
    }

    fn connect(
        &self,
        socket: &Self::Socket,
        endpoint: &CandidateEndpoint,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        (**self).connect(socket, endpoint, timeout)
    }

    fn configure(&self, socket: &Self::Socket) -> io::Result<()> {
        (**self).configure(socket)
    }
}

/// TCP transport built on `socket2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpTransport {
    nodelay: bool,
    keepalive: bool,
    nonblocking: bool,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpTransport {
    /// Create a TCP transport with default settings
    pub fn new() -> Self {
        TcpTransport {
            nodelay: true,
            keepalive: false,
            nonblocking: false,
        }
    }

    /// Set TCP_NODELAY after connecting
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Set SO_KEEPALIVE after connecting
    pub fn keepalive(mut self, keepalive: bool) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Leave the connected socket in non-blocking mode
    pub fn nonblocking(mut self, nonblocking: bool) -> Self {
        self.nonblocking = nonblocking;
        self
    }
}

impl From<&ConnectOptions> for TcpTransport {
    fn from(options: &ConnectOptions) -> Self {
        TcpTransport::new()
            .nodelay(options.nodelay)
            .keepalive(options.keepalive)
            .nonblocking(options.nonblocking)
    }
}

impl Transport for TcpTransport {
    type Socket = Socket;

    fn open(&self, endpoint: &CandidateEndpoint) -> io::Result<Socket> {
        Socket::new(
            endpoint.family().into(),
            endpoint.socket_type().into(),
            endpoint.protocol().to_socket2(),
        )
    }

    fn connect(
        &self,
        socket: &Socket,
        endpoint: &CandidateEndpoint,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        let addr = SockAddr::from(endpoint.address());
        match timeout {
            Some(timeout) => socket.connect_timeout(&addr, timeout),
            None => socket.connect(&addr),
        }
    }

    fn configure(&self, socket: &Socket) -> io::Result<()> {
        if self.nodelay {
            socket.set_nodelay(true)?;
        }
        if self.keepalive {
            socket.set_keepalive(true)?;
        }
        if self.nonblocking {
            socket.set_nonblocking(true)?;
        }
        Ok(())
    }
}
