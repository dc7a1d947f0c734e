//! Connected byte-stream handle.
//!
//! [`Connection`] owns the one socket that survived the attempt loop together
//! with the candidate it reached. Bytes pass through unchanged in both
//! directions; no framing is added.

use crate::dns::CandidateEndpoint;
use socket2::Socket;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

/// An open connection returned by a successful connect call.
///
/// Dropping the connection closes the socket.
#[derive(Debug)]
pub struct Connection<S> {
    socket: S,
    endpoint: CandidateEndpoint,
    connected: bool,
}

impl<S> Connection<S> {
    pub fn new(socket: S, endpoint: CandidateEndpoint) -> Self {
        Self {
            socket,
            endpoint,
            connected: true,
        }
    }

    /// The candidate this connection reached.
    pub fn endpoint(&self) -> &CandidateEndpoint {
        &self.endpoint
    }

    /// False once the peer closed its side (a read returned 0 bytes for a
    /// non-empty buffer) or after [`disconnect`](Connection::disconnect).
    ///
    /// A peer close that no read has observed yet is not detected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn get_ref(&self) -> &S {
        &self.socket
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    pub fn into_inner(self) -> S {
        self.socket
    }

    fn not_connected() -> io::Error {
        io::Error::new(io::ErrorKind::NotConnected, "Socket not connected")
    }
}

impl<S: Read> Connection<S> {
    /// Read whatever is available without treating `WouldBlock` as an error.
    ///
    /// On a non-blocking socket this returns `Ok(0)` both when no data is
    /// ready and when the peer closed; use
    /// [`is_connected`](Connection::is_connected) to tell them apart.
    pub fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            other => other,
        }
    }
}

impl<S: Read> Read for Connection<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.connected {
            return Ok(0);
        }
        let n = self.socket.read(buf)?;
        if n == 0 && !buf.is_empty() {
            tracing::debug!(address = %self.endpoint.address(), "peer closed connection");
            self.connected = false;
        }
        Ok(n)
    }
}

impl<S: Write> Write for Connection<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.connected {
            return Err(Self::not_connected());
        }
        self.socket.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.socket.flush()
    }
}

impl Connection<Socket> {
    /// Shut down both directions. Calling it again is a no-op.
    pub fn disconnect(&mut self) -> io::Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        match self.socket.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.socket.peer_addr()?.as_socket().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "peer address is not an IP address")
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()?.as_socket().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "local address is not an IP address")
        })
    }

    /// Convert to a standard library `TcpStream`, keeping the socket options.
    pub fn into_tcp_stream(self) -> TcpStream {
        self.socket.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn endpoint() -> CandidateEndpoint {
        CandidateEndpoint::new("203.0.113.5:80".parse().unwrap())
    }

    #[test]
    fn test_read_until_peer_close() {
        let mut conn = Connection::new(Cursor::new(b"hello".to_vec()), endpoint());
        let mut buf = [0u8; 16];

        assert_eq!(conn.read(&mut buf).unwrap(), 5);
        assert!(conn.is_connected());
        assert_eq!(conn.read(&mut buf).unwrap(), 0);
        assert!(!conn.is_connected());
    }

    #[test]
    fn test_empty_buffer_does_not_disconnect() {
        let mut conn = Connection::new(Cursor::new(Vec::new()), endpoint());
        assert_eq!(conn.read(&mut []).unwrap(), 0);
        assert!(conn.is_connected());
    }

    #[test]
    fn test_write_passes_bytes_through() {
        let mut conn = Connection::new(Cursor::new(Vec::new()), endpoint());
        conn.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(conn.into_inner().into_inner(), b"GET / HTTP/1.1\r\n\r\n");
    }

    struct WouldBlock;

    impl Read for WouldBlock {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::WouldBlock.into())
        }
    }

    #[test]
    fn test_read_available_maps_would_block() {
        let mut conn = Connection::new(WouldBlock, endpoint());
        let mut buf = [0u8; 8];

        assert_eq!(conn.read_available(&mut buf).unwrap(), 0);
        assert!(conn.is_connected());
        assert_eq!(
            conn.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::WouldBlock
        );
    }
}
