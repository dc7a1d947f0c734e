//! Candidate endpoints produced by resolution.
//!
//! A [`CandidateEndpoint`] is one (family, socket type, protocol, address)
//! tuple a connection may be attempted against. An [`AddressList`] is the
//! immutable, ordered sequence of candidates returned by one resolution.

use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, ops::Index};

/// Address family of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Family of a resolved socket address.
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddressFamily::Ipv4,
            SocketAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl From<AddressFamily> for socket2::Domain {
    fn from(family: AddressFamily) -> Self {
        match family {
            AddressFamily::Ipv4 => socket2::Domain::IPV4,
            AddressFamily::Ipv6 => socket2::Domain::IPV6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => f.write_str("ipv4"),
            AddressFamily::Ipv6 => f.write_str("ipv6"),
        }
    }
}

/// Transport semantics requested for a candidate.
///
/// Resolvers asked for stream sockets only ever return `Stream`; any other
/// raw value a platform resolver reports is preserved as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SocketType {
    #[default]
    Stream,
    Other(i32),
}

impl From<SocketType> for socket2::Type {
    fn from(kind: SocketType) -> Self {
        match kind {
            SocketType::Stream => socket2::Type::STREAM,
            SocketType::Other(raw) => socket2::Type::from(raw),
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketType::Stream => f.write_str("stream"),
            SocketType::Other(raw) => write!(f, "socktype({})", raw),
        }
    }
}

/// Transport protocol implied by the socket type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    /// Raw protocol number; `Other(0)` lets the OS pick the default.
    Other(i32),
}

impl Protocol {
    pub(crate) fn to_socket2(self) -> Option<socket2::Protocol> {
        match self {
            Protocol::Tcp => Some(socket2::Protocol::TCP),
            Protocol::Other(0) => None,
            Protocol::Other(raw) => Some(socket2::Protocol::from(raw)),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Other(raw) => write!(f, "proto({})", raw),
        }
    }
}

/// One resolved network address a connection may be attempted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateEndpoint {
    address: SocketAddr,
    socket_type: SocketType,
    protocol: Protocol,
    flags: i32,
    canonical_name: Option<Box<str>>,
}

impl CandidateEndpoint {
    /// A stream/TCP candidate for `address`.
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            socket_type: SocketType::Stream,
            protocol: Protocol::Tcp,
            flags: 0,
            canonical_name: None,
        }
    }

    pub fn with_socket_type(mut self, socket_type: SocketType) -> Self {
        self.socket_type = socket_type;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Raw `ai_flags` reported by the resolver.
    pub fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_canonical_name(mut self, name: impl Into<Box<str>>) -> Self {
        self.canonical_name = Some(name.into());
        self
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.address)
    }

    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn flags(&self) -> i32 {
        self.flags
    }

    /// Length of the platform socket address structure for this address.
    pub fn address_len(&self) -> usize {
        socket2::SockAddr::from(self.address).len() as usize
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn canonical_name(&self) -> Option<&str> {
        self.canonical_name.as_deref()
    }

    /// Multi-line dump of every field, one `name<TAB>value` pair per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("addrinfo:\n");
        out.push_str(&format!("  flags\t{}\n", self.flags));
        out.push_str(&format!("  family\t{}\n", self.family()));
        out.push_str(&format!("  socktype\t{}\n", self.socket_type));
        out.push_str(&format!("  protocol\t{}\n", self.protocol));
        out.push_str(&format!("  addrlen\t{}\n", self.address_len()));
        match self.address {
            SocketAddr::V4(v4) => {
                out.push_str("  addr\tsockaddr_in\n");
                out.push_str(&format!("    port\t{}\n", v4.port()));
                out.push_str(&format!("    addr\t{}\n", v4.ip()));
            }
            SocketAddr::V6(v6) => {
                out.push_str("  addr\tsockaddr_in6\n");
                out.push_str(&format!("    port\t{}\n", v6.port()));
                out.push_str(&format!("    flowinfo\t{}\n", v6.flowinfo()));
                out.push_str(&format!("    addr\t{}\n", v6.ip()));
                out.push_str(&format!("    scope_id\t{}\n", v6.scope_id()));
            }
        }
        if let Some(name) = &self.canonical_name {
            out.push_str(&format!("  canonname\t{}\n", name));
        }
        out
    }
}

impl From<SocketAddr> for CandidateEndpoint {
    fn from(address: SocketAddr) -> Self {
        CandidateEndpoint::new(address)
    }
}

impl fmt::Display for CandidateEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.family(),
            self.socket_type,
            self.protocol,
            self.address
        )
    }
}

/// Ordered, immutable sequence of candidates from one resolution.
///
/// Order is whatever the resolver produced; nothing here sorts or
/// deduplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressList {
    entries: Box<[CandidateEndpoint]>,
}

impl AddressList {
    pub fn new(entries: Vec<CandidateEndpoint>) -> Self {
        Self {
            entries: entries.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CandidateEndpoint> {
        self.entries.get(index)
    }

    pub fn first(&self) -> Option<&CandidateEndpoint> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateEndpoint> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CandidateEndpoint] {
        &self.entries
    }

    /// Concatenated [`CandidateEndpoint::dump`] of every entry, in order.
    pub fn dump(&self) -> String {
        self.entries.iter().map(CandidateEndpoint::dump).collect()
    }
}

impl Index<usize> for AddressList {
    type Output = CandidateEndpoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl From<Vec<CandidateEndpoint>> for AddressList {
    fn from(entries: Vec<CandidateEndpoint>) -> Self {
        AddressList::new(entries)
    }
}

impl FromIterator<CandidateEndpoint> for AddressList {
    fn from_iter<I: IntoIterator<Item = CandidateEndpoint>>(iter: I) -> Self {
        AddressList::new(iter.into_iter().collect())
    }
}

impl FromIterator<SocketAddr> for AddressList {
    fn from_iter<I: IntoIterator<Item = SocketAddr>>(iter: I) -> Self {
        iter.into_iter().map(CandidateEndpoint::new).collect()
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a CandidateEndpoint;
    type IntoIter = std::slice::Iter<'a, CandidateEndpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for AddressList {
    type Item = CandidateEndpoint;
    type IntoIter = std::vec::IntoIter<CandidateEndpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_vec().into_iter()
    }
}
