//! System resolver using getaddrinfo.
//!
//! This resolver uses the operating system's native resolution via
//! `getaddrinfo`, so `/etc/hosts`, `/etc/services` and `resolv.conf` are all
//! respected and service names like "http" map to their well-known ports.
//!
//! # When to Use
//!
//! - When you need to respect system name service configuration
//! - When the service is given by name rather than by number

use super::endpoint::{AddressList, CandidateEndpoint};
use super::resolve::{Query, Resolve, Service};
use crate::base::neterror::ResolutionError;
use std::{
    net::{IpAddr, SocketAddr},
    sync::mpsc,
    thread,
};

/// System resolver backed by `getaddrinfo`.
///
/// The lookup runs on the calling thread. When the query carries a deadline
/// the lookup is moved to a helper thread and abandoned once the deadline
/// passes; the helper frees its result when `getaddrinfo` eventually returns.
///
/// Literal IP addresses with a numeric service skip the system call.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, query: &Query) -> Result<AddressList, ResolutionError> {
        if let Some(list) = literal_candidates(query) {
            tracing::debug!(host = %query.name, "literal address, skipping getaddrinfo");
            return Ok(list);
        }

        let Some(remaining) = query.remaining() else {
            return lookup(query);
        };
        if remaining.is_zero() {
            return Err(query.error("timed out before lookup started"));
        }

        let (tx, rx) = mpsc::channel();
        let owned = query.clone();
        thread::Builder::new()
            .name("dialnet-gai".into())
            .spawn(move || {
                let _ = tx.send(lookup(&owned));
            })
            .map_err(|e| {
                tracing::error!(error = %e, "failed to spawn resolver thread");
                query.error(format!("failed to spawn resolver thread: {}", e))
            })?;

        match rx.recv_timeout(remaining) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::debug!(host = %query.name, ?remaining, "resolution timed out");
                Err(query.error("timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!(host = %query.name, "resolver thread exited without a result");
                Err(query.error("resolver thread exited without a result"))
            }
        }
    }
}

/// Port the system registers for a named service (`/etc/services` on unix).
///
/// Uses a literal host, so no name server is contacted.
pub(crate) fn service_port(service: &Service) -> Option<u16> {
    if let Some(port) = service.port() {
        return Some(port);
    }
    let list = lookup(&Query::new("127.0.0.1", service.clone())).ok()?;
    list.first().map(|c| c.address().port())
}

/// Builds the candidate list directly when the host is a literal IP and the
/// service is a port number. Bracketed IPv6 literals (`[::1]`) are accepted.
///
/// Returns `None` if `getaddrinfo` is needed.
fn literal_candidates(query: &Query) -> Option<AddressList> {
    let port = query.service.port()?;
    let host = query.name.as_str();
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let ip: IpAddr = host.parse().ok()?;
    let addr = SocketAddr::new(ip, port);

    let endpoints = if query.hints.accepts(&addr) {
        vec![CandidateEndpoint::new(addr).with_socket_type(query.hints.socket_type)]
    } else {
        Vec::new()
    };
    Some(AddressList::new(endpoints))
}

#[cfg(unix)]
fn lookup(query: &Query) -> Result<AddressList, ResolutionError> {
    use std::ffi::CString;

    let host = CString::new(query.name.as_str())
        .map_err(|_| query.error("host contains an interior NUL byte"))?;
    let service = CString::new(query.service.as_str())
        .map_err(|_| query.error("service contains an interior NUL byte"))?;

    tracing::debug!(host = %query.name, service = %query.service, "resolving via getaddrinfo");
    let info = sys::AddrInfo::lookup(&host, &service, &query.hints).map_err(|detail| {
        tracing::debug!(host = %query.name, error = %detail, "getaddrinfo failed");
        query.error(detail)
    })?;
    let list = AddressList::new(info.candidates());
    drop(info);

    tracing::debug!(host = %query.name, count = list.len(), "resolution complete");
    Ok(list)
}

#[cfg(not(unix))]
fn lookup(query: &Query) -> Result<AddressList, ResolutionError> {
    use crate::base::context::IoResultExt;
    use std::net::ToSocketAddrs;

    let port = query
        .service
        .port()
        .ok_or_else(|| query.error("service names are only supported on unix"))?;
    let addrs = (query.name.as_str(), port)
        .to_socket_addrs()
        .resolution_context(query.name.as_str(), query.service.as_str())?;

    Ok(addrs
        .filter(|addr| query.hints.accepts(addr))
        .map(|addr| CandidateEndpoint::new(addr).with_socket_type(query.hints.socket_type))
        .collect())
}

#[cfg(unix)]
mod sys {
    use crate::dns::endpoint::{AddressFamily, CandidateEndpoint, Protocol, SocketType};
    use crate::dns::resolve::Hints;
    use std::{
        ffi::CStr,
        io, mem,
        net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6},
        ptr,
    };

    /// Owned `getaddrinfo` result list, released with `freeaddrinfo` on drop.
    pub(super) struct AddrInfo {
        head: *mut libc::addrinfo,
    }

    impl AddrInfo {
        pub(super) fn lookup(host: &CStr, service: &CStr, hints: &Hints) -> Result<Self, String> {
            // SAFETY: an all-zero addrinfo is the documented "no hints" value.
            let mut raw_hints: libc::addrinfo = unsafe { mem::zeroed() };
            raw_hints.ai_family = match hints.family {
                None => libc::AF_UNSPEC,
                Some(AddressFamily::Ipv4) => libc::AF_INET,
                Some(AddressFamily::Ipv6) => libc::AF_INET6,
            };
            raw_hints.ai_socktype = match hints.socket_type {
                SocketType::Stream => libc::SOCK_STREAM,
                SocketType::Other(raw) => raw,
            };
            if hints.canonical_name {
                raw_hints.ai_flags |= libc::AI_CANONNAME;
            }

            let mut head: *mut libc::addrinfo = ptr::null_mut();
            // SAFETY: host and service are valid NUL-terminated strings, hints
            // outlives the call, and head is only read on success.
            let rc = unsafe { libc::getaddrinfo(host.as_ptr(), service.as_ptr(), &raw_hints, &mut head) };
            if rc != 0 {
                return Err(describe(rc));
            }
            Ok(Self { head })
        }

        /// Copies every IPv4/IPv6 entry out of the list, preserving order.
        pub(super) fn candidates(&self) -> Vec<CandidateEndpoint> {
            let mut out = Vec::new();
            let mut cursor = self.head;
            while !cursor.is_null() {
                // SAFETY: cursor walks the list returned by getaddrinfo, which
                // stays alive until self is dropped.
                let info = unsafe { &*cursor };
                match unsafe { socket_addr(info) } {
                    Some(addr) => {
                        let mut endpoint = CandidateEndpoint::new(addr)
                            .with_socket_type(socket_type(info.ai_socktype))
                            .with_protocol(protocol(info.ai_protocol))
                            .with_flags(info.ai_flags);
                        if !info.ai_canonname.is_null() {
                            // SAFETY: ai_canonname is a NUL-terminated string owned by the list.
                            let name = unsafe { CStr::from_ptr(info.ai_canonname) };
                            endpoint = endpoint.with_canonical_name(name.to_string_lossy().into_owned());
                        }
                        out.push(endpoint);
                    }
                    None => {
                        tracing::debug!(
                            family = info.ai_family,
                            addrlen = info.ai_addrlen,
                            "skipping entry that is not an IPv4/IPv6 address"
                        );
                    }
                }
                cursor = info.ai_next;
            }
            out
        }
    }

    impl Drop for AddrInfo {
        fn drop(&mut self) {
            if !self.head.is_null() {
                // SAFETY: head came from a successful getaddrinfo and is freed once.
                unsafe { libc::freeaddrinfo(self.head) };
            }
        }
    }

    fn describe(rc: libc::c_int) -> String {
        if rc == libc::EAI_SYSTEM {
            return io::Error::last_os_error().to_string();
        }
        // SAFETY: gai_strerror returns a static NUL-terminated string.
        let msg = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) };
        msg.to_string_lossy().into_owned()
    }

    fn socket_type(raw: libc::c_int) -> SocketType {
        if raw == libc::SOCK_STREAM {
            SocketType::Stream
        } else {
            SocketType::Other(raw)
        }
    }

    fn protocol(raw: libc::c_int) -> Protocol {
        if raw == libc::IPPROTO_TCP {
            Protocol::Tcp
        } else {
            Protocol::Other(raw)
        }
    }

    /// # Safety
    /// `info.ai_addr` must be null or point to a sockaddr matching `ai_family`.
    unsafe fn socket_addr(info: &libc::addrinfo) -> Option<SocketAddr> {
        if info.ai_addr.is_null() {
            return None;
        }
        match info.ai_family {
            libc::AF_INET => {
                let sin = &*(info.ai_addr as *const libc::sockaddr_in);
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                Some(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(sin.sin_port))))
            }
            libc::AF_INET6 => {
                let sin6 = &*(info.ai_addr as *const libc::sockaddr_in6);
                let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                Some(SocketAddr::V6(SocketAddrV6::new(
                    ip,
                    u16::from_be(sin6.sin6_port),
                    sin6.sin6_flowinfo,
                    sin6.sin6_scope_id,
                )))
            }
            _ => None,
        }
    }
}
