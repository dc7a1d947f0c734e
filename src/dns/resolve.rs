//! Core DNS resolution types and traits.
//!
//! This module defines the `Resolve` trait and supporting types that form
//! the foundation of the name resolution layer.

use super::endpoint::{AddressFamily, AddressList, CandidateEndpoint, SocketType};
use super::gai::service_port;
use crate::base::neterror::ResolutionError;
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

/// A host name (or literal IP address) to resolve.
///
/// This is a lightweight wrapper around a hostname string that provides
/// a type-safe way to pass domain names to resolvers.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// A port number ("80") or a well-known service name ("http").
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Service {
    name: Box<str>,
}

impl Service {
    #[inline]
    pub fn new(name: impl Into<Box<str>>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The port, if the service is numeric.
    pub fn port(&self) -> Option<u16> {
        self.name.parse().ok()
    }
}

impl From<&str> for Service {
    fn from(value: &str) -> Self {
        Service::new(value)
    }
}

impl From<u16> for Service {
    fn from(port: u16) -> Self {
        Service::new(port.to_string())
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.name, f)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

/// Constraints passed to the resolver alongside the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hints {
    /// `None` asks for any address family.
    pub family: Option<AddressFamily>,
    pub socket_type: SocketType,
    /// Ask the resolver to report the canonical host name.
    pub canonical_name: bool,
}

impl Hints {
    /// Returns true if `addr` satisfies the family constraint.
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        self.family.map_or(true, |f| f == AddressFamily::of(addr))
    }
}

/// One resolution request.
#[derive(Debug, Clone)]
pub struct Query {
    pub name: Name,
    pub service: Service,
    pub hints: Hints,
    /// Absolute instant after which the resolver should give up.
    pub deadline: Option<Instant>,
}

impl Query {
    pub fn new(name: impl Into<Name>, service: impl Into<Service>) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            hints: Hints::default(),
            deadline: None,
        }
    }

    pub fn with_hints(mut self, hints: Hints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Time left before the deadline; `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Shorthand for a [`ResolutionError`] about this query.
    pub fn error(&self, detail: impl Into<String>) -> ResolutionError {
        ResolutionError::new(self.name.as_str(), self.service.as_str(), detail)
    }
}

/// Trait for name resolution.
///
/// Implementations translate a host/service pair into an ordered list of
/// candidate endpoints. The call blocks until the list is complete; the
/// list is handed over wholesale and owned by the caller.
///
/// # Design Notes
///
/// - Uses `&self` so one resolver can serve concurrent callers.
/// - An empty list without an error is allowed here; the connector treats it
///   as a resolution failure.
/// - Native resolver state (e.g. a `getaddrinfo` list) must be released
///   before `resolve` returns.
pub trait Resolve: Send + Sync {
    /// Resolves `query` into candidate endpoints, in preference order.
    fn resolve(&self, query: &Query) -> Result<AddressList, ResolutionError>;
}

/// Blanket implementation for Arc-wrapped resolvers.
impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, query: &Query) -> Result<AddressList, ResolutionError> {
        (**self).resolve(query)
    }
}

impl<R: Resolve + ?Sized> Resolve for &R {
    fn resolve(&self, query: &Query) -> Result<AddressList, ResolutionError> {
        (**self).resolve(query)
    }
}

/// Resolver wrapper that supports hostname overrides.
///
/// This resolver first checks a map of hostname-to-address overrides before
/// falling back to the underlying resolver. Useful for:
/// - Testing without real DNS
/// - Forcing specific IPs for certain hosts
/// - Local development with custom hostnames
///
/// Ports follow the query's service:
/// - a numeric service replaces every stored port;
/// - a named service ("http") keeps stored non-zero ports, and fills port 0
///   with the port the system services database registers for the name;
/// - a named service the system does not know fails with a
///   [`ResolutionError`] when any stored port is 0.
///
/// # Example
///
/// ```rust,ignore
/// use dialnet::dns::{DnsResolverWithOverrides, GaiResolver};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let mut overrides = HashMap::new();
/// overrides.insert(
///     "api.local".into(),
///     vec!["127.0.0.1:8080".parse().unwrap()],
/// );
///
/// let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()), overrides);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: Arc<HashMap<Cow<'static, str>, Vec<SocketAddr>>>,
}

impl DnsResolverWithOverrides {
    /// Creates a new resolver with the given overrides.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fallback resolver for non-overridden hostnames.
    /// * `overrides` - Map of hostnames to their resolved addresses.
    pub fn new(
        inner: Arc<dyn Resolve>,
        overrides: HashMap<Cow<'static, str>, Vec<SocketAddr>>,
    ) -> Self {
        Self {
            inner,
            overrides: Arc::new(overrides),
        }
    }

    /// Returns the number of configured overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, query: &Query) -> Result<AddressList, ResolutionError> {
        let Some(addrs) = self.overrides.get(query.name.as_str()) else {
            return self.inner.resolve(query);
        };

        let numeric = query.service.port();
        let named = if numeric.is_none() && addrs.iter().any(|addr| addr.port() == 0) {
            let port = service_port(&query.service)
                .ok_or_else(|| query.error("unknown service for port-less override"))?;
            Some(port)
        } else {
            None
        };

        let list: AddressList = addrs
            .iter()
            .filter(|addr| query.hints.accepts(addr))
            .map(|addr| {
                let mut addr = *addr;
                match (numeric, named) {
                    (Some(port), _) => addr.set_port(port),
                    (None, Some(port)) if addr.port() == 0 => addr.set_port(port),
                    _ => {}
                }
                CandidateEndpoint::new(addr).with_socket_type(query.hints.socket_type)
            })
            .collect();

        tracing::debug!(host = %query.name, count = list.len(), "resolved from overrides");
        Ok(list)
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_name_from_str() {
        let name = Name::from("example.com");
        assert_eq!(name.as_str(), "example.com");
        assert_eq!(name.to_string(), "example.com");
    }

    #[test]
    fn test_name_equality() {
        let name1 = Name::new("example.com");
        let name2 = Name::new("example.com");
        let name3 = Name::new("other.com");

        assert_eq!(name1, name2);
        assert_ne!(name1, name3);
    }

    #[test]
    fn test_service_port() {
        assert_eq!(Service::from("8080").port(), Some(8080));
        assert_eq!(Service::from(443u16).as_str(), "443");
        assert_eq!(Service::from("http").port(), None);
    }

    #[test]
    fn test_hints_accepts() {
        let v4: SocketAddr = "127.0.0.1:80".parse().unwrap();
        let v6: SocketAddr = "[::1]:80".parse().unwrap();

        let any = Hints::default();
        assert!(any.accepts(&v4) && any.accepts(&v6));

        let only_v6 = Hints {
            family: Some(AddressFamily::Ipv6),
            ..Hints::default()
        };
        assert!(!only_v6.accepts(&v4));
        assert!(only_v6.accepts(&v6));
    }

    #[test]
    fn test_query_remaining() {
        let query = Query::new("example.com", "http");
        assert_eq!(query.remaining(), None);

        let expired = query.with_deadline(Some(Instant::now()));
        assert_eq!(expired.remaining(), Some(Duration::ZERO));
    }

    struct MockResolver {
        response: Vec<SocketAddr>,
    }

    impl Resolve for MockResolver {
        fn resolve(&self, _query: &Query) -> Result<AddressList, ResolutionError> {
            Ok(self.response.iter().copied().collect())
        }
    }

    fn resolver_with(host: &'static str, addrs: Vec<SocketAddr>) -> DnsResolverWithOverrides {
        let mock = Arc::new(MockResolver {
            response: vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53)],
        });
        let mut overrides = HashMap::new();
        overrides.insert(Cow::Borrowed(host), addrs);
        DnsResolverWithOverrides::new(mock, overrides)
    }

    #[test]
    fn test_override_resolver_hit() {
        let resolver = resolver_with(
            "override.local",
            vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)],
        );

        let list = resolver
            .resolve(&Query::new("override.local", "8080"))
            .unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].address(), "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn test_override_resolver_keeps_port_for_named_service() {
        let resolver = resolver_with("override.local", vec!["127.0.0.1:8443".parse().unwrap()]);

        let list = resolver.resolve(&Query::new("override.local", "https")).unwrap();
        assert_eq!(list[0].address().port(), 8443);
    }

    #[test]
    fn test_override_resolver_filters_family() {
        let resolver = resolver_with(
            "dual.local",
            vec![
                SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 80),
                SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 80),
            ],
        );
        let hints = Hints {
            family: Some(AddressFamily::Ipv6),
            ..Hints::default()
        };

        let list = resolver
            .resolve(&Query::new("dual.local", "80").with_hints(hints))
            .unwrap();

        assert_eq!(list.len(), 1);
        assert!(list[0].address().is_ipv6());
    }

    #[test]
    fn test_override_resolver_miss() {
        let resolver = resolver_with("override.local", vec![]);

        let list = resolver
            .resolve(&Query::new("not-overridden.com", "53"))
            .unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].address().ip(), IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn test_override_resolver_named_service_fills_port_zero() {
        let resolver = resolver_with(
            "override.local",
            vec![
                "127.0.0.1:0".parse().unwrap(),
                "127.0.0.2:8080".parse().unwrap(),
            ],
        );

        // The services database may be missing in minimal environments.
        match resolver.resolve(&Query::new("override.local", "http")) {
            Ok(list) => {
                assert_eq!(list[0].address(), "127.0.0.1:80".parse().unwrap());
                assert_eq!(list[1].address(), "127.0.0.2:8080".parse().unwrap());
            }
            Err(e) => assert_eq!(e.host(), "override.local"),
        }
    }

    #[test]
    fn test_override_resolver_unknown_service_with_port_zero() {
        let resolver = resolver_with("override.local", vec!["127.0.0.1:0".parse().unwrap()]);

        let err = resolver
            .resolve(&Query::new("override.local", "no-such-service-xyz"))
            .unwrap_err();
        assert_eq!(err.service(), "no-such-service-xyz");
        assert_eq!(err.detail(), "unknown service for port-less override");
    }
}
