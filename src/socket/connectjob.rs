use crate::base::context::IoResultExt;
use crate::base::loadstate::ConnectState;
use crate::base::neterror::{
    AttemptFailure, ConnectError, ConnectionError, FailureReason, ResolutionError,
};
use crate::dns::{AddressList, CandidateEndpoint, GaiResolver, Hints, Query, Resolve};
use crate::socket::options::ConnectOptions;
use crate::socket::stream::Connection;
use crate::socket::transport::{TcpTransport, Transport};
use std::time::{Duration, Instant};

/// Result of one connect call: a single open connection, or why there is none.
pub type ConnectOutcome<S> = Result<Connection<S>, ConnectError>;

/// Manages the connection process: resolve -> try each candidate in order.
///
/// Attempts are strictly sequential and the first success wins; remaining
/// candidates are never tried. Every socket opened for a failed candidate is
/// closed before the next attempt starts, and the candidate list is dropped
/// before [`connect`](ConnectJob::connect) returns.
pub struct ConnectJob<R, T = TcpTransport> {
    resolver: R,
    transport: T,
    options: ConnectOptions,
    state: ConnectState,
}

impl ConnectJob<GaiResolver> {
    /// System resolver, TCP transport, default options.
    pub fn system() -> Self {
        ConnectJob::new(GaiResolver::new())
    }
}

impl<R: Resolve> ConnectJob<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_options(resolver, ConnectOptions::default())
    }

    /// TCP transport configured from `options`.
    pub fn with_options(resolver: R, options: ConnectOptions) -> Self {
        let transport = TcpTransport::from(&options);
        Self::with_transport(resolver, transport, options)
    }
}

impl<R: Resolve, T: Transport> ConnectJob<R, T> {
    pub fn with_transport(resolver: R, transport: T, options: ConnectOptions) -> Self {
        Self {
            resolver,
            transport,
            options,
            state: ConnectState::Idle,
        }
    }

    pub fn state(&self) -> ConnectState {
        self.state
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Resolve `host`/`service` and connect to the first reachable candidate.
    ///
    /// Fails with [`ConnectError::Resolution`] if resolution fails or yields
    /// nothing (no connection is attempted), or with
    /// [`ConnectError::Connection`] carrying the last candidate's failure when
    /// every candidate failed.
    pub fn connect(&mut self, host: &str, service: &str) -> ConnectOutcome<T::Socket> {
        let deadline = self.options.deadline_from(Instant::now());

        self.transition(ConnectState::Resolving);
        let candidates = match self.resolve(host, service, deadline) {
            Ok(candidates) => candidates,
            Err(e) => {
                self.transition(ConnectState::Failed);
                return Err(e.into());
            }
        };

        let outcome = self.attempt_all(&candidates, deadline);
        drop(candidates);

        match &outcome {
            Ok(conn) => {
                tracing::debug!(host, service, address = %conn.endpoint().address(), "connected");
                self.transition(ConnectState::Connected);
            }
            Err(e) => {
                tracing::debug!(host, service, error = %e, "connect failed");
                self.transition(ConnectState::Failed);
            }
        }
        outcome
    }

    fn resolve(
        &self,
        host: &str,
        service: &str,
        deadline: Option<Instant>,
    ) -> Result<AddressList, ResolutionError> {
        if host.is_empty() {
            return Err(ResolutionError::new(host, service, "empty host name"));
        }

        let hints = Hints {
            family: self.options.family,
            ..Hints::default()
        };
        let query = Query::new(host, service)
            .with_hints(hints)
            .with_deadline(deadline);

        tracing::debug!(host, service, "resolving");
        let candidates = self.resolver.resolve(&query)?;
        if candidates.is_empty() {
            return Err(query.error("no candidate addresses"));
        }

        tracing::debug!(host, service, count = candidates.len(), "resolved");
        Ok(candidates)
    }

    fn attempt_all(
        &mut self,
        candidates: &AddressList,
        deadline: Option<Instant>,
    ) -> ConnectOutcome<T::Socket> {
        let mut earlier = Vec::new();
        let mut last: Option<AttemptFailure> = None;

        for (index, endpoint) in candidates.iter().enumerate() {
            self.transition(ConnectState::Attempting(index));

            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if remaining.is_some_and(|left| left.is_zero()) {
                tracing::debug!(index, address = %endpoint.address(), "deadline exceeded, stopping");
                earlier.extend(last.replace(AttemptFailure::deadline_exceeded(endpoint.clone())));
                break;
            }

            match self.attempt(endpoint, self.options.attempt_budget(remaining)) {
                Ok(socket) => return Ok(Connection::new(socket, endpoint.clone())),
                Err(failure) => {
                    tracing::debug!(
                        index,
                        address = %endpoint.address(),
                        reason = %failure.reason(),
                        error = %failure.detail(),
                        "candidate failed"
                    );
                    earlier.extend(last.replace(failure));
                }
            }
        }

        match last {
            Some(last) => Err(ConnectionError::new(last, earlier).into()),
            // Unreachable while `resolve` rejects empty lists.
            None => Err(ResolutionError::new("", "", "no candidate addresses").into()),
        }
    }

    /// One candidate. A socket dropped on an early return is closed.
    fn attempt(
        &self,
        endpoint: &CandidateEndpoint,
        timeout: Option<Duration>,
    ) -> Result<T::Socket, AttemptFailure> {
        let socket = self
            .transport
            .open(endpoint)
            .attempt_context(FailureReason::CannotCreateSocket, endpoint)?;
        self.transport
            .connect(&socket, endpoint, timeout)
            .attempt_context(FailureReason::CannotConnect, endpoint)?;
        self.transport
            .configure(&socket)
            .attempt_context(FailureReason::CannotConfigure, endpoint)?;
        Ok(socket)
    }

    fn transition(&mut self, next: ConnectState) {
        tracing::trace!(from = %self.state, to = %next, "connect state");
        self.state = next;
    }
}

/// Runs a blocking [`ConnectJob`] with the system resolver on tokio's
/// blocking pool and hands back a tokio `TcpStream`.
///
/// `options.nonblocking` is forced on, as tokio requires.
///
/// If the blocking task panics or is cancelled the error is a
/// [`ConnectError::Resolution`] whose detail starts with
/// `"connect task failed"`, whether or not resolution had already finished.
/// No candidate is known at that point, so there is no attempt to report.
pub async fn connect_async(
    host: &str,
    service: &str,
    options: ConnectOptions,
) -> Result<tokio::net::TcpStream, ConnectError> {
    let options = options.nonblocking(true);
    let (owned_host, owned_service) = (host.to_string(), service.to_string());

    let joined = tokio::task::spawn_blocking(move || {
        let mut job = ConnectJob::with_options(GaiResolver::new(), options);
        job.connect(&owned_host, &owned_service)
            .map(|conn| (conn.endpoint().clone(), conn.into_tcp_stream()))
    })
    .await;

    let (endpoint, stream) = joined.map_err(|e| join_failure(host, service, &e))??;

    tokio::net::TcpStream::from_std(stream).map_err(|e| {
        let failure = AttemptFailure::new(endpoint, FailureReason::CannotConfigure, &e);
        ConnectionError::new(failure, Vec::new()).into()
    })
}

fn join_failure(host: &str, service: &str, error: &tokio::task::JoinError) -> ConnectError {
    tracing::error!(host, service, error = %error, "connect task failed");
    ResolutionError::new(host, service, format!("connect task failed: {}", error)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_connect_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        let mut job = ConnectJob::system();
        assert_eq!(job.state(), ConnectState::Idle);

        let conn = job.connect("127.0.0.1", &port).unwrap();
        assert_eq!(job.state(), ConnectState::Connected);
        assert_eq!(conn.peer_addr().unwrap(), listener.local_addr().unwrap());
        assert!(conn.get_ref().nodelay().unwrap());
    }

    #[test]
    fn test_empty_host_is_resolution_error() {
        let mut job = ConnectJob::system();
        let err = job.connect("", "80").unwrap_err();

        assert!(err.is_resolution());
        assert_eq!(job.state(), ConnectState::Failed);
    }

    #[test]
    fn test_refused_is_connection_error() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

        let mut job = ConnectJob::system();
        let err = job.connect("127.0.0.1", &addr.port().to_string()).unwrap_err();

        match err {
            ConnectError::Connection(e) => {
                assert_eq!(e.reason(), FailureReason::CannotConnect);
                assert_eq!(e.last().endpoint().address(), addr);
            }
            other => panic!("Expected Connection error, got {:?}", other),
        }
    }

    #[test]
    fn test_unrepresentable_total_timeout_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        let options = ConnectOptions::new().total_timeout(Duration::MAX);
        let mut job = ConnectJob::with_options(GaiResolver::new(), options);

        assert!(job.connect("127.0.0.1", &port).is_ok());
        assert_eq!(job.state(), ConnectState::Connected);
    }

    #[tokio::test]
    async fn test_join_failure_is_reported() {
        let join_error = tokio::task::spawn_blocking(|| panic!("worker died"))
            .await
            .unwrap_err();

        let err = join_failure("example.test", "http", &join_error);
        match err {
            ConnectError::Resolution(e) => {
                assert_eq!(e.host(), "example.test");
                assert_eq!(e.service(), "http");
                assert!(e.detail().starts_with("connect task failed"));
            }
            other => panic!("Expected Resolution error, got {:?}", other),
        }
    }
}
