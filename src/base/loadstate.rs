use std::fmt;

/// The current state of a connect job.
/// Transitions: `Idle -> Resolving -> Attempting(0..n) -> Connected | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectState {
    /// No connect call has started yet.
    #[default]
    Idle,

    /// Waiting for the resolver to produce candidates.
    Resolving,

    /// Trying the candidate at this index.
    Attempting(usize),

    /// A candidate connected; the handle was handed to the caller.
    Connected,

    /// Resolution failed or every candidate was exhausted.
    Failed,
}

impl ConnectState {
    /// Returns true once the job reached `Connected` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectState::Connected | ConnectState::Failed)
    }
}

impl fmt::Display for ConnectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectState::Idle => f.write_str("idle"),
            ConnectState::Resolving => f.write_str("resolving"),
            ConnectState::Attempting(index) => write!(f, "attempting({})", index),
            ConnectState::Connected => f.write_str("connected"),
            ConnectState::Failed => f.write_str("failed"),
        }
    }
}
