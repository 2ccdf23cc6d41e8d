//! Inbound session state machine.

use std::fmt;

/// State of one accepted connection.
///
/// Transitions are strictly forward (Handshaking → Open → Closing →
/// Closed), with no re-entry. A connection that dies during the
/// handshake skips Open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeerState {
    /// Socket accepted, awaiting the display-name read.
    #[default]
    Handshaking,
    /// Handshake complete, relaying messages.
    Open,
    /// Termination observed, emitting the disconnect event.
    Closing,
    /// Socket released. Terminal.
    Closed,
}

impl PeerState {
    /// Check if the connection is relaying messages.
    pub fn is_open(&self) -> bool {
        matches!(self, PeerState::Open)
    }

    /// Check if the connection has reached its terminal state.
    pub fn is_closed(&self) -> bool {
        matches!(self, PeerState::Closed)
    }

    /// Check whether `next` is a legal (strictly forward) transition.
    pub fn can_advance_to(&self, next: PeerState) -> bool {
        (*self as u8) < (next as u8)
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerState::Handshaking => write!(f, "handshaking"),
            PeerState::Open => write!(f, "open"),
            PeerState::Closing => write!(f, "closing"),
            PeerState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_checks() {
        assert!(!PeerState::Handshaking.is_open());
        assert!(PeerState::Open.is_open());
        assert!(!PeerState::Closing.is_open());
        assert!(PeerState::Closed.is_closed());
    }

    #[test]
    fn test_transitions_are_strictly_forward() {
        assert!(PeerState::Handshaking.can_advance_to(PeerState::Open));
        assert!(PeerState::Handshaking.can_advance_to(PeerState::Closing));
        assert!(PeerState::Open.can_advance_to(PeerState::Closing));
        assert!(PeerState::Closing.can_advance_to(PeerState::Closed));

        // No re-entry, no backwards movement.
        assert!(!PeerState::Open.can_advance_to(PeerState::Open));
        assert!(!PeerState::Open.can_advance_to(PeerState::Handshaking));
        assert!(!PeerState::Closed.can_advance_to(PeerState::Open));
    }
}
