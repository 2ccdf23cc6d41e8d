//! Delivery events and the cross-task event sink.

use std::fmt;
use std::net::IpAddr;

use tokio::sync::mpsc;

/// Direction of a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from a remote peer.
    Inbound,
    /// Sent by the local user (echoed so the consumer can render it
    /// immediately, independent of any round trip).
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The remote peer sent the close sentinel.
    PeerClosed,
    /// The remote peer closed its TCP stream without the sentinel.
    ConnectionReset,
    /// The local side closed the session.
    LocalClosed,
    /// The session died from an I/O or decoding error.
    Error(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::PeerClosed => write!(f, "peer closed"),
            DisconnectReason::ConnectionReset => write!(f, "connection reset"),
            DisconnectReason::LocalClosed => write!(f, "local close"),
            DisconnectReason::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// Event delivered from socket-owning tasks to the single consumer.
///
/// Events from one connection's task arrive in the order they were
/// generated on that task; no ordering is guaranteed across independent
/// connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The listener is bound and accepting connections.
    ListenerReady {
        /// Best-effort primary non-loopback address of this machine.
        local_ip: IpAddr,
        local_port: u16,
    },
    /// An inbound peer completed its handshake.
    PeerConnected { display_name: String },
    /// A chat message was delivered, or a locally sent one echoed.
    MessageReceived {
        sender: String,
        body: String,
        direction: Direction,
    },
    /// A session ended. Emitted exactly once per session.
    PeerDisconnected {
        display_name: String,
        reason: DisconnectReason,
    },
}

impl fmt::Display for ChatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatEvent::ListenerReady { local_ip, local_port } => {
                write!(f, "ListenerReady({}:{})", local_ip, local_port)
            }
            ChatEvent::PeerConnected { display_name } => {
                write!(f, "PeerConnected({})", display_name)
            }
            ChatEvent::MessageReceived { sender, body, direction } => {
                write!(f, "MessageReceived({}, {} bytes, {})", sender, body.len(), direction)
            }
            ChatEvent::PeerDisconnected { display_name, reason } => {
                write!(f, "PeerDisconnected({}, {})", display_name, reason)
            }
        }
    }
}

/// Ordered multi-producer, single-consumer delivery channel.
///
/// The channel is unbounded: producers never block and no event is
/// silently dropped under load. One clone lives in each socket-owning
/// task; the consumer drains the receiver on its own schedule.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ChatEvent>,
}

impl EventSink {
    /// Create a sink together with its consumer half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver an event to the consumer.
    ///
    /// A vanished consumer is not an error for the socket tasks; the
    /// event is logged and discarded.
    pub fn emit(&self, event: ChatEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::warn!(event = %err.0, "Event consumer gone, discarding event");
        }
    }
}
