//! Outbound session management.
//!
//! A process dials at most one remote listener at a time. The single
//! [`OutgoingSession`] lives behind an async mutex inside the
//! [`Connector`]; the lock doubles as the per-session write serializer
//! (a socket's writes must not interleave) and as the
//! one-open-session-per-process guard.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::{ChatConfig, CLOSE_SENTINEL};
use crate::error::{ChatError, ChatResult};
use crate::event::{ChatEvent, Direction, DisconnectReason, EventSink};

/// State of the outgoing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// TCP connect in progress.
    Connecting,
    /// Connected, writing the display name.
    Handshaking,
    /// Handshake written, messages may be sent.
    Open,
    /// Session torn down. Terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Handshaking => write!(f, "handshaking"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// One dialed outbound socket.
struct OutgoingSession {
    /// Local display name, sent verbatim as the handshake.
    display_name: String,
    /// Address of the remote listener.
    target: SocketAddr,
    state: SessionState,
    stream: TcpStream,
}

/// Owner of the process's single outbound session.
pub struct Connector {
    session: Mutex<Option<OutgoingSession>>,
    connect_timeout: Duration,
    events: EventSink,
}

impl Connector {
    /// Create a connector with no session.
    pub fn new(config: &ChatConfig, events: EventSink) -> Self {
        Self {
            session: Mutex::new(None),
            connect_timeout: config.connect_timeout,
            events,
        }
    }

    /// Dial `host:port` and perform the outbound handshake.
    ///
    /// The handshake is a single raw write of `display_name`; no
    /// acknowledgment is read back. Fails without retrying if the
    /// connect does not complete within the configured timeout, and
    /// fails with [`ChatError::SessionAlreadyOpen`] while a session is
    /// open. Returns the resolved remote address.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        display_name: &str,
    ) -> ChatResult<SocketAddr> {
        if display_name.is_empty() {
            return Err(ChatError::EmptyDisplayName);
        }

        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref() {
            return Err(ChatError::SessionAlreadyOpen {
                addr: session.target,
            });
        }

        let target = lookup_host((host, port))
            .await
            .map_err(ChatError::Io)?
            .next()
            .ok_or_else(|| ChatError::InvalidAddress(format!("{host}:{port}")))?;

        tracing::debug!(addr = %target, "Connecting to peer");
        let stream = match timeout(self.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ChatError::Io(e)),
            Err(_) => return Err(ChatError::ConnectTimeout { addr: target }),
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(addr = %target, error = %e, "Failed to set TCP_NODELAY");
        }

        let mut session = OutgoingSession {
            display_name: display_name.to_owned(),
            target,
            state: SessionState::Handshaking,
            stream,
        };

        session
            .stream
            .write_all(display_name.as_bytes())
            .await
            .map_err(ChatError::Io)?;
        session.state = SessionState::Open;
        tracing::info!(addr = %target, name = %display_name, "Outgoing session open");

        *slot = Some(session);
        Ok(target)
    }

    /// Send one message on the open session.
    ///
    /// The whole UTF-8 body is written in one call, and a local echo
    /// event tagged [`Direction::Outbound`] is emitted so the consumer
    /// can render the sent message immediately. Calling without an open
    /// session is a contract violation. A write failure ends the
    /// session and emits its disconnect event.
    pub async fn send(&self, text: &str) -> ChatResult<()> {
        let mut slot = self.session.lock().await;
        let session = match slot.as_mut() {
            Some(s) if s.state == SessionState::Open => s,
            Some(s) => {
                return Err(ChatError::SessionNotOpen { state: s.state });
            }
            None => {
                return Err(ChatError::SessionNotOpen {
                    state: SessionState::Closed,
                });
            }
        };

        if let Err(e) = session.stream.write_all(text.as_bytes()).await {
            tracing::warn!(addr = %session.target, error = %e, "Send failed, closing session");
            let display_name = session.display_name.clone();
            *slot = None;
            self.events.emit(ChatEvent::PeerDisconnected {
                display_name,
                reason: DisconnectReason::Error(e.to_string()),
            });
            return Err(ChatError::Io(e));
        }

        self.events.emit(ChatEvent::MessageReceived {
            sender: session.display_name.clone(),
            body: text.to_owned(),
            direction: Direction::Outbound,
        });
        Ok(())
    }

    /// Close the open session, announcing the close sentinel first.
    ///
    /// Single-use: the session is consumed, so a second call fails with
    /// [`ChatError::SessionNotOpen`]. The sentinel write is best-effort
    /// because the socket may already be gone; that failure is logged,
    /// not propagated.
    pub async fn disconnect(&self) -> ChatResult<()> {
        let mut slot = self.session.lock().await;
        let mut session = match slot.take() {
            Some(s) => s,
            None => {
                return Err(ChatError::SessionNotOpen {
                    state: SessionState::Closed,
                });
            }
        };

        if let Err(e) = session.stream.write_all(CLOSE_SENTINEL.as_bytes()).await {
            tracing::warn!(addr = %session.target, error = %e, "Failed to send close sentinel");
        }
        if let Err(e) = session.stream.shutdown().await {
            tracing::debug!(addr = %session.target, error = %e, "Socket shutdown failed");
        }
        session.state = SessionState::Closed;
        tracing::info!(addr = %session.target, "Outgoing session closed");

        self.events.emit(ChatEvent::PeerDisconnected {
            display_name: session.display_name,
            reason: DisconnectReason::LocalClosed,
        });
        Ok(())
    }

    /// Whether an outgoing session is currently open.
    pub async fn is_open(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.state == SessionState::Open)
            .unwrap_or(false)
    }
}
