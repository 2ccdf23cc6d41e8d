//! Inbound connection listener.

use std::net::{IpAddr, SocketAddr, UdpSocket};

use tokio::net::TcpListener;

use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};
use crate::event::{ChatEvent, EventSink};
use crate::peer::spawn_peer_reader;

/// Listener accepting inbound chat connections on the well-known port.
pub struct ChatListener {
    listener: TcpListener,
    events: EventSink,
}

impl ChatListener {
    /// Bind the listener.
    ///
    /// A bind failure (port in use, permission denied) is fatal to the
    /// listening role and is not retried.
    pub async fn bind(config: &ChatConfig, events: EventSink) -> ChatResult<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| ChatError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        tracing::info!(addr = %config.bind_addr, "Listening for inbound connections");

        Ok(Self { listener, events })
    }

    /// Get the local address we're listening on.
    pub fn local_addr(&self) -> ChatResult<SocketAddr> {
        self.listener.local_addr().map_err(ChatError::Io)
    }
}

/// Best-effort primary non-loopback IP of this machine.
///
/// Connects a UDP socket toward a public address to learn the preferred
/// source IP; no packet is sent. Failure is cosmetic, not fatal.
pub fn advertised_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

/// Run the accept loop.
///
/// Every accepted socket gets its own reader task for its entire
/// lifetime and the loop immediately resumes accepting. There is no
/// connection limit and no shutdown path; the loop ends only with the
/// process. Accept errors are logged and the loop keeps going.
pub async fn run_listener(listener: ChatListener) {
    match listener.local_addr() {
        Ok(addr) => {
            let local_ip = advertised_ip().unwrap_or_else(|| {
                tracing::warn!("Could not resolve a non-loopback address");
                addr.ip()
            });
            listener.events.emit(ChatEvent::ListenerReady {
                local_ip,
                local_port: addr.port(),
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not read bound address");
        }
    }

    loop {
        match listener.listener.accept().await {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::warn!(addr = %addr, error = %e, "Failed to set TCP_NODELAY");
                }

                tracing::debug!(addr = %addr, "Accepted inbound connection");
                spawn_peer_reader(stream, addr, listener.events.clone());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error accepting connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_port_zero() {
        let config = ChatConfig::new("127.0.0.1:0".parse().unwrap());
        let (events, _rx) = EventSink::channel();

        let listener = ChatListener::bind(&config, events).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let config = ChatConfig::new("127.0.0.1:0".parse().unwrap());
        let (events, _rx) = EventSink::channel();
        let first = ChatListener::bind(&config, events.clone()).await.unwrap();
        let taken = first.local_addr().unwrap();

        let conflict = ChatConfig::new(taken);
        let result = ChatListener::bind(&conflict, events).await;
        assert!(matches!(result, Err(ChatError::Bind { addr, .. }) if addr == taken));
    }
}
