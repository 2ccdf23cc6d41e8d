//! Chat endpoint orchestrator.

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ChatConfig;
use crate::connector::Connector;
use crate::error::ChatResult;
use crate::event::{ChatEvent, EventSink};
use crate::listener::{run_listener, ChatListener};

/// A peer-to-peer chat endpoint.
///
/// Composes the two independent socket roles around one event channel:
/// the listener spawns a reader task per inbound connection, and the
/// connector owns the single outbound session. The two roles are
/// symmetric and unaware of each other; this endpoint can be connected
/// to by one peer while connected out to a different one. The consumer
/// drains [`ChatEvent`]s from [`ChatNode::event_receiver`] and drives
/// the `connect`/`send`/`disconnect` operations.
pub struct ChatNode {
    config: ChatConfig,
    events: EventSink,
    event_rx: Option<mpsc::UnboundedReceiver<ChatEvent>>,
    connector: Connector,
}

impl ChatNode {
    /// Create a new chat endpoint.
    pub fn new(config: ChatConfig) -> Self {
        let (events, event_rx) = EventSink::channel();
        let connector = Connector::new(&config, events.clone());

        Self {
            config,
            events,
            event_rx: Some(event_rx),
            connector,
        }
    }

    /// Take the consumer half of the event channel.
    ///
    /// There is exactly one consumer; a second call returns `None`.
    pub fn event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<ChatEvent>> {
        self.event_rx.take()
    }

    /// Bind the listener and spawn its accept loop.
    ///
    /// Returns the bound address (useful when the config asked for port
    /// 0) and the accept-loop task handle. The loop has no shutdown
    /// path; it runs until the process exits. A bind failure is fatal
    /// to the listening role and surfaced here once.
    pub async fn start_listener(&self) -> ChatResult<(SocketAddr, JoinHandle<()>)> {
        let listener = ChatListener::bind(&self.config, self.events.clone()).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(run_listener(listener));
        Ok((addr, handle))
    }

    /// Dial a remote listener and open the outgoing session.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        display_name: &str,
    ) -> ChatResult<SocketAddr> {
        self.connector.connect(host, port, display_name).await
    }

    /// Send a message on the outgoing session.
    pub async fn send(&self, text: &str) -> ChatResult<()> {
        self.connector.send(text).await
    }

    /// Close the outgoing session.
    pub async fn disconnect(&self) -> ChatResult<()> {
        self.connector.disconnect().await
    }

    /// Whether the outgoing session is open.
    pub async fn is_connected(&self) -> bool {
        self.connector.is_open().await
    }

    /// The endpoint's configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_node_creation() {
        let mut node = ChatNode::new(ChatConfig::new("127.0.0.1:0".parse().unwrap()));

        assert!(node.event_receiver().is_some());
        assert!(node.event_receiver().is_none());
        assert!(!node.is_connected().await);
    }

    #[tokio::test]
    async fn test_start_listener_reports_bound_port() {
        let node = ChatNode::new(ChatConfig::new("127.0.0.1:0".parse().unwrap()));
        let (addr, _handle) = node.start_listener().await.unwrap();
        assert_ne!(addr.port(), 0);
    }
}
