//! Per-connection reader task.
//!
//! Each accepted socket is owned end-to-end by exactly one reader task:
//! the handshake read, the relay loop, and termination. The wire carries
//! no framing, so the first chunk read from the socket is taken in its
//! entirety as the peer's display name. If the peer's first write
//! coalesces the name with an initial message into one TCP segment, the
//! two arrive indistinguishably concatenated — that is the wire
//! contract, not a defect in the reader. Likewise a message longer than
//! [`READ_CHUNK_SIZE`] bytes is delivered as multiple messages, one per
//! read.

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use crate::config::{CLOSE_SENTINEL, READ_CHUNK_SIZE};
use crate::event::{ChatEvent, Direction, DisconnectReason, EventSink};

use super::state::PeerState;

/// Outcome of one chunk read.
enum Chunk {
    /// Decoded text of one read.
    Text(String),
    /// Zero-length read: the peer closed its stream.
    Eof,
}

/// One accepted inbound connection, exclusively owned by its reader task.
struct PeerConnection<S> {
    /// Remote display name. Empty until the handshake read completes.
    display_name: String,
    state: PeerState,
    stream: S,
    addr: SocketAddr,
    events: EventSink,
    buf: BytesMut,
}

/// Spawn the reader task owning `stream`.
pub fn spawn_peer_reader(
    stream: TcpStream,
    addr: SocketAddr,
    events: EventSink,
) -> JoinHandle<()> {
    spawn_reader_task(stream, addr, events)
}

fn spawn_reader_task<S>(stream: S, addr: SocketAddr, events: EventSink) -> JoinHandle<()>
where
    S: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        PeerConnection::new(stream, addr, events).run().await;
    })
}

impl<S> PeerConnection<S>
where
    S: AsyncRead + Unpin,
{
    fn new(stream: S, addr: SocketAddr, events: EventSink) -> Self {
        Self {
            display_name: String::new(),
            state: PeerState::Handshaking,
            stream,
            addr,
            events,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    fn transition_to(&mut self, next: PeerState) {
        debug_assert!(self.state.can_advance_to(next));
        tracing::debug!(
            addr = %self.addr,
            from = %self.state,
            to = %next,
            "Peer state transition"
        );
        self.state = next;
    }

    /// Read the next chunk (at most [`READ_CHUNK_SIZE`] bytes) as UTF-8.
    async fn read_chunk(&mut self) -> Result<Chunk, DisconnectReason> {
        self.buf.clear();
        let n = self
            .stream
            .read_buf(&mut self.buf)
            .await
            .map_err(|e| DisconnectReason::Error(e.to_string()))?;

        if n == 0 {
            return Ok(Chunk::Eof);
        }

        match std::str::from_utf8(&self.buf[..n]) {
            Ok(text) => Ok(Chunk::Text(text.to_owned())),
            Err(e) => Err(DisconnectReason::Error(format!(
                "invalid UTF-8 from peer: {e}"
            ))),
        }
    }

    async fn run(mut self) {
        // Handshake: the entire first chunk is the display name.
        match self.read_chunk().await {
            Ok(Chunk::Text(name)) => {
                self.display_name = name;
                self.transition_to(PeerState::Open);
                tracing::info!(addr = %self.addr, name = %self.display_name, "Peer connected");
                self.events.emit(ChatEvent::PeerConnected {
                    display_name: self.display_name.clone(),
                });
            }
            Ok(Chunk::Eof) => {
                // Closed before identifying itself: one disconnect event,
                // no PeerConnected.
                self.finish(DisconnectReason::ConnectionReset);
                return;
            }
            Err(reason) => {
                self.finish(reason);
                return;
            }
        }

        // Relay loop: one event per read until the sentinel, a reset, or
        // an error ends the session.
        loop {
            match self.read_chunk().await {
                Ok(Chunk::Text(body)) if body == CLOSE_SENTINEL => {
                    self.finish(DisconnectReason::PeerClosed);
                    return;
                }
                Ok(Chunk::Text(body)) => {
                    self.events.emit(ChatEvent::MessageReceived {
                        sender: self.display_name.clone(),
                        body,
                        direction: Direction::Inbound,
                    });
                }
                Ok(Chunk::Eof) => {
                    self.finish(DisconnectReason::ConnectionReset);
                    return;
                }
                Err(reason) => {
                    self.finish(reason);
                    return;
                }
            }
        }
    }

    /// Emit the single disconnect event for this session and reach the
    /// terminal state. The socket is released when the task returns.
    fn finish(&mut self, reason: DisconnectReason) {
        self.transition_to(PeerState::Closing);
        tracing::info!(
            addr = %self.addr,
            name = %self.display_name,
            reason = %reason,
            "Peer disconnected"
        );
        self.events.emit(ChatEvent::PeerDisconnected {
            display_name: self.display_name.clone(),
            reason,
        });
        self.transition_to(PeerState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::{timeout, Duration};

    fn test_addr() -> SocketAddr {
        "127.0.0.1:7341".parse().unwrap()
    }

    async fn next_event(rx: &mut UnboundedReceiver<ChatEvent>) -> ChatEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_handshake_then_message() {
        let (mut remote, local) = tokio::io::duplex(4096);
        let (events, mut rx) = EventSink::channel();
        spawn_reader_task(local, test_addr(), events);

        remote.write_all(b"Alice").await.unwrap();
        assert_eq!(
            next_event(&mut rx).await,
            ChatEvent::PeerConnected {
                display_name: "Alice".to_string()
            }
        );

        remote.write_all(b"hello there").await.unwrap();
        assert_eq!(
            next_event(&mut rx).await,
            ChatEvent::MessageReceived {
                sender: "Alice".to_string(),
                body: "hello there".to_string(),
                direction: Direction::Inbound,
            }
        );
    }

    #[tokio::test]
    async fn test_sentinel_terminates_session() {
        let (mut remote, local) = tokio::io::duplex(4096);
        let (events, mut rx) = EventSink::channel();
        let handle = spawn_reader_task(local, test_addr(), events);

        remote.write_all(b"Bob").await.unwrap();
        next_event(&mut rx).await;

        remote.write_all(CLOSE_SENTINEL.as_bytes()).await.unwrap();
        assert_eq!(
            next_event(&mut rx).await,
            ChatEvent::PeerDisconnected {
                display_name: "Bob".to_string(),
                reason: DisconnectReason::PeerClosed,
            }
        );

        // The reader task must have released the socket and exited.
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_near_miss_sentinel_is_a_message() {
        let (mut remote, local) = tokio::io::duplex(4096);
        let (events, mut rx) = EventSink::channel();
        spawn_reader_task(local, test_addr(), events);

        remote.write_all(b"Bob").await.unwrap();
        next_event(&mut rx).await;

        for near_miss in ["close connection", "Close Connection ", "Close  Connection"] {
            remote.write_all(near_miss.as_bytes()).await.unwrap();
            assert_eq!(
                next_event(&mut rx).await,
                ChatEvent::MessageReceived {
                    sender: "Bob".to_string(),
                    body: near_miss.to_string(),
                    direction: Direction::Inbound,
                }
            );
        }
    }

    #[tokio::test]
    async fn test_reset_without_sentinel() {
        let (mut remote, local) = tokio::io::duplex(4096);
        let (events, mut rx) = EventSink::channel();
        spawn_reader_task(local, test_addr(), events);

        remote.write_all(b"Carol").await.unwrap();
        next_event(&mut rx).await;

        drop(remote);
        assert_eq!(
            next_event(&mut rx).await,
            ChatEvent::PeerDisconnected {
                display_name: "Carol".to_string(),
                reason: DisconnectReason::ConnectionReset,
            }
        );

        // Exactly one disconnect event, nothing after it.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_during_handshake() {
        let (remote, local) = tokio::io::duplex(4096);
        let (events, mut rx) = EventSink::channel();
        spawn_reader_task(local, test_addr(), events);

        drop(remote);
        assert_eq!(
            next_event(&mut rx).await,
            ChatEvent::PeerDisconnected {
                display_name: String::new(),
                reason: DisconnectReason::ConnectionReset,
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_ends_session() {
        let (mut remote, local) = tokio::io::duplex(4096);
        let (events, mut rx) = EventSink::channel();
        spawn_reader_task(local, test_addr(), events);

        remote.write_all(b"Dave").await.unwrap();
        next_event(&mut rx).await;

        remote.write_all(&[0xff, 0xfe, 0xfd]).await.unwrap();
        match next_event(&mut rx).await {
            ChatEvent::PeerDisconnected {
                display_name,
                reason: DisconnectReason::Error(_),
            } => assert_eq!(display_name, "Dave"),
            other => panic!("unexpected event: {other}"),
        }
    }
}
