//! Peer-to-peer text messaging transport.
//!
//! Each running endpoint simultaneously listens for inbound TCP
//! connections on a well-known port and can dial out to one remote
//! peer's listener. This crate is the connection-handling core only:
//! accepting connections, the display-name handshake, bidirectional
//! message relay, and clean session termination. Rendering is left to a
//! consumer that drains [`ChatEvent`]s and drives the
//! [`ChatNode`] operations.
//!
//! # Architecture
//!
//! The transport uses a task-per-connection layout. Socket-owning tasks
//! communicate with the single consumer through one event channel.
//!
//! ```text
//! Consumer (UI / terminal loop)
//! ├── Listener Task (accept loop, one per process)
//! │   ├── Reader Task 1 (handshake + relay loop)
//! │   └── Reader Task 2 (handshake + relay loop)
//! └── Connector (the single outbound session)
//! ```
//!
//! # Wire format
//!
//! Raw UTF-8 bytes over TCP, no length prefix, no delimiter. A message
//! is exactly the bytes of one write/read pairing, bounded by a
//! 2048-byte read chunk. The first payload an outbound peer sends is its
//! display name, verbatim; a message equal to the reserved sentinel
//! [`CLOSE_SENTINEL`] signals intentional disconnect. See
//! [`config`] for the constants and their caveats.
//!
//! # Usage
//!
//! ```ignore
//! use tincan_p2p::{ChatConfig, ChatNode};
//!
//! let mut node = ChatNode::new(ChatConfig::default());
//! let mut events = node.event_receiver().unwrap();
//! let (addr, _listener) = node.start_listener().await?;
//!
//! node.connect("192.168.1.20", 7341, "Alice").await?;
//! node.send("hi").await?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod event;
pub mod listener;
pub mod node;
pub mod peer;

pub use config::{ChatConfig, CLOSE_SENTINEL, DEFAULT_PORT, READ_CHUNK_SIZE};
pub use connector::{Connector, SessionState};
pub use error::{ChatError, ChatResult};
pub use event::{ChatEvent, Direction, DisconnectReason, EventSink};
pub use listener::ChatListener;
pub use node::ChatNode;
pub use peer::{spawn_peer_reader, PeerState};
