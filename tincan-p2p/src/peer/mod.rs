//! Inbound connection handling.
//!
//! This module provides:
//! - The inbound session state machine
//! - The per-connection reader task (handshake + relay loop)

pub mod reader;
pub mod state;

// Re-export main types
pub use reader::spawn_peer_reader;
pub use state::PeerState;
