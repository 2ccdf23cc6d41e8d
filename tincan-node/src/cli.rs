//! Command-line argument parsing.

use std::net::SocketAddr;

use clap::Parser;

/// tincan peer-to-peer chat endpoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "tincan-node")]
#[command(about = "Peer-to-peer text chat endpoint")]
#[command(version)]
pub struct Cli {
    /// Listen address for inbound connections.
    #[arg(long, default_value = "0.0.0.0:7341")]
    pub listen: SocketAddr,

    /// Display name announced to peers.
    #[arg(long, default_value = "NoName")]
    pub name: String,

    /// Peer to dial on startup (host:port).
    #[arg(long)]
    pub connect: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cli = Cli::parse_from(["tincan-node"]);
        assert_eq!(cli.listen.port(), 7341);
        assert_eq!(cli.name, "NoName");
        assert!(cli.connect.is_none());
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_connect_target() {
        let cli = Cli::parse_from(["tincan-node", "--connect", "192.168.1.20:7341"]);
        assert_eq!(cli.connect.as_deref(), Some("192.168.1.20:7341"));
    }

    #[test]
    fn test_custom_name() {
        let cli = Cli::parse_from(["tincan-node", "--name", "Alice"]);
        assert_eq!(cli.name, "Alice");
    }
}
