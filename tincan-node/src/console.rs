//! Terminal consumer: drains transport events and reads user commands.
//!
//! Commands: `/connect <host> <port>`, `/disconnect`, `/quit`. Any other
//! non-empty line is sent as a chat message on the outgoing session.

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};

use tincan_p2p::{ChatConfig, ChatEvent, ChatNode, Direction};

use crate::cli::Cli;

/// Run the endpoint with a stdin-driven console until `/quit` or EOF.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ChatConfig::new(cli.listen);
    let mut node = ChatNode::new(config);
    let mut events = node
        .event_receiver()
        .context("event receiver already taken")?;

    let (addr, _listener) = node.start_listener().await?;
    tracing::debug!(addr = %addr, "Listener started");

    if let Some(target) = &cli.connect {
        let (host, port) = parse_target(target)?;
        node.connect(host, port, &cli.name).await?;
        println!("* connected to {target}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                render_event(&event);
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if handle_line(&node, &cli.name, line.trim()).await? {
                            break;
                        }
                    }
                    // stdin closed
                    None => break,
                }
            }
        }
    }

    if node.is_connected().await {
        let _ = node.disconnect().await;
    }
    Ok(())
}

/// Process one console line. Returns `true` when the user quits.
async fn handle_line(node: &ChatNode, name: &str, line: &str) -> anyhow::Result<bool> {
    match line {
        "" => {}
        "/quit" => {
            if node.is_connected().await {
                let _ = node.disconnect().await;
            }
            return Ok(true);
        }
        "/disconnect" => {
            if let Err(e) = node.disconnect().await {
                println!("! {e}");
            }
        }
        _ if line.starts_with("/connect") => {
            let mut parts = line.split_whitespace().skip(1);
            match (parts.next(), parts.next()) {
                (Some(host), Some(port)) => {
                    let port: u16 = port.parse().context("port must be a number")?;
                    match node.connect(host, port, name).await {
                        Ok(addr) => println!("* connected to {addr}"),
                        Err(e) => println!("! {e}"),
                    }
                }
                _ => println!("usage: /connect <host> <port>"),
            }
        }
        _ => {
            if let Err(e) = node.send(line).await {
                println!("! {e}");
            }
        }
    }
    Ok(false)
}

/// Print one transport event.
fn render_event(event: &ChatEvent) {
    match event {
        ChatEvent::ListenerReady { local_ip, local_port } => {
            println!("* your ip: {local_ip}   your port: {local_port}");
        }
        ChatEvent::PeerConnected { display_name } => {
            println!("* {display_name} has connected");
        }
        ChatEvent::MessageReceived { sender, body, direction } => match direction {
            Direction::Inbound => println!("{sender}: {body}"),
            Direction::Outbound => println!("                {sender}: {body}"),
        },
        ChatEvent::PeerDisconnected { display_name, reason } => {
            if display_name.is_empty() {
                println!("* a peer disconnected ({reason})");
            } else {
                println!("* {display_name} disconnected ({reason})");
            }
        }
    }
}

/// Split a `host:port` dial target.
fn parse_target(target: &str) -> anyhow::Result<(&str, u16)> {
    let Some((host, port)) = target.rsplit_once(':') else {
        bail!("dial target must be host:port, got {target:?}");
    };
    let port = port
        .parse()
        .with_context(|| format!("invalid port in dial target {target:?}"))?;
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let (host, port) = parse_target("192.168.1.20:7341").unwrap();
        assert_eq!(host, "192.168.1.20");
        assert_eq!(port, 7341);
    }

    #[test]
    fn test_parse_target_rejects_garbage() {
        assert!(parse_target("no-port-here").is_err());
        assert!(parse_target("host:not-a-port").is_err());
    }
}
