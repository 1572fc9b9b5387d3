//! Console echo client.
//!
//! Demonstrates:
//! - Building a client from `SIGNAL_SOCKET_ENV` / `SIGNAL_SOCKET_URL`
//! - Registering a listener with the optional signal capability
//! - Sending each stdin line as a text message
//!
//! Usage:
//!   cargo run --example echo_console
//!   cargo run --example echo_console -- --local
//!   cargo run --example echo_console -- --debug
//!
//! Type `/quit` to disconnect and exit.

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use common::Args;
use signal_socket::{
    ClientConfig, Environment, SignalListener, SocketListener, WebSocketClient,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;

// ============================================================================
// Console Listener
// ============================================================================

/// Prints connection status and echoed messages.
struct Console {
    closed: Notify,
}

impl SocketListener for Console {
    fn on_connected(&self) {
        println!("[status] connected");
    }

    fn on_disconnected(&self) {
        println!("[status] disconnected");
        self.closed.notify_one();
    }

    fn on_error(&self, message: &str) {
        println!("[error] {message}");
    }

    fn signal_listener(&self) -> Option<&dyn SignalListener> {
        Some(self)
    }
}

impl SignalListener for Console {
    fn on_signal(&self, signal: Option<&str>) {
        println!("[echo] {}", signal.unwrap_or_default());
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = if args.local {
        ClientConfig::new(Environment::Debug)?
    } else {
        ClientConfig::from_env()?
    };

    println!("=== Echo Console: {} ===\n", config.endpoint);

    let client = WebSocketClient::builder().config(config).build()?;
    let console = Arc::new(Console {
        closed: Notify::new(),
    });
    client.add_listener(console.clone());
    client.connect();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }
        client.send(line);
    }

    if client.is_connected() {
        client.disconnect();
        console.closed.notified().await;
    }

    Ok(())
}
