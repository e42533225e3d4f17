//! Whiteboard relay server.
//!
//! Relays whiteboard edits between the members of each room over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin whiteboard-relay
//! cargo run --bin whiteboard-relay -- --host 0.0.0.0 --port 3000 --pong-wait-secs 30
//! ```

use std::time::Duration;

use clap::Parser;
use whiteboard_relay::{
    config::{KeepaliveConfig, Limits, RelayConfig},
    ui::Server,
};
use whiteboard_shared::logger::{LogFormat, setup_logger};

#[derive(Parser, Debug)]
#[command(name = "whiteboard-relay")]
#[command(about = "Real-time fan-out relay for a multi-room whiteboard", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Seconds without any inbound frame before a connection is dropped
    #[arg(long, default_value = "60")]
    pong_wait_secs: u64,

    /// Seconds between ping frames (defaults to 9/10 of the pong wait)
    #[arg(long)]
    ping_period_secs: Option<u64>,

    /// Seconds allowed for a single frame write
    #[arg(long, default_value = "10")]
    write_wait_secs: u64,

    /// Largest accepted inbound frame in bytes
    #[arg(long, default_value = "10000")]
    max_message_size: usize,

    /// Outbound queue capacity per connection
    #[arg(long, default_value = "256")]
    mailbox_capacity: usize,

    /// Send every queued message in its own frame
    #[arg(long)]
    no_coalesce: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format (pretty or compact)
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        let mut keepalive = KeepaliveConfig::from_pong_wait(
            Duration::from_secs(args.pong_wait_secs),
            Duration::from_secs(args.write_wait_secs),
        );
        if let Some(ping_period) = args.ping_period_secs {
            keepalive.ping_period = Duration::from_secs(ping_period);
        }

        Self {
            host: args.host,
            port: args.port,
            keepalive,
            limits: Limits {
                max_message_size: args.max_message_size,
                mailbox_capacity: args.mailbox_capacity,
                coalesce_frames: !args.no_coalesce,
                ..Limits::default()
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level, args.log_format);

    let config = RelayConfig::from(args);
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    tracing::debug!("Starting with {:?}", config);

    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
