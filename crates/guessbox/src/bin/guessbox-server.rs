//! guessbox server binary.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin guessbox-server
//! cargo run --bin guessbox-server -- --host 0.0.0.0 --port 3000
//! GUESSBOX_INBOX_CAPACITY=256 cargo run --bin guessbox-server
//! ```

use std::time::Duration;

use clap::Parser;
use guessbox::logging;
use guessbox::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "guessbox-server")]
#[command(about = "Real-time multiplayer guessing-room server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "GUESSBOX_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "GUESSBOX_PORT", default_value = "8080")]
    port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "GUESSBOX_LOG", default_value = "info")]
    log: String,

    /// Bound each room's inbox to this many frames (unbounded if unset)
    #[arg(long, env = "GUESSBOX_INBOX_CAPACITY")]
    inbox_capacity: Option<usize>,

    /// Seconds before a stalled write evicts a connection (at least 1)
    #[arg(
        long,
        env = "GUESSBOX_WRITE_TIMEOUT_SECS",
        default_value = "10",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    write_timeout_secs: u64,

    /// Fixed RNG seed for source-player draws
    #[arg(long, env = "GUESSBOX_SEED")]
    seed: Option<u64>,
}

impl Args {
    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            inbox: InboxPolicy::from_capacity(self.inbox_capacity),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            seed: self.seed,
            ..RoomConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init(&args.log);

    let bind_addr = format!("{}:{}", args.host, args.port);
    let server = match GuessboxServer::builder()
        .bind(&bind_addr)
        .room_config(args.room_config())
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, %bind_addr, "failed to start server");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
