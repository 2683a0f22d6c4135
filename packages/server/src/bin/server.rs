//! WebSocket room broadcast server.
//!
//! Clients connect to `/ws?room=<room>&user=<user>`; every text message is
//! relayed to everyone in the same room as `"<user>: <text>"`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hubbub-server
//! cargo run --bin hubbub-server -- --host 0.0.0.0 --port 3030 --evict-empty-rooms
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use hubbub_server::{
    config::{DEFAULT_IDLE_TIMEOUT, DEFAULT_OUTBOUND_BUFFER, DEFAULT_PORT, ServerConfig},
    infrastructure::repository::InMemoryRoomRepository,
    ui::Server,
    usecase::{ConnectParticipantUseCase, DisconnectParticipantUseCase, SendMessageUseCase},
};
use hubbub_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hubbub-server")]
#[command(about = "WebSocket room broadcast server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Disconnect clients that stop answering pings for this many seconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT.as_secs())]
    idle_timeout_secs: u64,

    /// Capacity of each client's outbound message queue
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_BUFFER as u64, value_parser = clap::value_parser!(u64).range(1..))]
    outbound_buffer: u64,

    /// Remove a room once its last member leaves
    #[arg(long)]
    evict_empty_rooms: bool,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            idle_timeout: (args.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(args.idle_timeout_secs)),
            outbound_buffer: usize::try_from(args.outbound_buffer).unwrap_or(usize::MAX),
            evict_empty_rooms: args.evict_empty_rooms,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::from(Args::parse());

    // Initialize dependencies in order:
    // 1. Repository
    // 2. UseCases
    // 3. Server

    // 1. Create Repository (in-memory room registry)
    let repository = Arc::new(InMemoryRoomRepository::new());

    // 2. Create UseCases
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        repository.clone(),
        Arc::new(SystemClock),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new());
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        repository.clone(),
        config.evict_empty_rooms,
    ));

    // 3. Create and run the server
    let server = Server::new(
        connect_participant_usecase,
        send_message_usecase,
        disconnect_participant_usecase,
        config,
    );
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
