//! WebSocket chat server implementation.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::websocket::{ConnectQuery, MISSING_PARAMS_MESSAGE};
pub use server::Server;
pub use signal::shutdown_signal;
