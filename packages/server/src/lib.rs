//! Hubbub room broadcast hub.
//!
//! Clients join named rooms over WebSocket connections and every text message
//! sent by a member is relayed, as `"<user>: <text>"`, to every member of the
//! same room, the sender included.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
