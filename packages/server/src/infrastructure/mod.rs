//! Infrastructure 層
//!
//! ドメイン層が定義する trait（`RoomRepository`, `MessageSink`）の具体的な実装。

pub mod message_sink;
pub mod repository;
