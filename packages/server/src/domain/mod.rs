//! ドメイン層
//!
//! Room とそのメンバー管理、値オブジェクト、外部への依存を抽象化する trait を定義します。

mod error;
mod message_sink;
mod repository;
mod room;
mod session;
mod value_object;

pub use error::{MessagePushError, RoomError, ValueObjectError};
#[cfg(test)]
pub use message_sink::MockMessageSink;
pub use message_sink::MessageSink;
pub use repository::RoomRepository;
pub use room::{Member, Room, format_chat_line};
pub use session::ClientSession;
pub use value_object::{ConnectionId, DisplayName, RoomName, Timestamp};
