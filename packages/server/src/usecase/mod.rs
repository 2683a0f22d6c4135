//! UseCase 層
//!
//! 接続ライフサイクル（参加・送信・切断）を Room とレジストリの操作に落とし込む。

mod connect_participant;
mod disconnect_participant;
mod error;
mod send_message;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::{DisconnectOutcome, DisconnectParticipantUseCase};
pub use error::ConnectError;
pub use send_message::SendMessageUseCase;
