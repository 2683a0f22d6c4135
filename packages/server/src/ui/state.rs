//! Server state shared by the handlers.

use std::{sync::Arc, time::Duration};

use crate::usecase::{ConnectParticipantUseCase, DisconnectParticipantUseCase, SendMessageUseCase};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// Receive wait deadline per connection
    pub idle_timeout: Option<Duration>,
    /// Capacity of each client's outbound queue
    pub outbound_buffer: usize,
}
