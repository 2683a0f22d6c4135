//! ClientSession
//!
//! 1 接続が 1 つの Room に参加している期間を表す。接続を処理するタスクが所有し、
//! 切断処理で値ごと消費されるため、leave はセッションごとに 1 回だけ実行される。

use std::sync::Arc;

use super::{
    room::Room,
    value_object::{ConnectionId, DisplayName, RoomName},
};

/// 接続 1 本分の Room 参加状態
pub struct ClientSession {
    room: Arc<Room>,
    display_name: DisplayName,
    connection_id: ConnectionId,
}

impl ClientSession {
    pub fn new(room: Arc<Room>, display_name: DisplayName, connection_id: ConnectionId) -> Self {
        Self {
            room,
            display_name,
            connection_id,
        }
    }

    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    pub fn room_name(&self) -> &RoomName {
        self.room.name()
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }
}
